//! Optimistic cell prediction engine.
//!
//! Lets a local actor apply a grid edit immediately while the authoritative
//! write is in flight, then reconcile against what the server reports.
//!
//! # State Machine (per cell)
//!
//! ```text
//!            predict_update
//!   NONE ───────────────────► PENDING
//!                               │  │
//!        confirm (same value)   │  │  confirm (different value)
//!        ┌──────────────────────┘  │  rollback_prediction
//!        ▼                         │  timeout (handle_tick)
//!   removed, recorded as           ▼
//!   confirmed                  ROLLED_BACK (terminal, kept in history)
//! ```
//!
//! A second `predict_update` for a cell supersedes the pending one: the old
//! instance is dropped and its timer cancelled.
//!
//! # Timeouts
//!
//! The engine is Sans-IO. Each pending prediction owns a [`TimerHandle`] in
//! the engine's [`Scheduler`], keyed by `(cell, PredictionId)`. Drivers call
//! [`PredictionEngine::handle_tick`] with the current time; a fired timer only
//! rolls back if its `PredictionId` is still the active one for the cell.

mod config;
mod history;
mod types;

use std::{collections::HashMap, time::Duration};

pub use config::PredictionConfig;
use history::History;
pub use types::{
    CellId, ClientId, ConfirmedPrediction, PredictedUpdate, PredictionId, PredictionStats,
    RollbackReason, RollbackRecord,
};

use crate::{
    env::Environment,
    scheduler::{Scheduler, TimerHandle},
};

type Instant<E> = <E as Environment>::Instant;

struct Pending<I> {
    update: PredictedUpdate<I>,
    timer: TimerHandle,
}

/// Tracks speculative cell edits for one client session.
///
/// Construct one per session and drop it when the session ends. There is no
/// process-wide instance.
pub struct PredictionEngine<E: Environment> {
    env: E,
    config: PredictionConfig,
    active: HashMap<CellId, Pending<Instant<E>>>,
    timers: Scheduler<(CellId, PredictionId), Instant<E>>,
    rollbacks: History<RollbackRecord<Instant<E>>>,
    confirmed: History<ConfirmedPrediction<Instant<E>>>,
    next_id: u64,
}

impl<E: Environment> PredictionEngine<E> {
    /// Create an engine with the default configuration.
    pub fn new(env: E) -> Self {
        Self::with_config(env, PredictionConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(env: E, config: PredictionConfig) -> Self {
        Self {
            env,
            config,
            active: HashMap::new(),
            timers: Scheduler::new(),
            rollbacks: History::new(config.max_history),
            confirmed: History::new(config.max_history),
            next_id: 0,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Record a speculative edit and schedule its timeout.
    ///
    /// `current_value` is what the cell showed before the edit and becomes the
    /// rollback target (empty string when absent). Any pending prediction for
    /// the same cell is superseded.
    pub fn predict_update(
        &mut self,
        cell_id: impl Into<CellId>,
        value: impl Into<String>,
        client_id: impl Into<ClientId>,
        current_value: Option<&str>,
    ) -> PredictedUpdate<Instant<E>> {
        let cell_id = cell_id.into();
        let now = self.env.now();

        let id = PredictionId(self.next_id);
        self.next_id += 1;

        if let Some(previous) = self.active.remove(&cell_id) {
            self.timers.cancel(previous.timer);
            tracing::debug!(
                "Prediction {} for cell {} superseded by {}",
                previous.update.id,
                cell_id,
                id
            );
        }

        let update = PredictedUpdate {
            id,
            cell_id: cell_id.clone(),
            value: value.into(),
            rollback_value: current_value.unwrap_or_default().to_string(),
            client_id: client_id.into(),
            created_at: now,
            confirmed: false,
        };

        let deadline = now + self.config.effective_timeout();
        let timer = self.timers.schedule((cell_id.clone(), id), deadline);
        self.active.insert(cell_id, Pending { update: update.clone(), timer });

        tracing::debug!("Predicted {:?} for cell {} ({})", update.value, update.cell_id, id);
        update
    }

    /// Reconcile a pending prediction with the server's value for the cell.
    ///
    /// Returns true if the server holds the predicted value; the prediction is
    /// then removed and recorded as confirmed. A different value means another
    /// write won: the prediction is rolled back and false is returned. Returns
    /// false if nothing is pending for the cell.
    ///
    /// `server_timestamp` is recorded but does not influence the outcome.
    pub fn confirm_prediction(
        &mut self,
        cell_id: &str,
        server_value: &str,
        server_timestamp: u64,
    ) -> bool {
        let matches = match self.active.get(cell_id) {
            Some(pending) => pending.update.value == server_value,
            None => {
                tracing::debug!("No pending prediction to confirm for cell {}", cell_id);
                return false;
            },
        };

        let now = self.env.now();

        if !matches {
            let reason = RollbackReason::Mismatch { server_value: server_value.to_string() };
            self.rollback_with(cell_id, reason, now);
            return false;
        }

        let Some(Pending { mut update, timer }) = self.active.remove(cell_id) else {
            return false;
        };
        self.timers.cancel(timer);
        update.confirmed = true;

        tracing::debug!("Prediction {} for cell {} confirmed", update.id, update.cell_id);
        self.confirmed.push(ConfirmedPrediction { update, confirmed_at: now, server_timestamp });
        true
    }

    /// Revert the pending prediction for a cell.
    ///
    /// Returns the reverted prediction so the caller can restore
    /// `rollback_value`, or `None` if nothing was pending.
    pub fn rollback_prediction(&mut self, cell_id: &str) -> Option<PredictedUpdate<Instant<E>>> {
        let now = self.env.now();
        self.rollback_with(cell_id, RollbackReason::Explicit, now).map(|record| record.update)
    }

    /// Fire every timeout whose deadline is at or before `now`.
    ///
    /// Returns the resulting rollback records in deadline order.
    pub fn handle_tick(&mut self, now: Instant<E>) -> Vec<RollbackRecord<Instant<E>>> {
        let mut fired = Vec::new();

        for (cell_id, id) in self.timers.pop_expired(now) {
            let is_current =
                self.active.get(cell_id.as_str()).is_some_and(|pending| pending.update.id == id);
            if !is_current {
                tracing::trace!("Ignoring stale timeout for {} on cell {}", id, cell_id);
                continue;
            }

            if let Some(record) = self.rollback_with(cell_id.as_str(), RollbackReason::Timeout, now)
            {
                fired.push(record);
            }
        }

        fired
    }

    /// Earliest pending timeout, if any.
    pub fn next_deadline(&self) -> Option<Instant<E>> {
        self.timers.next_deadline()
    }

    fn rollback_with(
        &mut self,
        cell_id: &str,
        reason: RollbackReason,
        now: Instant<E>,
    ) -> Option<RollbackRecord<Instant<E>>> {
        let Pending { update, timer } = self.active.remove(cell_id)?;
        self.timers.cancel(timer);

        tracing::debug!(
            "Prediction {} for cell {} rolled back to {:?}: {:?}",
            update.id,
            update.cell_id,
            update.rollback_value,
            reason
        );

        let record = RollbackRecord { update, reason, rolled_back_at: now };
        self.rollbacks.push(record.clone());
        Some(record)
    }

    /// Snapshot of all pending predictions.
    pub fn get_predictions(&self) -> HashMap<CellId, PredictedUpdate<Instant<E>>> {
        self.active.iter().map(|(cell, pending)| (cell.clone(), pending.update.clone())).collect()
    }

    /// Snapshot of the rollback history, oldest first.
    pub fn get_rollbacks(&self) -> Vec<RollbackRecord<Instant<E>>> {
        self.rollbacks.iter().cloned().collect()
    }

    /// Snapshot of the confirmation history, oldest first.
    pub fn get_confirmations(&self) -> Vec<ConfirmedPrediction<Instant<E>>> {
        self.confirmed.iter().cloned().collect()
    }

    /// Drop rollback records at least `max_age` old.
    pub fn clear_old_rollbacks(&mut self, max_age: Duration) {
        let now = self.env.now();
        self.rollbacks.retain(|record| now - record.rolled_back_at < max_age);
    }

    /// [`Self::clear_old_rollbacks`] with the configured default age.
    pub fn prune_rollbacks(&mut self) {
        self.clear_old_rollbacks(self.config.rollback_max_age);
    }

    /// Whether a prediction is pending for the cell.
    pub fn has_prediction(&self, cell_id: &str) -> bool {
        self.active.contains_key(cell_id)
    }

    /// Pending prediction for the cell.
    pub fn get_prediction(&self, cell_id: &str) -> Option<&PredictedUpdate<Instant<E>>> {
        self.active.get(cell_id).map(|pending| &pending.update)
    }

    /// Discard every pending prediction and its timer without recording
    /// rollbacks. Used when the session is torn down.
    pub fn clear_all_predictions(&mut self) {
        tracing::debug!("Clearing {} pending predictions", self.active.len());
        self.active.clear();
        self.timers.clear();
    }

    /// Aggregate statistics.
    pub fn get_stats(&self) -> PredictionStats {
        let latencies: Vec<Duration> = self
            .confirmed
            .iter()
            .map(|confirmation| confirmation.confirmed_at - confirmation.update.created_at)
            .collect();

        let average_prediction_time = match u32::try_from(latencies.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => latencies.iter().sum::<Duration>() / count,
        };

        PredictionStats {
            active_predictions: self.active.len(),
            total_rollbacks: self.rollbacks.len(),
            total_confirmed: self.confirmed.len(),
            average_prediction_time,
        }
    }
}

impl<E: Environment> std::fmt::Debug for PredictionEngine<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEngine")
            .field("active", &self.active.len())
            .field("pending_timers", &self.timers.len())
            .field("rollbacks", &self.rollbacks.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{
        future::Future,
        ops::{Add, Sub},
        sync::{Arc, Mutex},
    };

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    struct TestInstant(Duration);

    impl Add<Duration> for TestInstant {
        type Output = Self;

        fn add(self, rhs: Duration) -> Self {
            Self(self.0 + rhs)
        }
    }

    impl Sub for TestInstant {
        type Output = Duration;

        fn sub(self, rhs: Self) -> Duration {
            self.0.saturating_sub(rhs.0)
        }
    }

    #[derive(Clone, Default)]
    struct TestEnv {
        clock: Arc<Mutex<Duration>>,
    }

    impl TestEnv {
        fn advance(&self, by: Duration) {
            *self.clock.lock().unwrap() += by;
        }
    }

    impl Environment for TestEnv {
        type Instant = TestInstant;

        fn now(&self) -> TestInstant {
            TestInstant(*self.clock.lock().unwrap())
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.advance(duration);
            std::future::ready(())
        }
    }

    #[test]
    fn superseded_timer_is_cancelled() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env.clone());

        engine.predict_update("c1", "X", "client1", Some("A"));
        env.advance(Duration::from_millis(3000));
        engine.predict_update("c1", "Y", "client1", Some("A"));

        assert_eq!(engine.timers.len(), 1);
    }

    #[test]
    fn stale_timer_does_not_roll_back_newer_prediction() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env.clone());

        let first = engine.predict_update("c1", "X", "client1", Some("A"));
        // Re-arm a timer for the first instance to simulate a timer that
        // escaped cancellation.
        engine.timers.schedule((first.cell_id.clone(), first.id), env.now());

        env.advance(Duration::from_millis(1));
        let second = engine.predict_update("c1", "Y", "client1", Some("A"));

        let fired = engine.handle_tick(env.now());
        assert!(fired.is_empty());
        assert_eq!(engine.get_prediction("c1").map(|p| p.id), Some(second.id));
    }

    #[test]
    fn timeout_fires_exactly_at_deadline() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env.clone());
        engine.predict_update("c1", "X", "client1", None);

        env.advance(Duration::from_millis(4999));
        assert!(engine.handle_tick(env.now()).is_empty());

        env.advance(Duration::from_millis(1));
        let fired = engine.handle_tick(env.now());
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].reason, RollbackReason::Timeout);
        assert_eq!(fired[0].update.rollback_value, "");
        assert!(engine.next_deadline().is_none());
    }

    #[test]
    fn huge_timeout_does_not_overflow_deadline() {
        let env = TestEnv::default();
        let config = PredictionConfig { timeout: Duration::MAX, ..PredictionConfig::default() };
        let mut engine = PredictionEngine::with_config(env.clone(), config);

        env.advance(Duration::from_secs(1));
        engine.predict_update("c1", "X", "client1", None);

        assert_eq!(
            engine.next_deadline(),
            Some(TestInstant(Duration::from_secs(1) + PredictionConfig::MAX_TIMEOUT))
        );
    }

    #[test]
    fn confirmation_cancels_timer() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env.clone());
        engine.predict_update("c1", "X", "client1", Some("A"));

        assert!(engine.confirm_prediction("c1", "X", 1));
        assert!(engine.timers.is_empty());

        env.advance(Duration::from_secs(60));
        assert!(engine.handle_tick(env.now()).is_empty());
        assert!(engine.get_rollbacks().is_empty());
    }

    #[test]
    fn stats_average_over_confirmations_only() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env.clone());

        engine.predict_update("c1", "X", "client1", None);
        env.advance(Duration::from_millis(100));
        assert!(engine.confirm_prediction("c1", "X", 1));

        engine.predict_update("c2", "Y", "client1", None);
        env.advance(Duration::from_millis(300));
        assert!(engine.confirm_prediction("c2", "Y", 2));

        engine.predict_update("c3", "Z", "client1", None);
        env.advance(Duration::from_millis(5000));
        engine.handle_tick(env.now());

        let stats = engine.get_stats();
        assert_eq!(stats.active_predictions, 0);
        assert_eq!(stats.total_rollbacks, 1);
        assert_eq!(stats.total_confirmed, 2);
        assert_eq!(stats.average_prediction_time, Duration::from_millis(200));
    }

    #[test]
    fn stats_empty_engine() {
        let engine = PredictionEngine::new(TestEnv::default());
        let stats = engine.get_stats();
        assert_eq!(stats.average_prediction_time, Duration::ZERO);
        assert_eq!(stats.active_predictions, 0);
    }

    #[test]
    fn confirmed_flag_set_in_history() {
        let env = TestEnv::default();
        let mut engine = PredictionEngine::new(env);
        engine.predict_update("c1", "X", "client1", None);
        assert!(engine.confirm_prediction("c1", "X", 42));

        let confirmations = engine.get_confirmations();
        assert_eq!(confirmations.len(), 1);
        assert!(confirmations[0].update.confirmed);
        assert_eq!(confirmations[0].server_timestamp, 42);
    }
}
