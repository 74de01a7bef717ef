//! Prediction engine tests
//!
//! Reconciliation scenarios driven by a manually advanced clock:
//! - Confirm with matching value
//! - Confirm with a competing value
//! - Timeout expiry
//! - Supersession of a pending prediction
//! - History bounds and pruning

use std::{
    future::Future,
    ops::{Add, Sub},
    sync::{Arc, Mutex},
    time::Duration,
};

use crossroom_core::{Environment, PredictionConfig, PredictionEngine, RollbackReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ManualInstant(Duration);

impl Add<Duration> for ManualInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for ManualInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

// Test environment with a clock that only moves when told to
#[derive(Clone, Default)]
struct ManualEnv {
    clock: Arc<Mutex<Duration>>,
}

impl ManualEnv {
    fn advance(&self, by: Duration) {
        *self.clock.lock().expect("clock poisoned") += by;
    }
}

impl Environment for ManualEnv {
    type Instant = ManualInstant;

    fn now(&self) -> ManualInstant {
        ManualInstant(*self.clock.lock().expect("clock poisoned"))
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

fn engine() -> (ManualEnv, PredictionEngine<ManualEnv>) {
    let env = ManualEnv::default();
    (env.clone(), PredictionEngine::new(env))
}

#[test]
fn predict_records_rollback_target() {
    let (_env, mut engine) = engine();

    let update = engine.predict_update("c1", "X", "client1", Some("A"));
    assert_eq!(update.value, "X");
    assert_eq!(update.rollback_value, "A");
    assert_eq!(update.client_id.as_str(), "client1");
    assert!(!update.confirmed);

    assert!(engine.has_prediction("c1"));
    assert_eq!(engine.get_prediction("c1"), Some(&update));
}

#[test]
fn missing_current_value_rolls_back_to_empty() {
    let (_env, mut engine) = engine();

    let update = engine.predict_update("c1", "X", "client1", None);
    assert_eq!(update.rollback_value, "");
}

#[test]
fn confirm_matching_value() {
    let (_env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", Some("A"));
    assert!(engine.confirm_prediction("c1", "X", 1_700_000_000_000));

    assert!(!engine.has_prediction("c1"));
    assert!(engine.get_rollbacks().is_empty());
}

#[test]
fn confirm_mismatched_value_rolls_back() {
    let (_env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", Some("A"));
    assert!(!engine.confirm_prediction("c1", "Y", 1_700_000_000_000));

    assert!(!engine.has_prediction("c1"));
    let rollbacks = engine.get_rollbacks();
    assert_eq!(rollbacks.len(), 1);
    assert_eq!(rollbacks[0].update.rollback_value, "A");
    assert_eq!(rollbacks[0].reason, RollbackReason::Mismatch { server_value: "Y".to_string() });
}

#[test]
fn confirm_without_prediction_is_noop() {
    let (_env, mut engine) = engine();

    assert!(!engine.confirm_prediction("c1", "X", 0));
    assert!(engine.get_rollbacks().is_empty());
}

#[test]
fn late_confirmation_after_timeout_is_harmless() {
    let (env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", Some("A"));
    env.advance(Duration::from_secs(6));
    assert_eq!(engine.handle_tick(env.now()).len(), 1);

    assert!(!engine.confirm_prediction("c1", "X", 0));
    assert_eq!(engine.get_rollbacks().len(), 1);
}

#[test]
fn timeout_rolls_back_unconfirmed_prediction() {
    let (env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", Some("A"));
    env.advance(Duration::from_millis(5000));
    let fired = engine.handle_tick(env.now());

    assert_eq!(fired.len(), 1);
    assert!(!engine.has_prediction("c1"));
    let rollbacks = engine.get_rollbacks();
    assert_eq!(rollbacks.len(), 1);
    assert_eq!(rollbacks[0].reason, RollbackReason::Timeout);
    assert_eq!(rollbacks[0].update.value, "X");
}

#[test]
fn custom_timeout_is_honoured() {
    let env = ManualEnv::default();
    let config = PredictionConfig { timeout: Duration::from_millis(200), ..Default::default() };
    let mut engine = PredictionEngine::with_config(env.clone(), config);

    engine.predict_update("c1", "X", "client1", None);
    env.advance(Duration::from_millis(200));

    assert_eq!(engine.handle_tick(env.now()).len(), 1);
}

#[test]
fn supersession_keeps_only_latest() {
    let (env, mut engine) = engine();

    let first = engine.predict_update("c1", "X", "client1", Some("A"));
    env.advance(Duration::from_millis(4000));
    let second = engine.predict_update("c1", "Y", "client1", Some("A"));
    assert_ne!(first.id, second.id);

    let predictions = engine.get_predictions();
    assert_eq!(predictions.len(), 1);
    assert_eq!(predictions.values().next().map(|p| p.id), Some(second.id));

    // Past the first prediction's deadline, before the second's
    env.advance(Duration::from_millis(1500));
    assert!(engine.handle_tick(env.now()).is_empty());
    assert!(engine.has_prediction("c1"));

    assert!(engine.confirm_prediction("c1", "Y", 0));
    assert!(engine.get_rollbacks().is_empty());
}

#[test]
fn explicit_rollback_returns_reverted_prediction() {
    let (_env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", Some("A"));
    let reverted = engine.rollback_prediction("c1").expect("prediction pending");

    assert_eq!(reverted.rollback_value, "A");
    assert!(!engine.has_prediction("c1"));
    assert_eq!(engine.get_rollbacks()[0].reason, RollbackReason::Explicit);
    assert!(engine.rollback_prediction("c1").is_none());
}

#[test]
fn history_is_bounded_to_fifty() {
    let (_env, mut engine) = engine();

    for i in 0..60 {
        let cell = format!("c{i}");
        engine.predict_update(cell.as_str(), "X", "client1", None);
        engine.rollback_prediction(&cell);
    }

    let rollbacks = engine.get_rollbacks();
    assert_eq!(rollbacks.len(), 50);
    assert_eq!(rollbacks[0].update.cell_id.as_str(), "c10");
    assert_eq!(rollbacks[49].update.cell_id.as_str(), "c59");
}

#[test]
fn clear_all_does_not_record_rollbacks() {
    let (env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", None);
    engine.predict_update("c2", "Y", "client1", None);
    engine.clear_all_predictions();

    assert!(engine.get_predictions().is_empty());
    assert!(engine.get_rollbacks().is_empty());

    // Timers went with them
    env.advance(Duration::from_secs(10));
    assert!(engine.handle_tick(env.now()).is_empty());
    assert!(engine.next_deadline().is_none());
}

#[test]
fn clear_old_rollbacks_keeps_recent() {
    let (env, mut engine) = engine();

    engine.predict_update("old", "X", "client1", None);
    engine.rollback_prediction("old");

    env.advance(Duration::from_secs(8));
    engine.predict_update("recent", "Y", "client1", None);
    engine.rollback_prediction("recent");

    env.advance(Duration::from_secs(3));
    engine.prune_rollbacks();

    let remaining = engine.get_rollbacks();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].update.cell_id.as_str(), "recent");

    engine.clear_old_rollbacks(Duration::from_secs(1));
    assert!(engine.get_rollbacks().is_empty());
}

#[test]
fn cells_are_independent() {
    let (env, mut engine) = engine();

    engine.predict_update("c1", "X", "client1", None);
    env.advance(Duration::from_millis(2500));
    engine.predict_update("c2", "Y", "client2", None);

    env.advance(Duration::from_millis(2500));
    let fired = engine.handle_tick(env.now());
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].update.cell_id.as_str(), "c1");
    assert!(engine.has_prediction("c2"));
}
