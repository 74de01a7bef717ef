//! Tokio driver for a client's prediction engine.
//!
//! `PredictionEngine` is Sans-IO: it never sleeps and never fires timers on
//! its own. `PredictionSession` owns one engine behind a mutex and runs a
//! background task that sleeps until the engine's next deadline, calls
//! `handle_tick`, and forwards the resulting rollbacks on a channel so the
//! UI layer can restore cell values.
//!
//! Dropping or shutting down the session stops the task and discards pending
//! predictions. No timer outlives its session.

use std::sync::Arc;

use crossroom_core::{
    Environment, PredictedUpdate, PredictionConfig, PredictionEngine, RollbackRecord,
};
use tokio::{
    sync::{Mutex, Notify, mpsc},
    task::JoinHandle,
};

/// Session configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Engine configuration.
    pub prediction: PredictionConfig,
    /// Capacity of the timeout rollback channel.
    pub rollback_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { prediction: PredictionConfig::default(), rollback_channel_capacity: 64 }
    }
}

/// One client's prediction engine plus the task that fires its timeouts.
pub struct PredictionSession<E: Environment> {
    engine: Arc<Mutex<PredictionEngine<E>>>,
    wake: Arc<Notify>,
    timer_task: JoinHandle<()>,
}

impl<E: Environment> PredictionSession<E> {
    /// Start a session.
    ///
    /// Returns the session and the receiver for rollbacks caused by timeouts.
    /// Explicit and mismatch rollbacks are returned directly from the calls
    /// that cause them. Dropping the receiver stops delivery only; timeouts
    /// keep rolling back pending predictions.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(env: E, config: SessionConfig) -> (Self, mpsc::Receiver<RollbackRecord<E::Instant>>) {
        let engine = Arc::new(Mutex::new(PredictionEngine::with_config(env.clone(), config.prediction)));
        let wake = Arc::new(Notify::new());
        let (tx, rx) = mpsc::channel(config.rollback_channel_capacity.max(1));

        let timer_task = tokio::spawn(run_timeouts(env, Arc::clone(&engine), Arc::clone(&wake), tx));

        (Self { engine, wake, timer_task }, rx)
    }

    /// Record a speculative edit. See [`PredictionEngine::predict_update`].
    pub async fn predict_update(
        &self,
        cell_id: &str,
        value: &str,
        client_id: &str,
        current_value: Option<&str>,
    ) -> PredictedUpdate<E::Instant> {
        let update = self.engine.lock().await.predict_update(cell_id, value, client_id, current_value);
        // New deadline may be earlier than the one the task is sleeping on.
        self.wake.notify_one();
        update
    }

    /// Reconcile with the server. See [`PredictionEngine::confirm_prediction`].
    pub async fn confirm_prediction(&self, cell_id: &str, server_value: &str, server_timestamp: u64) -> bool {
        self.engine.lock().await.confirm_prediction(cell_id, server_value, server_timestamp)
    }

    /// Revert a pending edit. See [`PredictionEngine::rollback_prediction`].
    pub async fn rollback_prediction(&self, cell_id: &str) -> Option<PredictedUpdate<E::Instant>> {
        self.engine.lock().await.rollback_prediction(cell_id)
    }

    /// Run a closure against the engine, for queries.
    pub async fn with_engine<R>(&self, f: impl FnOnce(&mut PredictionEngine<E>) -> R) -> R {
        let mut engine = self.engine.lock().await;
        f(&mut engine)
    }

    /// Stop the timer task and discard pending predictions.
    pub async fn shutdown(self) {
        self.timer_task.abort();
        self.engine.lock().await.clear_all_predictions();
        tracing::debug!("Prediction session shut down");
    }
}

impl<E: Environment> Drop for PredictionSession<E> {
    fn drop(&mut self) {
        self.timer_task.abort();
    }
}

impl<E: Environment> std::fmt::Debug for PredictionSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionSession")
            .field("timer_task_finished", &self.timer_task.is_finished())
            .finish_non_exhaustive()
    }
}

async fn run_timeouts<E: Environment>(
    env: E,
    engine: Arc<Mutex<PredictionEngine<E>>>,
    wake: Arc<Notify>,
    tx: mpsc::Sender<RollbackRecord<E::Instant>>,
) {
    let mut forwarding = true;
    loop {
        let deadline = engine.lock().await.next_deadline();

        let Some(deadline) = deadline else {
            wake.notified().await;
            continue;
        };

        let wait = deadline - env.now();
        tokio::select! {
            () = env.sleep(wait) => {},
            () = wake.notified() => continue,
        }

        // Ticking continues without a receiver so timeouts still clear predictions.
        let fired = engine.lock().await.handle_tick(env.now());
        for record in fired {
            tracing::debug!("Prediction for cell {} timed out", record.update.cell_id);
            if forwarding && tx.send(record).await.is_err() {
                tracing::debug!("Rollback receiver dropped, no longer forwarding timeouts");
                forwarding = false;
            }
        }
    }
}
