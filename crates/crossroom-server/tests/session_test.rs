//! Prediction session tests
//!
//! Exercises the Tokio timeout task against the real clock with short
//! timeouts.

use std::time::Duration;

use crossroom_core::{PredictionConfig, RollbackReason};
use crossroom_server::{PredictionSession, SessionConfig, SystemEnv};

fn config(timeout_ms: u64) -> SessionConfig {
    SessionConfig {
        prediction: PredictionConfig { timeout: Duration::from_millis(timeout_ms), ..PredictionConfig::default() },
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn timeout_rollback_is_delivered() {
    let (session, mut rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(50));

    session.predict_update("1-across-0", "C", "client-a", Some("")).await;

    let record = tokio::time::timeout(Duration::from_secs(2), rollbacks.recv())
        .await
        .expect("timeout task never fired")
        .expect("channel closed");

    assert_eq!(record.reason, RollbackReason::Timeout);
    assert_eq!(record.update.cell_id.as_str(), "1-across-0");
    assert_eq!(record.update.rollback_value, "");
    assert!(!session.with_engine(|engine| engine.has_prediction("1-across-0")).await);
}

#[tokio::test]
async fn confirmed_prediction_never_times_out() {
    let (session, mut rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(50));

    session.predict_update("cell", "A", "client-a", None).await;
    assert!(session.confirm_prediction("cell", "A", 1).await);

    let result = tokio::time::timeout(Duration::from_millis(200), rollbacks.recv()).await;
    assert!(result.is_err(), "confirmed prediction must not roll back");

    let stats = session.with_engine(|engine| engine.get_stats()).await;
    assert_eq!(stats.total_confirmed, 1);
    assert_eq!(stats.total_rollbacks, 0);
}

#[tokio::test]
async fn superseded_prediction_times_out_once() {
    let (session, mut rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(100));

    session.predict_update("cell", "A", "client-a", Some("")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = session.predict_update("cell", "B", "client-a", Some("A")).await;

    let record = tokio::time::timeout(Duration::from_secs(2), rollbacks.recv())
        .await
        .expect("timeout task never fired")
        .expect("channel closed");
    assert_eq!(record.update.id, second.id);
    assert_eq!(record.update.value, "B");

    let extra = tokio::time::timeout(Duration::from_millis(200), rollbacks.recv()).await;
    assert!(extra.is_err(), "superseded prediction must not fire");
}

#[tokio::test]
async fn idle_task_wakes_for_new_prediction() {
    let (session, mut rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(50));

    session.predict_update("cell", "A", "client-a", None).await;
    assert!(session.rollback_prediction("cell").await.is_some());

    // Explicit rollbacks are not sent on the timeout channel
    let result = tokio::time::timeout(Duration::from_millis(150), rollbacks.recv()).await;
    assert!(result.is_err());

    session.predict_update("cell", "B", "client-a", Some("")).await;
    let record = tokio::time::timeout(Duration::from_secs(2), rollbacks.recv())
        .await
        .expect("timeout task never fired")
        .expect("channel closed");
    assert_eq!(record.update.value, "B");
}

#[tokio::test]
async fn explicit_rollback_returns_update() {
    let (session, _rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(5_000));

    session.predict_update("cell", "X", "client-a", Some("Q")).await;
    let reverted = session.rollback_prediction("cell").await.expect("prediction pending");

    assert_eq!(reverted.rollback_value, "Q");
    assert!(session.rollback_prediction("cell").await.is_none());
}

#[tokio::test]
async fn shutdown_discards_pending_predictions() {
    let (session, mut rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(50));

    session.predict_update("cell", "A", "client-a", None).await;
    session.shutdown().await;

    // Task aborted: sender dropped without sending
    let result = tokio::time::timeout(Duration::from_secs(1), rollbacks.recv()).await;
    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn timeouts_continue_after_receiver_dropped() {
    let (session, rollbacks) = PredictionSession::spawn(SystemEnv::new(), config(30));
    drop(rollbacks);

    session.predict_update("1-across-0", "A", "client-a", None).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!session.with_engine(|engine| engine.has_prediction("1-across-0")).await);

    session.predict_update("2-down-0", "B", "client-a", None).await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!session.with_engine(|engine| engine.has_prediction("2-down-0")).await);

    let rollbacks = session.with_engine(|engine| engine.get_rollbacks()).await;
    assert_eq!(rollbacks.len(), 2);
    assert!(rollbacks.iter().all(|record| record.reason == RollbackReason::Timeout));
}

#[test]
#[should_panic]
fn spawn_outside_runtime_panics() {
    let _ = PredictionSession::spawn(SystemEnv::new(), config(50));
}
