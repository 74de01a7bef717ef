//! Fuzz target for [`PredictionEngine`] reconciliation
//!
//! Prevent stale timers and unbounded history under arbitrary interleavings
//!
//! # Strategy
//!
//! - Operation sequences: predictions, confirmations, rollbacks, ticks and
//!   teardown on a small grid so cells collide
//! - Differential: every step is also applied to the reference model
//!
//! # Invariants
//!
//! - Engine results equal model results at every step
//! - After a tick, no pending prediction is past its deadline
//! - A cell is never pending after confirm or rollback on it
//! - Histories never exceed `max_history`
//! - NEVER panic

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use crossroom_core::{Environment, PredictionConfig, PredictionEngine};
use crossroom_harness::{ModelWorld, Operation, OperationResult, SimEnv, ValueSlot};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    /// Timeout in milliseconds (folded to 1..=10_000).
    timeout_millis: u16,
    /// History bound (folded to 0..64).
    max_history: u8,
    /// Operation sequence to process.
    ops: Vec<Operation>,
}

fuzz_target!(|input: FuzzInput| {
    let config = PredictionConfig {
        timeout: Duration::from_millis(u64::from(input.timeout_millis % 10_000) + 1),
        max_history: usize::from(input.max_history % 64),
        ..PredictionConfig::default()
    };

    let env = SimEnv::new();
    let mut engine = PredictionEngine::with_config(env.clone(), config);
    let mut model = ModelWorld::new(config);

    for op in &input.ops {
        let real = match op {
            Operation::Predict { cell, value, current } => {
                let update = engine.predict_update(
                    cell.cell_id(),
                    value.value(),
                    "fuzz",
                    current.map(ValueSlot::value),
                );
                OperationResult::Predicted { rollback_value: update.rollback_value }
            },
            Operation::Confirm { cell, value, timestamp } => {
                let cell_id = cell.cell_id();
                let confirmed =
                    engine.confirm_prediction(&cell_id, value.value(), u64::from(*timestamp));
                assert!(!engine.has_prediction(&cell_id), "cell pending after confirm");
                OperationResult::Confirmed(confirmed)
            },
            Operation::Rollback { cell } => {
                let cell_id = cell.cell_id();
                let reverted = engine.rollback_prediction(&cell_id);
                assert!(!engine.has_prediction(&cell_id), "cell pending after rollback");
                OperationResult::RolledBack(reverted.map(|update| update.rollback_value))
            },
            Operation::AdvanceTime { millis } => {
                env.advance(Duration::from_millis(u64::from(*millis)));
                let now = env.now();
                let fired = engine.handle_tick(now);

                for update in engine.get_predictions().values() {
                    assert!(update.created_at + config.effective_timeout() > now, "pending past deadline");
                }

                OperationResult::TimedOut(
                    fired
                        .into_iter()
                        .map(|record| (record.update.cell_id.to_string(), record.update.value))
                        .collect(),
                )
            },
            Operation::ClearOldRollbacks { max_age_millis } => {
                engine.clear_old_rollbacks(Duration::from_millis(u64::from(*max_age_millis)));
                OperationResult::Ok
            },
            Operation::ClearAll => {
                engine.clear_all_predictions();
                assert!(engine.next_deadline().is_none());
                OperationResult::Ok
            },
        };

        assert_eq!(real, model.apply(op), "divergence on {op:?}");

        let stats = engine.get_stats();
        assert!(stats.total_rollbacks <= config.max_history);
        assert!(stats.total_confirmed <= config.max_history);
    }
});
