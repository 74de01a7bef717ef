//! Model world - reference prediction engine.
//!
//! Plain maps and a linear scan over pending predictions. No scheduler and
//! no timer handles: a prediction times out when `created_at + timeout` is at
//! or before the clock during an `AdvanceTime`.

use std::{
    collections::{BTreeMap, VecDeque},
    time::Duration,
};

use crossroom_core::{PredictionConfig, RollbackReason};

use super::operation::{Operation, OperationResult};

/// Pending prediction as observed from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingView {
    /// Predicted value.
    pub value: String,
    /// Rollback target.
    pub rollback_value: String,
}

/// Rollback record as observed from outside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackView {
    /// Cell that was reverted.
    pub cell_id: String,
    /// Value that was reverted.
    pub value: String,
    /// Why.
    pub reason: RollbackReason,
    /// Simulation time of the rollback.
    pub at: Duration,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Pending predictions by cell.
    pub pending: BTreeMap<String, PendingView>,
    /// Rollback history, oldest first.
    pub rollbacks: Vec<RollbackView>,
    /// Confirmed cells, oldest first.
    pub confirmed: Vec<String>,
    /// Mean confirmation latency.
    pub average_prediction_time: Duration,
}

#[derive(Debug, Clone)]
struct ModelPrediction {
    seq: u64,
    value: String,
    rollback_value: String,
    created_at: Duration,
}

/// Reference implementation of a single client's prediction engine.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    config: PredictionConfig,
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<String, ModelPrediction>,
    rollbacks: VecDeque<RollbackView>,
    confirmed: VecDeque<(String, Duration)>,
}

impl ModelWorld {
    /// Create a model with the given configuration, at time zero.
    pub fn new(config: PredictionConfig) -> Self {
        Self {
            config,
            now: Duration::ZERO,
            next_seq: 0,
            pending: BTreeMap::new(),
            rollbacks: VecDeque::new(),
            confirmed: VecDeque::new(),
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Apply an operation and return the result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Predict { cell, value, current } => {
                let rollback_value = current.map(|slot| slot.value()).unwrap_or_default().to_string();
                let prediction = ModelPrediction {
                    seq: self.next_seq,
                    value: value.value().to_string(),
                    rollback_value: rollback_value.clone(),
                    created_at: self.now,
                };
                self.next_seq += 1;
                self.pending.insert(cell.cell_id(), prediction);
                OperationResult::Predicted { rollback_value }
            },
            Operation::Confirm { cell, value, .. } => {
                let cell_id = cell.cell_id();
                let Some(prediction) = self.pending.remove(&cell_id) else {
                    return OperationResult::Confirmed(false);
                };

                if prediction.value == value.value() {
                    let latency = self.now - prediction.created_at;
                    push_bounded(&mut self.confirmed, (cell_id, latency), self.config.max_history);
                    OperationResult::Confirmed(true)
                } else {
                    let reason = RollbackReason::Mismatch { server_value: value.value().to_string() };
                    self.record_rollback(cell_id, prediction, reason);
                    OperationResult::Confirmed(false)
                }
            },
            Operation::Rollback { cell } => {
                let cell_id = cell.cell_id();
                let Some(prediction) = self.pending.remove(&cell_id) else {
                    return OperationResult::RolledBack(None);
                };
                let rollback_value = prediction.rollback_value.clone();
                self.record_rollback(cell_id, prediction, RollbackReason::Explicit);
                OperationResult::RolledBack(Some(rollback_value))
            },
            Operation::AdvanceTime { millis } => {
                self.now += Duration::from_millis(u64::from(*millis));
                OperationResult::TimedOut(self.fire_timeouts())
            },
            Operation::ClearOldRollbacks { max_age_millis } => {
                let max_age = Duration::from_millis(u64::from(*max_age_millis));
                let now = self.now;
                self.rollbacks.retain(|record| now - record.at < max_age);
                OperationResult::Ok
            },
            Operation::ClearAll => {
                self.pending.clear();
                OperationResult::Ok
            },
        }
    }

    fn fire_timeouts(&mut self) -> Vec<(String, String)> {
        let mut due: Vec<(u64, String)> = self
            .pending
            .iter()
            .filter(|(_, prediction)| prediction.created_at + self.config.effective_timeout() <= self.now)
            .map(|(cell_id, prediction)| (prediction.seq, cell_id.clone()))
            .collect();
        // Fixed timeout: deadline order is creation order.
        due.sort_unstable();

        let mut fired = Vec::with_capacity(due.len());
        for (_, cell_id) in due {
            if let Some(prediction) = self.pending.remove(&cell_id) {
                fired.push((cell_id.clone(), prediction.value.clone()));
                self.record_rollback(cell_id, prediction, RollbackReason::Timeout);
            }
        }
        fired
    }

    fn record_rollback(&mut self, cell_id: String, prediction: ModelPrediction, reason: RollbackReason) {
        let record = RollbackView { cell_id, value: prediction.value, reason, at: self.now };
        push_bounded(&mut self.rollbacks, record, self.config.max_history);
    }

    /// Snapshot for comparison with the real engine.
    pub fn observable_state(&self) -> ObservableState {
        let pending = self
            .pending
            .iter()
            .map(|(cell_id, prediction)| {
                (cell_id.clone(), PendingView {
                    value: prediction.value.clone(),
                    rollback_value: prediction.rollback_value.clone(),
                })
            })
            .collect();

        let average_prediction_time = match u32::try_from(self.confirmed.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.confirmed.iter().map(|(_, latency)| *latency).sum::<Duration>() / count,
        };

        ObservableState {
            pending,
            rollbacks: self.rollbacks.iter().cloned().collect(),
            confirmed: self.confirmed.iter().map(|(cell_id, _)| cell_id.clone()).collect(),
            average_prediction_time,
        }
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, capacity: usize) {
    if capacity == 0 {
        return;
    }
    while queue.len() >= capacity {
        queue.pop_front();
    }
    queue.push_back(item);
}
