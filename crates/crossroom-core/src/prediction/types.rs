//! Prediction records.

use std::{borrow::Borrow, fmt, time::Duration};

/// Identifier of a grid cell (e.g. `"r3c5"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(String);

impl CellId {
    /// Create a cell id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CellId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the client that originated an edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Create a client id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique id of one prediction instance within an engine.
///
/// Two predictions for the same cell always have different ids, so a timer
/// keyed by id can tell a superseded prediction from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredictionId(pub(crate) u64);

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A speculative, unconfirmed cell edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedUpdate<I> {
    /// Instance id.
    pub id: PredictionId,
    /// Target cell.
    pub cell_id: CellId,
    /// Proposed value.
    pub value: String,
    /// Value to restore on rollback.
    pub rollback_value: String,
    /// Client that made the edit.
    pub client_id: ClientId,
    /// When the prediction was made.
    pub created_at: I,
    /// Set once the server confirmed the value.
    pub confirmed: bool,
}

/// Why a prediction was reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackReason {
    /// No confirmation arrived before the timeout.
    Timeout,
    /// The server holds a different value; another write won.
    Mismatch {
        /// Authoritative value reported by the server.
        server_value: String,
    },
    /// Caller reverted the prediction.
    Explicit,
}

/// A reverted prediction kept for UI feedback and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRecord<I> {
    /// The prediction that was reverted.
    pub update: PredictedUpdate<I>,
    /// Why it was reverted.
    pub reason: RollbackReason,
    /// When it was reverted.
    pub rolled_back_at: I,
}

/// A prediction the server confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedPrediction<I> {
    /// The confirmed prediction, with `confirmed` set.
    pub update: PredictedUpdate<I>,
    /// When the confirmation was processed locally.
    pub confirmed_at: I,
    /// Server-side timestamp carried by the confirmation. Recorded only; it
    /// plays no part in reconciliation.
    pub server_timestamp: u64,
}

/// Aggregate engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionStats {
    /// Predictions currently pending.
    pub active_predictions: usize,
    /// Rollbacks currently retained in history.
    pub total_rollbacks: usize,
    /// Confirmations currently retained in history.
    pub total_confirmed: usize,
    /// Mean time from prediction to confirmation over retained
    /// confirmations. Zero when there are none.
    pub average_prediction_time: Duration,
}
