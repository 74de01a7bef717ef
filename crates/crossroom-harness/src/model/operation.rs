//! Operations for model-based testing.
//!
//! Operations represent everything a client session can do to its prediction
//! engine. They are generated randomly by proptest (or `arbitrary` under the
//! fuzzer) and applied to both the model and the real engine.

use arbitrary::Arbitrary;

/// Cell selector. Folded onto a small grid so operations collide often.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct CellSlot(pub u8);

impl CellSlot {
    /// Number of distinct cells.
    pub const CELLS: u8 = 4;

    /// Cell identifier used by both model and engine.
    pub fn cell_id(self) -> String {
        format!("{}-across", self.0 % Self::CELLS + 1)
    }
}

/// Value selector. Folded onto a few letters so confirmations often match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub struct ValueSlot(pub u8);

impl ValueSlot {
    const LETTERS: [&'static str; 4] = ["A", "B", "C", ""];

    /// Letter written into the cell. The empty string clears it.
    pub fn value(self) -> &'static str {
        Self::LETTERS[usize::from(self.0) % Self::LETTERS.len()]
    }
}

/// Operations that can be applied to a prediction session.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Apply a speculative edit.
    Predict {
        /// Target cell.
        cell: CellSlot,
        /// Predicted value.
        value: ValueSlot,
        /// Value the cell showed before, if any.
        current: Option<ValueSlot>,
    },

    /// Server reports the value it holds for a cell.
    Confirm {
        /// Target cell.
        cell: CellSlot,
        /// Server's value.
        value: ValueSlot,
        /// Server timestamp (recorded only).
        timestamp: u16,
    },

    /// Caller reverts a cell.
    Rollback {
        /// Target cell.
        cell: CellSlot,
    },

    /// Advance simulation time and fire due timeouts.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Drop rollback records older than the given age.
    ClearOldRollbacks {
        /// Age limit in milliseconds.
        max_age_millis: u16,
    },

    /// Session teardown.
    ClearAll,
}

/// Result of applying an operation.
///
/// Used to compare model and real engine behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation has no return value.
    Ok,

    /// `predict_update` returned a prediction with this rollback value.
    Predicted {
        /// Rollback target.
        rollback_value: String,
    },

    /// `confirm_prediction` returned this.
    Confirmed(bool),

    /// `rollback_prediction` returned the rollback value of the reverted
    /// prediction, if any.
    RolledBack(Option<String>),

    /// Timeouts fired, in firing order, as `(cell, value)`.
    TimedOut(Vec<(String, String)>),
}
