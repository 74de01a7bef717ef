//! Reference model for model-based testing.
//!
//! The model is a simplified prediction engine that is obviously correct:
//! a map of pending predictions, two bounded queues, and a clock. It serves
//! as the oracle against which `PredictionEngine` is verified.
//!
//! # Design Principles
//!
//! - Simplicity: no scheduler, no timer handles, no identity checks
//! - Deterministic: same operations produce the same observable state

pub mod operation;
mod world;

pub use operation::{CellSlot, Operation, OperationResult, ValueSlot};
pub use world::{ModelWorld, ObservableState, PendingView, RollbackView};
