//! Deterministic test harness for Crossroom.
//!
//! Provides a manually driven [`SimEnv`] so prediction timeouts fire exactly
//! when a test advances the clock, and nowhere else.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation of the prediction
//! engine. Operations are applied to both the model and the real engine, and
//! their observable states are compared.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod sim_env;

pub use model::{
    CellSlot, ModelWorld, ObservableState, Operation, OperationResult, PendingView, RollbackView,
    ValueSlot,
};
pub use sim_env::{SimEnv, SimInstant};
