//! Crossroom core engines.
//!
//! Two independent, composable leaf components for collaborative crossword
//! rooms:
//!
//! - [`permission`]: pure role/capability checks mapping an [`Action`] and a
//!   [`PermissionContext`] snapshot to allow or deny with a reason.
//! - [`prediction`]: the optimistic cell-edit state machine that applies
//!   speculative values, reconciles them with the server and rolls them back
//!   on mismatch or timeout.
//!
//! # Architecture
//!
//! ```text
//! caller (route handler / realtime handler)
//!   │  build PermissionContext
//!   ▼
//! permission::validate_action ──► Ok / PermissionDenied
//!   │  allowed
//!   ▼
//! PredictionEngine::predict_update ──► PredictedUpdate
//!   │  server reports value / time passes
//!   ▼
//! confirm_prediction / rollback_prediction / handle_tick
//! ```
//!
//! Neither component performs I/O. Time comes from the [`Environment`] trait
//! so timeouts are deterministic under test.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod env;
pub mod error;
pub mod permission;
pub mod prediction;
pub mod role;
pub mod scheduler;

pub use action::Action;
pub use env::Environment;
pub use error::{ParseError, PermissionDenied};
pub use permission::{
    PermissionContext, can_change_role, can_kick_user, can_perform_action, get_actions_for_role,
    get_minimum_role_for_action, validate_action, validate_action_id,
};
pub use prediction::{
    CellId, ClientId, ConfirmedPrediction, PredictedUpdate, PredictionConfig, PredictionEngine,
    PredictionId, PredictionStats, RollbackReason, RollbackRecord,
};
pub use role::{Role, RoomStatus, is_role_higher_or_equal};
pub use scheduler::{Scheduler, TimerHandle};
