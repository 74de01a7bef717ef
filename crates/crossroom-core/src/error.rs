//! Core error types.

use thiserror::Error;

use crate::role::Role;

/// Why a permission check failed.
///
/// The `Display` output is the stable, caller-facing reason string. Route
/// handlers forward it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionDenied {
    /// Actor is offline and the action mutates room state.
    #[error("participant is offline")]
    Offline,

    /// Room is expired; only read actions remain.
    #[error("room has expired")]
    RoomExpired,

    /// Room is completed; only read actions and chat remain.
    #[error("room is completed")]
    RoomCompleted,

    /// Actor's role does not reach the action's minimum role.
    #[error("requires {required} role or higher")]
    InsufficientRole {
        /// Minimum role from the capability table.
        required: Role,
        /// Role the actor holds.
        actual: Role,
    },

    /// Action is reserved for premium accounts.
    #[error("requires a premium subscription")]
    PremiumRequired,

    /// Join requests only apply to private or password-protected rooms.
    #[error("room is public; join it directly")]
    RoomNotGated,

    /// Action identifier did not match any known action.
    #[error("action not recognized: {0}")]
    UnknownAction(String),
}

impl PermissionDenied {
    /// Returns true if the same request may succeed later without any role or
    /// room change, e.g. after the participant reconnects.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Offline => true,

            Self::RoomExpired
            | Self::RoomCompleted
            | Self::InsufficientRole { .. }
            | Self::PremiumRequired
            | Self::RoomNotGated
            | Self::UnknownAction(_) => false,
        }
    }
}

/// Errors from parsing identifiers supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unknown action identifier.
    #[error("action not recognized: {0}")]
    UnknownAction(String),

    /// Unknown role name.
    #[error("role not recognized: {0}")]
    UnknownRole(String),

    /// Unknown room status name.
    #[error("room status not recognized: {0}")]
    UnknownStatus(String),
}
