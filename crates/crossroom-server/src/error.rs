//! Room manager error types.

use crossroom_core::{PermissionDenied, Role, RoomStatus};
use thiserror::Error;

use crate::room_manager::{RoomId, UserId};

/// Errors from [`crate::RoomManager`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// Room does not exist.
    #[error("room not found: {0:032x}")]
    RoomNotFound(RoomId),

    /// Room already exists.
    #[error("room already exists: {0:032x}")]
    RoomAlreadyExists(RoomId),

    /// User is not a participant of the room.
    #[error("not a participant: {0}")]
    NotParticipant(UserId),

    /// User is already a participant of the room.
    #[error("already a participant: {0}")]
    AlreadyParticipant(UserId),

    /// User was kicked from the room and may not return.
    #[error("banned from room: {0}")]
    Banned(UserId),

    /// Private room and no invitation on record.
    #[error("invitation required to join private room")]
    InvitationRequired,

    /// Password-protected room and the caller did not verify the password.
    #[error("password required")]
    PasswordRequired,

    /// Host tried to leave their own room.
    #[error("host cannot leave the room")]
    HostCannotLeave,

    /// Actor tried to kick themselves.
    #[error("cannot kick yourself")]
    CannotKickSelf,

    /// Nobody may kick the host.
    #[error("cannot kick the host")]
    CannotKickHost,

    /// The host's role is fixed and HOST cannot be granted.
    #[error("host role cannot be assigned or changed")]
    HostRoleFixed,

    /// Role change would leave the role as it is.
    #[error("participant {user_id} already holds {role}")]
    RoleUnchanged {
        /// Target participant.
        user_id: UserId,
        /// Role they hold.
        role: Role,
    },

    /// Lifecycle does not allow the transition.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: RoomStatus,
        /// Requested status.
        to: RoomStatus,
    },

    /// Room has not reached a terminal status and cannot be removed.
    #[error("room {room_id:032x} is still {status}")]
    RoomStillOpen {
        /// Room.
        room_id: RoomId,
        /// Its current status.
        status: RoomStatus,
    },

    /// Permission engine denied the action.
    #[error("permission denied: {0}")]
    Denied(#[from] PermissionDenied),
}

impl RoomError {
    /// HTTP-style status class for handlers: true if the caller is at fault
    /// for lack of rights (403) rather than a bad request or missing entity.
    pub fn is_forbidden(&self) -> bool {
        match self {
            Self::Denied(_)
            | Self::Banned(_)
            | Self::InvitationRequired
            | Self::PasswordRequired
            | Self::CannotKickHost
            | Self::HostRoleFixed => true,

            Self::RoomNotFound(_)
            | Self::RoomAlreadyExists(_)
            | Self::NotParticipant(_)
            | Self::AlreadyParticipant(_)
            | Self::HostCannotLeave
            | Self::CannotKickSelf
            | Self::RoleUnchanged { .. }
            | Self::InvalidTransition { .. }
            | Self::RoomStillOpen { .. } => false,
        }
    }
}
