//! Actions a participant may attempt within a room.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// A discrete operation checked by the permission engine.
///
/// Serializes as the snake_case identifier handlers receive from clients
/// (`"update_cell"`, `"kick_player"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read the room and its grid.
    ViewRoom,
    /// Become a participant.
    JoinRoom,
    /// Stop being a participant.
    LeaveRoom,
    /// Write a letter into a grid cell.
    UpdateCell,
    /// Reveal a letter or word.
    UseHints,
    /// Post to the room chat.
    SendMessage,
    /// Remove a participant and ban them.
    KickPlayer,
    /// Assign an arbitrary role to another participant.
    ChangeRole,
    /// Start, complete or expire the session.
    ManageSession,
    /// Edit room settings (privacy, password, puzzle).
    UpdateRoomSettings,
    /// List participants.
    ViewParticipants,
    /// Invite users into a gated room.
    InvitePlayers,
    /// Ask to be let into a gated room. Usable by non-participants.
    RequestJoin,
    /// Move a participant one step up the role ladder.
    Promote,
    /// Move a participant one step down the role ladder.
    Demote,
}

impl Action {
    /// Every action, in capability-table order.
    pub const ALL: [Self; 15] = [
        Self::ViewRoom,
        Self::ViewParticipants,
        Self::JoinRoom,
        Self::LeaveRoom,
        Self::SendMessage,
        Self::UpdateCell,
        Self::UseHints,
        Self::InvitePlayers,
        Self::RequestJoin,
        Self::KickPlayer,
        Self::ChangeRole,
        Self::ManageSession,
        Self::UpdateRoomSettings,
        Self::Promote,
        Self::Demote,
    ];

    /// Stable identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewRoom => "view_room",
            Self::JoinRoom => "join_room",
            Self::LeaveRoom => "leave_room",
            Self::UpdateCell => "update_cell",
            Self::UseHints => "use_hints",
            Self::SendMessage => "send_message",
            Self::KickPlayer => "kick_player",
            Self::ChangeRole => "change_role",
            Self::ManageSession => "manage_session",
            Self::UpdateRoomSettings => "update_room_settings",
            Self::ViewParticipants => "view_participants",
            Self::InvitePlayers => "invite_players",
            Self::RequestJoin => "request_join",
            Self::Promote => "promote",
            Self::Demote => "demote",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ParseError::UnknownAction(s.to_string()))
    }
}
