//! Participant roles and room lifecycle states.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Role held by a participant in a room.
///
/// Privilege order is HOST > MODERATOR > PLAYER > SPECTATOR, but MODERATOR has
/// no rank of its own: it ranks as HOST for moderation actions and as PLAYER
/// for everything else (see [`crate::permission`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Room owner. Exactly one per room.
    Host,
    /// Host-equivalent for moderation actions only.
    Moderator,
    /// May edit the grid.
    Player,
    /// Read-only participant.
    Spectator,
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Self; 4] = [Self::Host, Self::Moderator, Self::Player, Self::Spectator];

    /// Stable uppercase name used in reasons and on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "HOST",
            Self::Moderator => "MODERATOR",
            Self::Player => "PLAYER",
            Self::Spectator => "SPECTATOR",
        }
    }

    /// Rank in the base hierarchy: SPECTATOR=0, PLAYER=1, HOST=2.
    ///
    /// MODERATOR sits at PLAYER rank here. Its HOST-level moderation rights
    /// are granted per action by the permission table, never by rank.
    pub(crate) const fn base_rank(self) -> u8 {
        match self {
            Self::Spectator => 0,
            Self::Player | Self::Moderator => 1,
            Self::Host => 2,
        }
    }

    /// Next role up the promotion ladder SPECTATOR -> PLAYER -> MODERATOR.
    ///
    /// HOST is never reached by promotion.
    pub const fn promoted(self) -> Option<Self> {
        match self {
            Self::Spectator => Some(Self::Player),
            Self::Player => Some(Self::Moderator),
            Self::Moderator | Self::Host => None,
        }
    }

    /// Next role down the ladder MODERATOR -> PLAYER -> SPECTATOR.
    pub const fn demoted(self) -> Option<Self> {
        match self {
            Self::Moderator => Some(Self::Player),
            Self::Player => Some(Self::Spectator),
            Self::Spectator | Self::Host => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownRole(s.to_string()))
    }
}

/// Compares two roles in the base hierarchy SPECTATOR < PLAYER < HOST.
///
/// MODERATOR compares as PLAYER. Moderation rights are not visible through
/// this primitive.
pub const fn is_role_higher_or_equal(a: Role, b: Role) -> bool {
    a.base_rank() >= b.base_rank()
}

/// Lifecycle state of a room.
///
/// `WAITING -> ACTIVE -> COMPLETED`, with `EXPIRED` reachable from either
/// non-terminal state. `COMPLETED` and `EXPIRED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    /// Created, puzzle not started.
    Waiting,
    /// Solving in progress.
    Active,
    /// Puzzle solved; chat stays open.
    Completed,
    /// Room is dead; read-only.
    Expired,
}

impl RoomStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Waiting, Self::Active, Self::Completed, Self::Expired];

    /// Stable uppercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Expired => "EXPIRED",
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Active)
                | (Self::Active, Self::Completed)
                | (Self::Waiting | Self::Active, Self::Expired)
        )
    }

    /// Whether no further transitions are possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Expired)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownStatus(s.to_string()))
    }
}
