//! Room permission engine.
//!
//! Decides whether a participant may perform an [`Action`] given a
//! [`PermissionContext`] snapshot. Every decision is a pure function of its
//! inputs: no hidden state, no I/O, no side effects.
//!
//! # Gates
//!
//! Checks run in a fixed order and the first failing gate names the reason:
//!
//! ```text
//! 1. online        offline actors may only read, join or leave
//! 2. room status   EXPIRED: view only; COMPLETED: view + chat
//! 3. role          actor must reach the action's minimum role
//! 4. premium       premium-only actions
//! 5. privacy       join requests only for gated rooms
//! ```
//!
//! All gates read from one static [`Capability`] table, so
//! [`get_minimum_role_for_action`] and [`get_actions_for_role`] agree with
//! [`can_perform_action`] by construction.
//!
//! # Moderators
//!
//! MODERATOR has no fixed rank. For actions flagged `moderation` in the table
//! it ranks as HOST; for every other action it ranks as PLAYER.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    action::Action,
    error::PermissionDenied,
    role::{Role, RoomStatus},
};

/// Snapshot of an actor and their room, built fresh by the caller for each
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionContext {
    /// Role held by the actor.
    pub role: Role,
    /// Actor is the room's host. Implies HOST privileges whatever `role` says.
    pub is_host: bool,
    /// Actor currently has a live connection to the room.
    pub is_online: bool,
    /// Lifecycle state of the room.
    pub room_status: RoomStatus,
    /// Room is invitation-only.
    pub is_private: bool,
    /// Room is password-protected.
    pub has_password: bool,
    /// Actor has a premium entitlement.
    pub is_premium: bool,
}

impl PermissionContext {
    /// Online, non-host, non-premium actor in a public room.
    pub fn participant(role: Role, room_status: RoomStatus) -> Self {
        Self {
            role,
            is_host: false,
            is_online: true,
            room_status,
            is_private: false,
            has_password: false,
            is_premium: false,
        }
    }

    /// Role used for the role gate.
    pub fn effective_role(&self) -> Role {
        if self.is_host { Role::Host } else { self.role }
    }

    /// Room requires an invitation or a password to join.
    pub fn is_gated(&self) -> bool {
        self.is_private || self.has_password
    }
}

/// Extra per-action requirement checked after the role gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No extra requirement.
    None,
    /// Actor must be premium.
    Premium,
    /// Room must be private or password-protected.
    GatedRoom,
}

/// One row of the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// Action this row describes.
    pub action: Action,
    /// Minimum role. `None` means no role is required, so non-participants
    /// may use the action.
    pub minimum_role: Option<Role>,
    /// Action is a read/membership action allowed while offline.
    pub offline_allowed: bool,
    /// MODERATOR ranks as HOST for this action.
    pub moderation: bool,
    /// Extra requirement.
    pub precondition: Precondition,
}

const fn row(
    action: Action,
    minimum_role: Option<Role>,
    offline_allowed: bool,
    moderation: bool,
    precondition: Precondition,
) -> Capability {
    Capability { action, minimum_role, offline_allowed, moderation, precondition }
}

const SPECTATOR: Option<Role> = Some(Role::Spectator);
const PLAYER: Option<Role> = Some(Role::Player);
const HOST: Option<Role> = Some(Role::Host);

/// Capability table, indexed by `Action` discriminant.
static CAPABILITIES: [Capability; 15] = [
    row(Action::ViewRoom, SPECTATOR, true, false, Precondition::None),
    row(Action::JoinRoom, SPECTATOR, true, false, Precondition::None),
    row(Action::LeaveRoom, SPECTATOR, true, false, Precondition::None),
    row(Action::UpdateCell, PLAYER, false, false, Precondition::None),
    row(Action::UseHints, PLAYER, false, false, Precondition::Premium),
    row(Action::SendMessage, SPECTATOR, false, false, Precondition::None),
    row(Action::KickPlayer, HOST, false, true, Precondition::None),
    row(Action::ChangeRole, HOST, false, true, Precondition::None),
    row(Action::ManageSession, HOST, false, true, Precondition::None),
    row(Action::UpdateRoomSettings, HOST, false, true, Precondition::None),
    row(Action::ViewParticipants, SPECTATOR, true, false, Precondition::None),
    row(Action::InvitePlayers, PLAYER, false, false, Precondition::None),
    row(Action::RequestJoin, None, false, false, Precondition::GatedRoom),
    row(Action::Promote, HOST, false, false, Precondition::None),
    row(Action::Demote, HOST, false, false, Precondition::None),
];

/// Actions still permitted once a room has expired.
const EXPIRED_ALLOWED: &[Action] = &[Action::ViewRoom, Action::ViewParticipants];

/// Actions still permitted once a room is completed.
const COMPLETED_ALLOWED: &[Action] =
    &[Action::ViewRoom, Action::ViewParticipants, Action::SendMessage];

/// Capability table row for `action`.
pub fn capability(action: Action) -> &'static Capability {
    &CAPABILITIES[action as usize]
}

/// Minimum role for `action`, or `None` when no role is required.
pub fn get_minimum_role_for_action(action: Action) -> Option<Role> {
    capability(action).minimum_role
}

fn rank_for(role: Role, capability: &Capability) -> u8 {
    if role == Role::Moderator && capability.moderation {
        Role::Host.base_rank()
    } else {
        role.base_rank()
    }
}

fn role_satisfies(role: Role, capability: &Capability) -> bool {
    capability.minimum_role.is_none_or(|minimum| rank_for(role, capability) >= minimum.base_rank())
}

fn status_gate(action: Action, status: RoomStatus) -> Result<(), PermissionDenied> {
    match status {
        RoomStatus::Expired if !EXPIRED_ALLOWED.contains(&action) => {
            Err(PermissionDenied::RoomExpired)
        },
        RoomStatus::Completed if !COMPLETED_ALLOWED.contains(&action) => {
            Err(PermissionDenied::RoomCompleted)
        },
        _ => Ok(()),
    }
}

/// Validates `action` against `context`, returning the first failing gate.
///
/// # Errors
///
/// Returns the [`PermissionDenied`] reason of the first gate that fails, in
/// the order offline, room status, role, premium, privacy.
pub fn validate_action(action: Action, context: &PermissionContext) -> Result<(), PermissionDenied> {
    let capability = capability(action);

    if !context.is_online && !capability.offline_allowed {
        return Err(PermissionDenied::Offline);
    }

    status_gate(action, context.room_status)?;

    let role = context.effective_role();
    if let Some(required) = capability.minimum_role {
        if !role_satisfies(role, capability) {
            return Err(PermissionDenied::InsufficientRole { required, actual: role });
        }
    }

    match capability.precondition {
        Precondition::Premium if !context.is_premium => Err(PermissionDenied::PremiumRequired),
        Precondition::GatedRoom if !context.is_gated() => Err(PermissionDenied::RoomNotGated),
        _ => Ok(()),
    }
}

/// Parses an action identifier and validates it.
///
/// # Errors
///
/// Returns [`PermissionDenied::UnknownAction`] for identifiers outside the
/// capability table, otherwise whatever [`validate_action`] returns.
pub fn validate_action_id(action: &str, context: &PermissionContext) -> Result<(), PermissionDenied> {
    let action: Action =
        action.parse().map_err(|_| PermissionDenied::UnknownAction(action.to_string()))?;
    validate_action(action, context)
}

/// Whether `context` may perform `action`.
pub fn can_perform_action(action: Action, context: &PermissionContext) -> bool {
    validate_action(action, context).is_ok()
}

/// Whether an actor may change another participant's role.
///
/// Only the host may reassign roles, and may assign any value. The source and
/// target roles do not restrict the host.
pub fn can_change_role(actor_role: Role, _from_role: Role, _to_role: Role, actor_is_host: bool) -> bool {
    actor_is_host && actor_role == Role::Host
}

/// Whether an actor may kick a participant holding `target_role`.
///
/// Only the host may kick. Callers reject self-kicks by comparing identities
/// before calling this.
pub fn can_kick_user(_actor_role: Role, _target_role: Role, actor_is_host: bool) -> bool {
    actor_is_host
}

/// All actions whose minimum role `role` satisfies.
///
/// Online state, room status and preconditions are runtime conditions and
/// are not applied here.
pub fn get_actions_for_role(role: Role) -> BTreeSet<Action> {
    Action::ALL.into_iter().filter(|action| role_satisfies(role, capability(*action))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Role) -> PermissionContext {
        PermissionContext::participant(role, RoomStatus::Active)
    }

    #[test]
    fn table_is_indexed_by_discriminant() {
        for action in Action::ALL {
            assert_eq!(capability(action).action, action);
        }
    }

    #[test]
    fn minimum_roles() {
        assert_eq!(get_minimum_role_for_action(Action::KickPlayer), Some(Role::Host));
        assert_eq!(get_minimum_role_for_action(Action::UpdateCell), Some(Role::Player));
        assert_eq!(get_minimum_role_for_action(Action::ViewRoom), Some(Role::Spectator));
        assert_eq!(get_minimum_role_for_action(Action::RequestJoin), None);
    }

    #[test]
    fn player_cannot_kick() {
        let result = validate_action(Action::KickPlayer, &ctx(Role::Player));
        assert_eq!(
            result,
            Err(PermissionDenied::InsufficientRole { required: Role::Host, actual: Role::Player })
        );
    }

    #[test]
    fn host_flag_grants_host_rank() {
        let context = PermissionContext { is_host: true, ..ctx(Role::Player) };
        assert!(can_perform_action(Action::KickPlayer, &context));
        assert!(can_perform_action(Action::Promote, &context));
    }

    #[test]
    fn moderator_ties_host_on_moderation_only() {
        let moderator = ctx(Role::Moderator);
        assert!(can_perform_action(Action::KickPlayer, &moderator));
        assert!(can_perform_action(Action::ChangeRole, &moderator));
        assert!(can_perform_action(Action::ManageSession, &moderator));
        assert!(can_perform_action(Action::UpdateRoomSettings, &moderator));
        assert!(can_perform_action(Action::UpdateCell, &moderator));

        assert!(!can_perform_action(Action::Promote, &moderator));
        assert!(!can_perform_action(Action::Demote, &moderator));
    }

    #[test]
    fn offline_reason_wins_over_status_and_role() {
        let context = PermissionContext {
            is_online: false,
            room_status: RoomStatus::Expired,
            ..ctx(Role::Spectator)
        };
        assert_eq!(validate_action(Action::KickPlayer, &context), Err(PermissionDenied::Offline));
    }

    #[test]
    fn status_reason_wins_over_role() {
        let expired = PermissionContext { room_status: RoomStatus::Expired, ..ctx(Role::Spectator) };
        assert_eq!(validate_action(Action::KickPlayer, &expired), Err(PermissionDenied::RoomExpired));

        let completed =
            PermissionContext { room_status: RoomStatus::Completed, ..ctx(Role::Spectator) };
        assert_eq!(
            validate_action(Action::UpdateCell, &completed),
            Err(PermissionDenied::RoomCompleted)
        );
    }

    #[test]
    fn offline_participant_in_expired_room_can_only_view() {
        let context = PermissionContext {
            is_online: false,
            room_status: RoomStatus::Expired,
            ..ctx(Role::Player)
        };
        assert!(can_perform_action(Action::ViewRoom, &context));
        assert_eq!(validate_action(Action::LeaveRoom, &context), Err(PermissionDenied::RoomExpired));
    }

    #[test]
    fn completed_room_keeps_chat_open() {
        let context = PermissionContext { room_status: RoomStatus::Completed, ..ctx(Role::Spectator) };
        assert!(can_perform_action(Action::SendMessage, &context));
        assert!(can_perform_action(Action::ViewParticipants, &context));
        assert!(!can_perform_action(Action::LeaveRoom, &context));
    }

    #[test]
    fn hints_require_premium_after_role() {
        let free_player = ctx(Role::Player);
        assert_eq!(
            validate_action(Action::UseHints, &free_player),
            Err(PermissionDenied::PremiumRequired)
        );

        let free_spectator = ctx(Role::Spectator);
        assert!(matches!(
            validate_action(Action::UseHints, &free_spectator),
            Err(PermissionDenied::InsufficientRole { .. })
        ));

        let premium = PermissionContext { is_premium: true, ..free_player };
        assert!(can_perform_action(Action::UseHints, &premium));
    }

    #[test]
    fn join_requests_need_gated_room() {
        let public = ctx(Role::Spectator);
        assert_eq!(validate_action(Action::RequestJoin, &public), Err(PermissionDenied::RoomNotGated));

        let private = PermissionContext { is_private: true, ..public };
        assert!(can_perform_action(Action::RequestJoin, &private));

        let password = PermissionContext { has_password: true, ..public };
        assert!(can_perform_action(Action::RequestJoin, &password));
    }

    #[test]
    fn unknown_action_id_is_rejected() {
        let result = validate_action_id("delete_room", &ctx(Role::Host));
        assert_eq!(result, Err(PermissionDenied::UnknownAction("delete_room".to_string())));
        assert!(validate_action_id("view_room", &ctx(Role::Spectator)).is_ok());
    }

    #[test]
    fn role_change_is_host_only() {
        assert!(can_change_role(Role::Host, Role::Player, Role::Moderator, true));
        assert!(!can_change_role(Role::Moderator, Role::Player, Role::Spectator, false));
        assert!(!can_change_role(Role::Host, Role::Player, Role::Spectator, false));
        assert!(!can_change_role(Role::Player, Role::Player, Role::Spectator, true));
    }

    #[test]
    fn kick_is_host_only() {
        assert!(can_kick_user(Role::Host, Role::Moderator, true));
        assert!(!can_kick_user(Role::Moderator, Role::Player, false));
    }

    #[test]
    fn actions_for_role() {
        let spectator = get_actions_for_role(Role::Spectator);
        assert!(!spectator.contains(&Action::UpdateCell));
        assert!(!spectator.contains(&Action::KickPlayer));
        assert!(spectator.contains(&Action::SendMessage));
        assert!(spectator.contains(&Action::RequestJoin));

        let host = get_actions_for_role(Role::Host);
        assert!(host.contains(&Action::UpdateCell));
        assert!(host.contains(&Action::KickPlayer));
        assert_eq!(host.len(), Action::ALL.len());

        let moderator = get_actions_for_role(Role::Moderator);
        assert!(moderator.contains(&Action::KickPlayer));
        assert!(moderator.contains(&Action::UpdateCell));
        assert!(!moderator.contains(&Action::Promote));
    }
}
