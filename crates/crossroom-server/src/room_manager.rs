//! Room Manager
//!
//! Owns participant records for rooms and authorizes every mutation through
//! the permission engine.
//!
//! ## Responsibilities
//!
//! - Room Lifecycle: Create rooms, move them through WAITING -> ACTIVE ->
//!   COMPLETED / EXPIRED
//! - Membership: Join (role by entitlement), leave, presence, bans,
//!   invitations and join requests for gated rooms
//! - Role Management: Kick, change role, promote, demote
//! - Action Generation: Return actions for the driver to execute
//!
//! ## Design
//!
//! - Snapshot per check: each operation builds a fresh `PermissionContext`
//!   from the stored participant record and runs `validate_action` before
//!   touching state
//! - Action-based: All methods return actions, no direct I/O

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    time::Duration,
};

use crossroom_core::{
    Action, Environment, PermissionContext, PermissionDenied, Role, RoomStatus, can_change_role,
    can_kick_user, validate_action,
};

use crate::error::RoomError;

/// Room identifier.
pub type RoomId = u128;

/// User identifier.
pub type UserId = u64;

/// Access settings of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoomSettings {
    /// Joining requires an invitation.
    pub is_private: bool,
    /// Joining requires a verified password (or an invitation).
    pub has_password: bool,
}

/// Metadata about a room.
#[derive(Debug, Clone)]
pub struct RoomMetadata<I> {
    /// User who created the room. Holds HOST for the room's lifetime.
    pub creator: UserId,
    /// When the room was created
    pub created_at: I,
    /// When the room reached COMPLETED or EXPIRED
    pub ended_at: Option<I>,
}

/// A user's membership record in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant<I> {
    /// Current role.
    pub role: Role,
    /// Has a live connection.
    pub is_online: bool,
    /// Premium entitlement, captured at join time.
    pub is_premium: bool,
    /// When the user joined.
    pub joined_at: I,
}

struct Room<I> {
    metadata: RoomMetadata<I>,
    settings: RoomSettings,
    status: RoomStatus,
    participants: BTreeMap<UserId, Participant<I>>,
    banned: BTreeSet<UserId>,
    invited: BTreeSet<UserId>,
    join_requests: BTreeSet<UserId>,
}

impl<I> Room<I> {
    fn participant(&self, user_id: UserId) -> Result<&Participant<I>, RoomError> {
        self.participants.get(&user_id).ok_or(RoomError::NotParticipant(user_id))
    }

    fn is_host(&self, user_id: UserId) -> bool {
        self.metadata.creator == user_id
    }

    fn context_for(&self, user_id: UserId) -> Result<PermissionContext, RoomError> {
        let participant = self.participant(user_id)?;
        Ok(PermissionContext {
            role: participant.role,
            is_host: self.is_host(user_id),
            is_online: participant.is_online,
            room_status: self.status,
            is_private: self.settings.is_private,
            has_password: self.settings.has_password,
            is_premium: participant.is_premium,
        })
    }

    /// Context for a user who is not (yet) a participant.
    fn outsider_context(&self, is_premium: bool) -> PermissionContext {
        PermissionContext {
            role: Role::Spectator,
            is_host: false,
            is_online: true,
            room_status: self.status,
            is_private: self.settings.is_private,
            has_password: self.settings.has_password,
            is_premium,
        }
    }

    fn authorize(&self, user_id: UserId, action: Action) -> Result<PermissionContext, RoomError> {
        let context = self.context_for(user_id)?;
        validate_action(action, &context)?;
        Ok(context)
    }

    fn check_outsider(&self, user_id: UserId) -> Result<(), RoomError> {
        if self.banned.contains(&user_id) {
            return Err(RoomError::Banned(user_id));
        }
        if self.participants.contains_key(&user_id) {
            return Err(RoomError::AlreadyParticipant(user_id));
        }
        Ok(())
    }
}

/// State change announced to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// A user joined.
    ParticipantJoined {
        /// New participant.
        user_id: UserId,
        /// Role assigned at join.
        role: Role,
    },
    /// A participant left voluntarily.
    ParticipantLeft {
        /// Departed participant.
        user_id: UserId,
    },
    /// A participant connected or disconnected.
    PresenceChanged {
        /// Participant.
        user_id: UserId,
        /// New online state.
        is_online: bool,
    },
    /// A participant's role changed.
    RoleChanged {
        /// Participant.
        user_id: UserId,
        /// Previous role.
        from: Role,
        /// New role.
        to: Role,
    },
    /// A participant was kicked and banned.
    ParticipantKicked {
        /// Removed participant.
        user_id: UserId,
        /// Who removed them.
        by: UserId,
    },
    /// An outsider asked to join a gated room.
    JoinRequested {
        /// Requesting user.
        user_id: UserId,
    },
    /// A participant invited a user.
    Invited {
        /// Invited user.
        user_id: UserId,
        /// Inviting participant.
        by: UserId,
    },
    /// Access settings changed.
    SettingsChanged {
        /// New settings.
        settings: RoomSettings,
    },
    /// Lifecycle status changed.
    StatusChanged {
        /// Previous status.
        from: RoomStatus,
        /// New status.
        to: RoomStatus,
    },
}

/// Actions returned by `RoomManager` for the driver to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction<I> {
    /// Broadcast an event to all room participants
    Broadcast {
        /// Room ID to broadcast to
        room_id: RoomId,
        /// Event to broadcast
        event: RoomEvent,
        /// When the event was processed
        processed_at: I,
    },

    /// Drop a user's connection to the room
    Disconnect {
        /// Room ID
        room_id: RoomId,
        /// User to disconnect
        user_id: UserId,
        /// Reason shown to the user
        reason: String,
        /// When the disconnect was decided
        processed_at: I,
    },
}

/// Registry of rooms and their participants.
pub struct RoomManager<E>
where
    E: Environment,
{
    rooms: HashMap<RoomId, Room<E::Instant>>,
}

impl<E> RoomManager<E>
where
    E: Environment,
{
    /// Create a new RoomManager
    pub fn new() -> Self {
        Self { rooms: HashMap::new() }
    }

    fn room(&self, room_id: RoomId) -> Result<&Room<E::Instant>, RoomError> {
        self.rooms.get(&room_id).ok_or(RoomError::RoomNotFound(room_id))
    }

    fn room_mut(&mut self, room_id: RoomId) -> Result<&mut Room<E::Instant>, RoomError> {
        self.rooms.get_mut(&room_id).ok_or(RoomError::RoomNotFound(room_id))
    }

    /// Check if a room exists
    pub fn has_room(&self, room_id: RoomId) -> bool {
        self.rooms.contains_key(&room_id)
    }

    /// Number of rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lifecycle status of a room.
    pub fn status(&self, room_id: RoomId) -> Option<RoomStatus> {
        self.rooms.get(&room_id).map(|room| room.status)
    }

    /// Room metadata.
    pub fn metadata(&self, room_id: RoomId) -> Option<&RoomMetadata<E::Instant>> {
        self.rooms.get(&room_id).map(|room| &room.metadata)
    }

    /// Access settings of a room.
    pub fn settings(&self, room_id: RoomId) -> Option<RoomSettings> {
        self.rooms.get(&room_id).map(|room| room.settings)
    }

    /// Participant record.
    pub fn participant(&self, room_id: RoomId, user_id: UserId) -> Option<&Participant<E::Instant>> {
        self.rooms.get(&room_id).and_then(|room| room.participants.get(&user_id))
    }

    /// Role of a participant.
    pub fn role_of(&self, room_id: RoomId, user_id: UserId) -> Option<Role> {
        self.participant(room_id, user_id).map(|p| p.role)
    }

    /// Participants and their roles, ordered by user ID.
    pub fn participants(&self, room_id: RoomId) -> Vec<(UserId, Role)> {
        self.rooms
            .get(&room_id)
            .map(|room| room.participants.iter().map(|(id, p)| (*id, p.role)).collect())
            .unwrap_or_default()
    }

    /// Whether a user is banned from a room.
    pub fn is_banned(&self, room_id: RoomId, user_id: UserId) -> bool {
        self.rooms.get(&room_id).is_some_and(|room| room.banned.contains(&user_id))
    }

    /// Users waiting for an invitation, ordered by user ID.
    pub fn join_requests(&self, room_id: RoomId) -> Vec<UserId> {
        self.rooms
            .get(&room_id)
            .map(|room| room.join_requests.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Builds the permission snapshot for a participant.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::RoomNotFound` or `RoomError::NotParticipant`.
    pub fn context_for(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<PermissionContext, RoomError> {
        self.room(room_id)?.context_for(user_id)
    }

    /// Checks whether a participant may perform `action` right now.
    ///
    /// Handlers call this before executing mutations the manager does not
    /// own itself (cell updates, chat, hints).
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` with the engine's reason, or a lookup error.
    pub fn authorize(
        &self,
        room_id: RoomId,
        user_id: UserId,
        action: Action,
    ) -> Result<PermissionContext, RoomError> {
        let result = self.room(room_id)?.authorize(user_id, action);
        if let Err(RoomError::Denied(reason)) = &result {
            tracing::warn!("User {} denied {} in room {:032x}: {}", user_id, action, room_id, reason);
        }
        result
    }

    /// Creates a room with the creator as its online HOST.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::RoomAlreadyExists` if the room ID already exists.
    pub fn create_room(
        &mut self,
        room_id: RoomId,
        creator: UserId,
        settings: RoomSettings,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        if self.has_room(room_id) {
            return Err(RoomError::RoomAlreadyExists(room_id));
        }

        let now = env.now();
        let host =
            Participant { role: Role::Host, is_online: true, is_premium: false, joined_at: now };

        let room = Room {
            metadata: RoomMetadata { creator, created_at: now, ended_at: None },
            settings,
            status: RoomStatus::Waiting,
            participants: BTreeMap::from([(creator, host)]),
            banned: BTreeSet::new(),
            invited: BTreeSet::new(),
            join_requests: BTreeSet::new(),
        };
        self.rooms.insert(room_id, room);

        tracing::info!("Room {:032x} created by {}", room_id, creator);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::ParticipantJoined { user_id: creator, role: Role::Host },
            processed_at: now,
        }])
    }

    /// Adds a user to a room.
    ///
    /// Premium users join as PLAYER, everyone else as SPECTATOR. Private
    /// rooms need an invitation; password-protected rooms need an invitation
    /// or `password_verified`.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Banned`, `RoomError::AlreadyParticipant`,
    /// `RoomError::InvitationRequired`, `RoomError::PasswordRequired`, or
    /// `RoomError::Denied` if the room no longer accepts joins.
    pub fn join_room(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        is_premium: bool,
        password_verified: bool,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.check_outsider(user_id)?;
        validate_action(Action::JoinRoom, &room.outsider_context(is_premium))?;

        let invited = room.invited.contains(&user_id);
        if room.settings.is_private && !invited {
            return Err(RoomError::InvitationRequired);
        }
        if room.settings.has_password && !invited && !password_verified {
            return Err(RoomError::PasswordRequired);
        }

        let role = if is_premium { Role::Player } else { Role::Spectator };
        room.participants
            .insert(user_id, Participant { role, is_online: true, is_premium, joined_at: now });
        room.invited.remove(&user_id);
        room.join_requests.remove(&user_id);

        tracing::info!("User {} joined room {:032x} as {}", user_id, room_id, role);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::ParticipantJoined { user_id, role },
            processed_at: now,
        }])
    }

    /// Records a join request for a gated room.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` with `RoomNotGated` for public rooms.
    pub fn request_join(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        is_premium: bool,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.check_outsider(user_id)?;
        validate_action(Action::RequestJoin, &room.outsider_context(is_premium))?;

        if !room.join_requests.insert(user_id) {
            return Ok(vec![]);
        }

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::JoinRequested { user_id },
            processed_at: now,
        }])
    }

    /// Invites a user, clearing any pending join request of theirs.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` if the actor may not invite, or
    /// `RoomError::Banned` / `RoomError::AlreadyParticipant` for the target.
    pub fn invite(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.authorize(actor, Action::InvitePlayers)?;
        room.check_outsider(target)?;

        room.invited.insert(target);
        room.join_requests.remove(&target);

        tracing::info!("User {} invited {} to room {:032x}", actor, target, room_id);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::Invited { user_id: target, by: actor },
            processed_at: now,
        }])
    }

    /// Removes a participant at their own request.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::HostCannotLeave` for the host, or
    /// `RoomError::Denied` once the room is completed or expired.
    pub fn leave_room(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.authorize(user_id, Action::LeaveRoom)?;
        if room.is_host(user_id) {
            return Err(RoomError::HostCannotLeave);
        }

        room.participants.remove(&user_id);
        tracing::info!("User {} left room {:032x}", user_id, room_id);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::ParticipantLeft { user_id },
            processed_at: now,
        }])
    }

    /// Records a presence change reported by the transport.
    ///
    /// Returns no actions if the state did not change.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::NotParticipant` for unknown users.
    pub fn set_online(
        &mut self,
        room_id: RoomId,
        user_id: UserId,
        is_online: bool,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;
        let participant =
            room.participants.get_mut(&user_id).ok_or(RoomError::NotParticipant(user_id))?;

        if participant.is_online == is_online {
            return Ok(vec![]);
        }
        participant.is_online = is_online;

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::PresenceChanged { user_id, is_online },
            processed_at: now,
        }])
    }

    /// Removes `target` from the room and bans them.
    ///
    /// The host may kick anyone else. Moderators pass the `kick_player` gate
    /// but may only remove players and spectators.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::CannotKickSelf`, `RoomError::CannotKickHost`,
    /// `RoomError::NotParticipant`, or `RoomError::Denied`.
    pub fn kick(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        if actor == target {
            return Err(RoomError::CannotKickSelf);
        }

        let context = room.authorize(actor, Action::KickPlayer)?;
        let target_role = room.participant(target)?.role;
        if room.is_host(target) {
            return Err(RoomError::CannotKickHost);
        }

        let allowed = can_kick_user(context.effective_role(), target_role, context.is_host)
            || moderator_may_kick(target_role);
        if !allowed {
            return Err(PermissionDenied::InsufficientRole {
                required: Role::Host,
                actual: context.effective_role(),
            }
            .into());
        }

        room.participants.remove(&target);
        room.banned.insert(target);
        room.invited.remove(&target);

        tracing::info!("User {} kicked {} from room {:032x}", actor, target, room_id);

        Ok(vec![
            RoomAction::Broadcast {
                room_id,
                event: RoomEvent::ParticipantKicked { user_id: target, by: actor },
                processed_at: now,
            },
            RoomAction::Disconnect {
                room_id,
                user_id: target,
                reason: "kicked from room".to_string(),
                processed_at: now,
            },
        ])
    }

    /// Assigns `role` to `target`. Host only.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` for non-hosts, `RoomError::HostRoleFixed`
    /// when the host is targeted or HOST is requested, and
    /// `RoomError::RoleUnchanged` when nothing would change.
    pub fn change_role(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        role: Role,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        let context = room.authorize(actor, Action::ChangeRole)?;
        let from = room.participant(target)?.role;

        if !can_change_role(context.effective_role(), from, role, context.is_host) {
            return Err(PermissionDenied::InsufficientRole {
                required: Role::Host,
                actual: context.effective_role(),
            }
            .into());
        }

        Self::assign_role(room, room_id, target, role, now)
    }

    /// Moves `target` one step up SPECTATOR -> PLAYER -> MODERATOR.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` for non-hosts and `RoomError::RoleUnchanged`
    /// at the top of the ladder.
    pub fn promote(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        self.step_role(room_id, actor, target, Action::Promote, env)
    }

    /// Moves `target` one step down MODERATOR -> PLAYER -> SPECTATOR.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` for non-hosts and `RoomError::RoleUnchanged`
    /// at the bottom of the ladder.
    pub fn demote(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        self.step_role(room_id, actor, target, Action::Demote, env)
    }

    fn step_role(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        target: UserId,
        action: Action,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.authorize(actor, action)?;
        if room.is_host(target) {
            return Err(RoomError::HostRoleFixed);
        }

        let from = room.participant(target)?.role;
        let next = if action == Action::Promote { from.promoted() } else { from.demoted() };
        let to = next.ok_or(RoomError::RoleUnchanged { user_id: target, role: from })?;

        Self::assign_role(room, room_id, target, to, now)
    }

    fn assign_role(
        room: &mut Room<E::Instant>,
        room_id: RoomId,
        target: UserId,
        to: Role,
        now: E::Instant,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        if room.is_host(target) || to == Role::Host {
            return Err(RoomError::HostRoleFixed);
        }

        let participant =
            room.participants.get_mut(&target).ok_or(RoomError::NotParticipant(target))?;
        let from = participant.role;
        if from == to {
            return Err(RoomError::RoleUnchanged { user_id: target, role: from });
        }
        participant.role = to;

        tracing::info!("User {} in room {:032x}: {} -> {}", target, room_id, from, to);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::RoleChanged { user_id: target, from, to },
            processed_at: now,
        }])
    }

    /// Replaces the room's access settings.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` unless the actor passes
    /// `update_room_settings`.
    pub fn update_settings(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        settings: RoomSettings,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.authorize(actor, Action::UpdateRoomSettings)?;
        if room.settings == settings {
            return Ok(vec![]);
        }
        room.settings = settings;

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::SettingsChanged { settings },
            processed_at: now,
        }])
    }

    /// Moves the room along its lifecycle on behalf of a participant.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Denied` unless the actor passes `manage_session`,
    /// and `RoomError::InvalidTransition` for transitions the lifecycle
    /// forbids.
    pub fn set_status(
        &mut self,
        room_id: RoomId,
        actor: UserId,
        status: RoomStatus,
        env: &E,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let now = env.now();
        let room = self.room_mut(room_id)?;

        room.authorize(actor, Action::ManageSession)?;
        Self::transition(room, room_id, status, now)
    }

    /// Expires every non-terminal room created at least `max_age` ago.
    pub fn expire_stale_rooms(&mut self, max_age: Duration, env: &E) -> Vec<RoomAction<E::Instant>> {
        let now = env.now();
        let mut actions = Vec::new();

        for (room_id, room) in &mut self.rooms {
            if room.status.is_terminal() || now - room.metadata.created_at < max_age {
                continue;
            }
            if let Ok(mut expired) = Self::transition(room, *room_id, RoomStatus::Expired, now) {
                actions.append(&mut expired);
            }
        }

        actions
    }

    /// Removes terminal rooms that ended at least `retention` ago.
    ///
    /// Returns the IDs of the removed rooms. Active and waiting rooms are
    /// never removed here; expire them first with `expire_stale_rooms`.
    pub fn evict_ended_rooms(&mut self, retention: Duration, env: &E) -> Vec<RoomId> {
        let now = env.now();
        let mut evicted = Vec::new();

        self.rooms.retain(|room_id, room| {
            let keep = match room.metadata.ended_at {
                Some(ended_at) => now - ended_at < retention,
                None => true,
            };
            if !keep {
                evicted.push(*room_id);
            }
            keep
        });

        if !evicted.is_empty() {
            tracing::info!("Evicted {} ended rooms, {} remaining", evicted.len(), self.rooms.len());
        }

        evicted
    }

    /// Removes a room that has reached COMPLETED or EXPIRED.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::RoomNotFound` for unknown rooms and
    /// `RoomError::RoomStillOpen` for rooms that have not ended.
    pub fn remove_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let status = self.room(room_id)?.status;
        if !status.is_terminal() {
            return Err(RoomError::RoomStillOpen { room_id, status });
        }
        self.rooms.remove(&room_id);

        tracing::info!("Room {:032x} removed", room_id);
        Ok(())
    }

    fn transition(
        room: &mut Room<E::Instant>,
        room_id: RoomId,
        to: RoomStatus,
        now: E::Instant,
    ) -> Result<Vec<RoomAction<E::Instant>>, RoomError> {
        let from = room.status;
        if !from.can_transition_to(to) {
            return Err(RoomError::InvalidTransition { from, to });
        }
        room.status = to;
        if to.is_terminal() {
            room.metadata.ended_at = Some(now);
        }

        tracing::info!("Room {:032x} status {} -> {}", room_id, from, to);

        Ok(vec![RoomAction::Broadcast {
            room_id,
            event: RoomEvent::StatusChanged { from, to },
            processed_at: now,
        }])
    }
}

/// Moderators pass the `kick_player` gate but may only remove players and
/// spectators.
fn moderator_may_kick(target_role: Role) -> bool {
    matches!(target_role, Role::Player | Role::Spectator)
}

impl<E> Default for RoomManager<E>
where
    E: Environment,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for RoomManager<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomManager").field("room_count", &self.rooms.len()).finish()
    }
}
