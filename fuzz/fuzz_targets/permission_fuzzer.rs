//! Fuzz target for the permission engine
//!
//! Prevent privilege escalation through malformed action identifiers or
//! unusual context combinations
//!
//! # Strategy
//!
//! - Arbitrary identifiers: raw strings fed to `validate_action_id`
//! - Arbitrary contexts: every combination of role, status and flags
//!
//! # Invariants
//!
//! - Unknown identifiers MUST be denied with `UnknownAction`
//! - Known identifiers decide exactly as the typed `validate_action`
//! - Offline actors MUST NOT mutate
//! - Non-host actors MUST NOT promote or demote
//! - NEVER panic

#![no_main]

use arbitrary::Arbitrary;
use crossroom_core::{
    Action, PermissionContext, PermissionDenied, Role, RoomStatus, validate_action,
    validate_action_id,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    action: String,
    known_action: u8,
    role: u8,
    status: u8,
    is_host: bool,
    is_online: bool,
    is_private: bool,
    has_password: bool,
    is_premium: bool,
}

fuzz_target!(|input: FuzzInput| {
    let context = PermissionContext {
        role: Role::ALL[usize::from(input.role) % Role::ALL.len()],
        is_host: input.is_host,
        is_online: input.is_online,
        room_status: RoomStatus::ALL[usize::from(input.status) % RoomStatus::ALL.len()],
        is_private: input.is_private,
        has_password: input.has_password,
        is_premium: input.is_premium,
    };

    match input.action.parse::<Action>() {
        Ok(action) => {
            assert_eq!(validate_action_id(&input.action, &context), validate_action(action, &context));
        },
        Err(_) => {
            assert_eq!(
                validate_action_id(&input.action, &context),
                Err(PermissionDenied::UnknownAction(input.action.clone()))
            );
        },
    }

    let action = Action::ALL[usize::from(input.known_action) % Action::ALL.len()];
    let result = validate_action(action, &context);

    let read_only = matches!(
        action,
        Action::ViewRoom | Action::JoinRoom | Action::LeaveRoom | Action::ViewParticipants
    );
    if !context.is_online && !read_only {
        assert_eq!(result, Err(PermissionDenied::Offline));
    }

    if matches!(action, Action::Promote | Action::Demote) && context.effective_role() != Role::Host {
        assert!(result.is_err());
    }
});
