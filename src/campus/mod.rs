//! Campus detection: the resolver flow and the shell's mount check.

pub mod resolver;

pub use resolver::{CampusResolver, ResolverCallbacks, ResolverFailure, ResolverState};

use crate::cooldown::CooldownGate;
use crate::models::user::UserProfile;

/// Whether the shell should mount a resolver for this user right now.
/// The resolver itself does not look at the cooldown once mounted.
pub fn should_prompt(profile: Option<&UserProfile>, gate: &CooldownGate) -> bool {
    match profile {
        Some(p) if p.needs_campus() => !gate.is_dismissed_recently(),
        _ => false,
    }
}
