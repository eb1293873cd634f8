//! Pre-navigation authorization check.
//!
//! Rules run in a fixed order and the first match wins:
//! 1. auth required, no session: go to login
//! 2. admin required, not an admin: go home
//! 3. login/register page while logged in: go home
//! 4. otherwise allow

use super::{HOME_PATH, LOGIN_PATH, RouteName, RouteRecord};
use crate::state::SessionStore;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthFlags {
    pub logged_in: bool,
    pub admin: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

/// Decide whether `flags` may enter `route`.
#[must_use]
pub fn evaluate(route: &RouteRecord, flags: AuthFlags) -> GuardDecision {
    if route.meta.requires_auth && !flags.logged_in {
        return GuardDecision::Redirect(LOGIN_PATH);
    }
    if route.meta.requires_admin && !flags.admin {
        return GuardDecision::Redirect(HOME_PATH);
    }
    if matches!(route.name, RouteName::Login | RouteName::Register) && flags.logged_in {
        return GuardDecision::Redirect(HOME_PATH);
    }
    GuardDecision::Allow
}

/// Make sure the session is loaded, then [`evaluate`].
pub fn before_each(session: &mut SessionStore, route: &RouteRecord) -> GuardDecision {
    session.initialize();
    evaluate(route, session.flags())
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
