//! Route table, path matching and guarded navigation.
//!
//! DESIGN
//! ======
//! Routes are a static table of [`RouteRecord`]s. A path resolves to the
//! first record whose pattern matches segment by segment, where `:name`
//! segments capture a parameter. [`Router::navigate`] runs the
//! [`guard`] on the resolved route and follows redirects until a route is
//! allowed.
//!
//! ERROR HANDLING
//! ==============
//! Unknown paths and redirect chains longer than [`MAX_REDIRECTS`] are
//! reported as [`RouterError`]; the current route is left unchanged.

pub mod guard;

use std::collections::BTreeMap;

use crate::state::SessionStore;
use guard::{AuthFlags, GuardDecision};

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Redirect hops followed before navigation gives up.
pub const MAX_REDIRECTS: usize = 8;

// =============================================================================
// TABLE
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteName {
    Home,
    Login,
    Register,
    UserManage,
    Profile,
    About,
    AppChat,
    AppManage,
    ChatManage,
    AppEdit,
}

/// Static per-route metadata. Flags default to `false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: Option<&'static str>,
    pub show_in_menu: bool,
    pub requires_auth: bool,
    pub requires_admin: bool,
    pub hide_layout: bool,
    pub order: Option<u32>,
}

impl RouteMeta {
    pub const NONE: Self = Self {
        title: None,
        show_in_menu: false,
        requires_auth: false,
        requires_admin: false,
        hide_layout: false,
        order: None,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteRecord {
    pub name: RouteName,
    /// Pattern; `:name` segments match any single segment.
    pub path: &'static str,
    pub meta: RouteMeta,
}

pub static ROUTES: &[RouteRecord] = &[
    RouteRecord {
        name: RouteName::Home,
        path: "/",
        meta: RouteMeta { title: Some("Home"), show_in_menu: true, ..RouteMeta::NONE },
    },
    RouteRecord { name: RouteName::Login, path: "/login", meta: RouteMeta { hide_layout: true, ..RouteMeta::NONE } },
    RouteRecord {
        name: RouteName::Register,
        path: "/register",
        meta: RouteMeta { hide_layout: true, ..RouteMeta::NONE },
    },
    RouteRecord {
        name: RouteName::UserManage,
        path: "/user-manage",
        meta: RouteMeta {
            title: Some("User management"),
            show_in_menu: true,
            requires_auth: true,
            requires_admin: true,
            order: Some(10),
            ..RouteMeta::NONE
        },
    },
    RouteRecord {
        name: RouteName::Profile,
        path: "/profile",
        meta: RouteMeta { title: Some("Profile"), requires_auth: true, ..RouteMeta::NONE },
    },
    RouteRecord {
        name: RouteName::About,
        path: "/about",
        meta: RouteMeta { title: Some("About"), show_in_menu: true, ..RouteMeta::NONE },
    },
    RouteRecord {
        name: RouteName::AppChat,
        path: "/app/chat/:id",
        meta: RouteMeta { title: Some("App chat"), requires_auth: true, hide_layout: true, ..RouteMeta::NONE },
    },
    RouteRecord {
        name: RouteName::AppManage,
        path: "/app/manage",
        meta: RouteMeta {
            title: Some("App management"),
            show_in_menu: true,
            requires_auth: true,
            requires_admin: true,
            order: Some(20),
            ..RouteMeta::NONE
        },
    },
    RouteRecord {
        name: RouteName::ChatManage,
        path: "/chat/manage",
        meta: RouteMeta {
            title: Some("Chat management"),
            show_in_menu: true,
            requires_auth: true,
            requires_admin: true,
            order: Some(21),
            ..RouteMeta::NONE
        },
    },
    RouteRecord {
        name: RouteName::AppEdit,
        path: "/app/edit/:id",
        meta: RouteMeta { title: Some("Edit app"), requires_auth: true, ..RouteMeta::NONE },
    },
];

// =============================================================================
// RESOLUTION
// =============================================================================

/// A concrete path matched against the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub record: &'static RouteRecord,
    /// Normalized path: no query, fragment or trailing slash.
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl ResolvedRoute {
    #[must_use]
    pub fn name(&self) -> RouteName {
        self.record.name
    }

    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        HOME_PATH.to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_pattern(pattern: &str, path: &str) -> Option<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    let mut want = segments(pattern);
    let mut have = segments(path);
    loop {
        match (want.next(), have.next()) {
            (None, None) => return Some(params),
            (Some(w), Some(h)) => {
                if let Some(name) = w.strip_prefix(':') {
                    params.insert(name.to_owned(), h.to_owned());
                } else if w != h {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// Match `path` against [`ROUTES`].
#[must_use]
pub fn resolve(path: &str) -> Option<ResolvedRoute> {
    let path = normalize(path);
    ROUTES.iter().find_map(|record| {
        match_pattern(record.path, &path).map(|params| ResolvedRoute { record, path: path.clone(), params })
    })
}

/// Menu entries visible for `flags`, ordered by `order` with unordered
/// routes first in table order.
#[must_use]
pub fn menu(flags: AuthFlags) -> Vec<&'static RouteRecord> {
    let mut items: Vec<&'static RouteRecord> = ROUTES
        .iter()
        .filter(|r| r.meta.show_in_menu)
        .filter(|r| !r.meta.requires_admin || flags.admin)
        .filter(|r| !r.meta.requires_auth || flags.logged_in)
        .collect();
    items.sort_by_key(|r| r.meta.order.unwrap_or(0));
    items
}

// =============================================================================
// NAVIGATION
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("no route matches `{0}`")]
    NotFound(String),

    #[error("too many redirects navigating to `{0}`")]
    RedirectLoop(String),
}

/// Where a navigation ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// The requested route was allowed.
    Arrived(ResolvedRoute),
    /// The guard sent the user elsewhere.
    Redirected { requested: String, route: ResolvedRoute },
}

impl Navigation {
    #[must_use]
    pub fn route(&self) -> &ResolvedRoute {
        match self {
            Self::Arrived(route) | Self::Redirected { route, .. } => route,
        }
    }
}

#[derive(Debug, Default)]
pub struct Router {
    current: Option<ResolvedRoute>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    /// Navigate to `path`, guarding every hop.
    ///
    /// # Errors
    ///
    /// [`RouterError::NotFound`] if a path (requested or redirect target)
    /// matches no route; [`RouterError::RedirectLoop`] after
    /// [`MAX_REDIRECTS`] hops.
    pub fn navigate(&mut self, session: &mut SessionStore, path: &str) -> Result<Navigation, RouterError> {
        let requested = normalize(path);
        let mut target = resolve(path).ok_or_else(|| RouterError::NotFound(path.to_owned()))?;

        for hop in 0..=MAX_REDIRECTS {
            match guard::before_each(session, target.record) {
                GuardDecision::Allow => {
                    let redirected = hop > 0;
                    tracing::debug!(route = ?target.name(), path = %target.path, redirected, "navigation");
                    self.current = Some(target.clone());
                    return Ok(if redirected {
                        Navigation::Redirected { requested, route: target }
                    } else {
                        Navigation::Arrived(target)
                    });
                }
                GuardDecision::Redirect(to) => {
                    tracing::debug!(from = %target.path, to, "guard redirect");
                    target = resolve(to).ok_or_else(|| RouterError::NotFound(to.to_owned()))?;
                }
            }
        }

        tracing::warn!(path = %requested, "redirect loop");
        Err(RouterError::RedirectLoop(requested))
    }

    /// [`menu`] for the session's current flags.
    #[must_use]
    pub fn menu(session: &SessionStore) -> Vec<&'static RouteRecord> {
        menu(session.flags())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
