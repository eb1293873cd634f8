//! Session store: the logged-in user, persisted across process restarts.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login, registration and logout flow through here so the in-memory
//! profile, the backend cookie session and durable storage stay in step.
//! The router guard reads the derived flags before every navigation.
//!
//! DESIGN
//! ======
//! The profile is the only state; `is_logged_in`, `is_admin` and the display
//! accessors are computed on read. Every write goes to memory first, then to
//! storage under [`USER_INFO_KEY`].
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never surface to callers: reads that fail or hold
//! corrupt JSON leave the session empty, writes that fail are logged and the
//! in-memory session still changes. Login and registration map envelopes
//! and transport errors to [`SessionFailure`] with a user-facing message.

use std::sync::Arc;

use crate::net::transport::Transport;
use crate::net::types::{UserLoginRequest, UserRegisterRequest, UserVo};
use crate::net::user_api;
use crate::router::guard::AuthFlags;
use crate::storage::KeyValueStore;

/// Storage key holding the serialized profile.
pub const USER_INFO_KEY: &str = "userInfo";

const ADMIN_ROLE: &str = "admin";

const LOGIN_FAILED: &str = "login failed";
const LOGIN_NETWORK_FAILED: &str = "login failed, please check your network connection";
const REGISTER_FAILED: &str = "registration failed";
const REGISTER_NETWORK_FAILED: &str = "registration failed, please check your network connection";

// =============================================================================
// TYPES
// =============================================================================

/// Why a login or registration did not succeed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionFailure {
    /// The backend answered with a non-zero code (or no data).
    #[error("{message}")]
    Rejected { code: i32, message: String },

    /// The request never produced an envelope.
    #[error("{message}")]
    Network { message: String },
}

impl SessionFailure {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message, .. } | Self::Network { message } => message,
        }
    }
}

/// Partial profile update; `Some` fields replace the current values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
    pub user_profile: Option<String>,
    pub email: Option<String>,
    pub points: Option<i64>,
    pub user_role: Option<String>,
}

impl ProfilePatch {
    fn apply(self, user: &mut UserVo) {
        if let Some(v) = self.user_name {
            user.user_name = Some(v);
        }
        if let Some(v) = self.user_avatar {
            user.user_avatar = Some(v);
        }
        if let Some(v) = self.user_profile {
            user.user_profile = Some(v);
        }
        if let Some(v) = self.email {
            user.email = Some(v);
        }
        if let Some(v) = self.points {
            user.points = Some(v);
        }
        if let Some(v) = self.user_role {
            user.user_role = Some(v);
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    transport: Arc<dyn Transport>,
    storage: Arc<dyn KeyValueStore>,
    user: Option<UserVo>,
    initialized: bool,
}

impl SessionStore {
    pub fn new(transport: Arc<dyn Transport>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self { transport, storage, user: None, initialized: false }
    }

    /// Load the persisted profile. Only the first call (or one before any
    /// session write) touches storage.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        let raw = match self.storage.get(USER_INFO_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed");
                return;
            }
        };

        match serde_json::from_str::<UserVo>(&raw) {
            Ok(user) => {
                tracing::debug!(user_id = ?user.id, "session restored");
                self.user = Some(user);
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupt stored session");
                if let Err(e) = self.storage.remove(USER_INFO_KEY) {
                    tracing::warn!(error = %e, "failed to remove corrupt session");
                }
            }
        }
    }

    /// Log in and persist the returned profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionFailure::Rejected`] when the backend refuses the
    /// credentials and [`SessionFailure::Network`] when no envelope arrives.
    pub async fn login(&mut self, request: &UserLoginRequest) -> Result<UserVo, SessionFailure> {
        let resp = match user_api::user_login(self.transport.as_ref(), request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "login request failed");
                return Err(SessionFailure::Network { message: LOGIN_NETWORK_FAILED.to_owned() });
            }
        };

        let code = resp.code;
        let message = resp.failure_message().unwrap_or(LOGIN_FAILED).to_owned();
        match resp.success_data() {
            Some(user) => {
                self.set_user(user.clone());
                Ok(user)
            }
            None => Err(SessionFailure::Rejected { code, message }),
        }
    }

    /// Register a new account. Never establishes a session.
    ///
    /// # Errors
    ///
    /// Same contract as [`login`](Self::login), with registration messages.
    pub async fn register(&mut self, request: &UserRegisterRequest) -> Result<Option<i64>, SessionFailure> {
        let resp = match user_api::user_register(self.transport.as_ref(), request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "register request failed");
                return Err(SessionFailure::Network { message: REGISTER_NETWORK_FAILED.to_owned() });
            }
        };

        if resp.is_success() {
            return Ok(resp.data.map(|id| id.0));
        }
        let message = resp.failure_message().unwrap_or(REGISTER_FAILED).to_owned();
        Err(SessionFailure::Rejected { code: resp.code, message })
    }

    /// End the session locally and on the backend. Always succeeds.
    pub async fn logout(&mut self) {
        match user_api::user_logout(self.transport.as_ref()).await {
            Ok(resp) if !resp.is_success() => {
                tracing::warn!(code = resp.code, message = ?resp.message, "logout rejected by server");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "logout request failed"),
        }
        self.clear();
    }

    /// Ask the backend who is logged in. Clears the session unless the
    /// answer carries a profile.
    pub async fn fetch_current_user(&mut self) -> Option<UserVo> {
        let user = match user_api::get_login_user(self.transport.as_ref()).await {
            Ok(resp) => resp.success_data(),
            Err(e) => {
                tracing::warn!(error = %e, "current user request failed");
                None
            }
        };
        match user {
            Some(user) => {
                self.set_user(user.clone());
                Some(user)
            }
            None => {
                self.clear();
                None
            }
        }
    }

    /// Merge `patch` into the current profile. No-op without a session.
    pub fn update_profile(&mut self, patch: ProfilePatch) {
        let Some(mut user) = self.user.take() else {
            return;
        };
        patch.apply(&mut user);
        self.set_user(user);
    }

    /// Drop the session and its stored copy.
    pub fn clear(&mut self) {
        self.user = None;
        self.initialized = true;
        if let Err(e) = self.storage.remove(USER_INFO_KEY) {
            tracing::warn!(error = %e, "failed to remove stored session");
        }
    }

    fn set_user(&mut self, user: UserVo) {
        match serde_json::to_string(&user) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(USER_INFO_KEY, &raw) {
                    tracing::warn!(error = %e, "failed to persist session");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode session"),
        }
        self.user = Some(user);
        self.initialized = true;
    }

    // -------------------------------------------------------------------------
    // Derived state
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn user(&self) -> Option<&UserVo> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// True only for the exact role string `"admin"`.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .and_then(|u| u.user_role.as_deref())
            .is_some_and(|role| role == ADMIN_ROLE)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user.as_ref().and_then(|u| u.user_name.as_deref()).unwrap_or("")
    }

    #[must_use]
    pub fn avatar_ref(&self) -> &str {
        self.user.as_ref().and_then(|u| u.user_avatar.as_deref()).unwrap_or("")
    }

    #[must_use]
    pub fn flags(&self) -> AuthFlags {
        AuthFlags { logged_in: self.is_logged_in(), admin: self.is_admin() }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
