//! Client-side state that outlives a single request.
//!
//! DESIGN
//! ======
//! The session store owns the current user and mirrors it to a
//! [`KeyValueStore`](crate::storage::KeyValueStore). It is built once per
//! application root and passed by reference to whatever needs it, most
//! notably the router guard.

pub mod session;

pub use session::{ProfilePatch, SessionFailure, SessionStore, USER_INFO_KEY};
