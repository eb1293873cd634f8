//! CodeGenie client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Typed wrappers for the `/user`, `/app` and `/chatHistory` REST endpoints,
//! the persisted session of the logged-in user, and the route table whose
//! guard consults that session before every navigation. The CLI crate in
//! `cli/` drives all three.

pub mod code_gen_type;
pub mod config;
pub mod net;
pub mod router;
pub mod state;
pub mod storage;
