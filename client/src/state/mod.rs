//! Client-side state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` owns the guard state machine and the in-memory user.

pub mod auth;
