//! Runtime glue.
//!
//! SYSTEM CONTEXT
//! ==============
//! `auth` wires broadcast channels (cross-tab signals, storage events, API
//! rejections) into an `AuthContext`.

pub mod auth;
