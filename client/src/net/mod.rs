//! Networking for the auth API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` wraps the auth endpoints, and `interceptor` turns a 401/419 from any
//! authenticated call into an app-wide logout.

pub mod api;
pub mod interceptor;
