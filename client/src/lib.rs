//! In-app auth controller for the admin dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! This crate is the app-side half of the session guard. The edge gateway
//! makes a first redirect decision from cookies; once the app is running,
//! [`state::auth::AuthContext`] re-validates against the API, drives the guard
//! state machine from `session::guard`, and decides what each navigation shows.
//!
//! Platform capabilities (storage, navigation, cross-tab broadcast) are
//! injected, so the same controller runs in a browser shell, a headless test,
//! or a desktop webview.

pub mod config;
pub mod nav;
pub mod net;
pub mod retry;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_support;
