//! Session guard state machine.
//!
//! ARCHITECTURE
//! ============
//! `Unknown` → `Checking` → `Authenticated` | `Unauthenticated`.
//!
//! `Unknown` lasts until the client hydrates; until then the guard renders its
//! children untouched so server and client markup agree. On hydration the
//! stored session is read: a valid one makes the check optimistic (protected
//! content may render while the API confirms), a missing or expired one does
//! not. The API answer, a confirmation timeout, a 401/419, a login, or a
//! logout then settles the state.
//!
//! [`reduce`] is pure; timers, storage reads and API calls belong to the
//! caller, which feeds their outcomes back in as [`GuardEvent`]s.

use serde::Serialize;

use crate::routes::{RouteDecision, RouteKind, RouteTable};
use crate::validate::{SessionCheck, SessionEnd, is_session_rejection};

/// What storage held when the check started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedSession {
    Present,
    Missing,
    Expired,
}

impl From<SessionCheck> for CachedSession {
    fn from(check: SessionCheck) -> Self {
        match check {
            SessionCheck::Valid { .. } => Self::Present,
            SessionCheck::NoSession => Self::Missing,
            SessionCheck::Expired => Self::Expired,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum GuardState {
    /// Before hydration.
    #[default]
    Unknown,
    /// Waiting for the API to confirm (or deny) the session.
    Checking { cached: CachedSession },
    Authenticated,
    Unauthenticated { reason: SessionEnd },
}

impl GuardState {
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardEvent {
    /// The client mounted and read storage.
    Hydrated { stored: SessionCheck },
    /// The "who am I" call finished (or was skipped).
    ContextResolved { user_present: bool },
    /// The confirmation bound elapsed first.
    ConfirmTimeout,
    /// Some API call answered with this status.
    Rejected { status: u16 },
    LoggedIn,
    /// Local logout or a cross-tab logout signal.
    LoggedOut,
    /// Storage re-read on navigation.
    Revalidated { stored: SessionCheck },
}

/// Advance the guard by one event.
#[must_use]
pub fn reduce(state: GuardState, event: GuardEvent) -> GuardState {
    use GuardEvent as E;
    use GuardState as S;

    match (state, event) {
        (S::Unknown, E::Hydrated { stored }) => S::Checking { cached: stored.into() },
        (S::Unknown, _) => S::Unknown,

        (_, E::Rejected { status }) if is_session_rejection(status) => S::Unauthenticated {
            reason: SessionEnd::ServerRejected { status },
        },
        (_, E::Rejected { .. }) => state,
        (_, E::LoggedOut) => S::Unauthenticated { reason: SessionEnd::NoSession },
        (_, E::LoggedIn) => S::Authenticated,

        (S::Checking { .. }, E::ContextResolved { user_present: true }) => S::Authenticated,
        (S::Checking { cached }, E::ContextResolved { user_present: false }) => S::Unauthenticated {
            reason: match cached {
                CachedSession::Expired => SessionEnd::Expired,
                CachedSession::Present | CachedSession::Missing => SessionEnd::NoSession,
            },
        },
        (S::Checking { .. }, E::ConfirmTimeout) => S::Unauthenticated { reason: SessionEnd::Timeout },

        (S::Authenticated, E::Revalidated { stored: SessionCheck::Expired }) => S::Unauthenticated {
            reason: SessionEnd::Expired,
        },
        (S::Authenticated, E::Revalidated { stored: SessionCheck::NoSession }) => S::Unauthenticated {
            reason: SessionEnd::NoSession,
        },
        (S::Unauthenticated { .. }, E::Revalidated { stored: stored @ SessionCheck::Valid { .. } }) => {
            S::Checking { cached: stored.into() }
        }

        _ => state,
    }
}

/// What a guarded screen should do right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardView {
    /// Pre-hydration: render children exactly as the server did.
    Passthrough,
    /// Hold rendering until the check settles.
    Loading,
    Render,
    Redirect(String),
}

/// Map a guard state and the current path to a view.
///
/// An optimistic check renders protected content but keeps the login form
/// hidden, so a user with a stored session never sees it flash.
#[must_use]
pub fn view_for(state: GuardState, path_and_query: &str, routes: &RouteTable) -> GuardView {
    let kind = routes.classify(path_and_query);
    match state {
        GuardState::Unknown => GuardView::Passthrough,
        GuardState::Checking { cached } => match (kind, cached) {
            (RouteKind::Public, _) => GuardView::Render,
            (RouteKind::Protected, CachedSession::Present) => GuardView::Render,
            (RouteKind::Login, CachedSession::Missing | CachedSession::Expired) => GuardView::Render,
            _ => GuardView::Loading,
        },
        GuardState::Authenticated | GuardState::Unauthenticated { .. } => {
            match routes.decide(path_and_query, state.is_authenticated()) {
                RouteDecision::Allow => GuardView::Render,
                RouteDecision::Redirect(target) => GuardView::Redirect(target),
            }
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
