//! Auth-session state for the running app.
//!
//! SYSTEM CONTEXT
//! ==============
//! The edge gateway has already made a cookie-only redirect decision by the
//! time this runs. [`AuthContext`] re-validates independently: it reads the
//! token store, asks the API who the user is (bounded by a confirmation
//! timeout), feeds each outcome through `session::guard::reduce`, and turns
//! every navigation into a [`GuardView`].
//!
//! ERROR HANDLING
//! ==============
//! API failures never escape as panics. A failed "who am I" call settles the
//! guard as unauthenticated; a 401/419 anywhere ends the session.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use session::guard::{self, GuardView};
use session::retry::{DEFAULT_REFRESH_WINDOW, should_refresh};
use session::routes::normalize_path;
use session::validate::is_session_rejection;
use session::{
    Access, ApiError, AuthApi, AuthenticatedUser, Credentials, GuardEvent, GuardState, Origin, PermissionMap,
    RouteTable, SessionSignal, TokenStore,
};

use crate::nav::Navigator;

/// How long a stored session may stay unconfirmed before the login form shows.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(3);

/// Where users land when they lack the permission a path requires.
pub const DEFAULT_FALLBACK_PATH: &str = "/admin/overview";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub routes: RouteTable,
    pub permissions: PermissionMap,
    pub fallback_path: String,
    pub confirm_timeout: Duration,
    pub refresh_window: Duration,
}

impl AuthConfig {
    /// Where to send a user holding `granted` instead of `path`, if they may
    /// not see it. The fallback path itself is always allowed.
    #[must_use]
    pub fn permission_redirect<S: AsRef<str>>(&self, path: &str, granted: &[S]) -> Option<String> {
        let path = normalize_path(path);
        if path == normalize_path(&self.fallback_path) {
            return None;
        }
        match self.permissions.authorize(path, granted) {
            Access::Granted => None,
            Access::Denied { requirement } => {
                tracing::info!(path, ?requirement, "missing permission, redirecting");
                Some(self.fallback_path.clone())
            }
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            routes: RouteTable::default(),
            permissions: PermissionMap::default(),
            fallback_path: DEFAULT_FALLBACK_PATH.to_owned(),
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            refresh_window: DEFAULT_REFRESH_WINDOW,
        }
    }
}

/// Guard state plus the in-memory user. The user is never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub guard: GuardState,
    pub user: Option<AuthenticatedUser>,
}

impl AuthState {
    /// True until the guard has settled one way or the other.
    #[must_use]
    pub fn loading(&self) -> bool {
        matches!(self.guard, GuardState::Unknown | GuardState::Checking { .. })
    }
}

pub struct AuthContext {
    store: TokenStore,
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    config: AuthConfig,
    state: Mutex<AuthState>,
}

impl AuthContext {
    #[must_use]
    pub fn new(store: TokenStore, api: Arc<dyn AuthApi>, navigator: Arc<dyn Navigator>, config: AuthConfig) -> Self {
        Self {
            store,
            api,
            navigator,
            config,
            state: Mutex::new(AuthState::default()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Origin of this context's own logout broadcasts.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.store.origin()
    }

    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn guard(&self) -> GuardState {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).guard
    }

    /// Feed one event through the reducer. Leaving the authenticated states
    /// drops the in-memory user.
    fn apply(&self, event: GuardEvent) -> GuardState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = guard::reduce(state.guard, event);
        if next != state.guard {
            tracing::debug!(from = ?state.guard, to = ?next, ?event, "guard transition");
        }
        if matches!(next, GuardState::Unauthenticated { .. }) {
            state.user = None;
        }
        state.guard = next;
        next
    }

    fn settle_with_user(&self, user: AuthenticatedUser) -> GuardState {
        tracing::info!(user_id = %user.id, "session confirmed");
        self.state.lock().unwrap_or_else(PoisonError::into_inner).user = Some(user);
        self.apply(GuardEvent::ContextResolved { user_present: true })
    }

    /// Client mounted: read storage, then confirm with the API.
    pub async fn hydrate(&self) -> GuardState {
        let stored = self.store.check();
        self.apply(GuardEvent::Hydrated { stored });
        self.confirm().await
    }

    /// Ask the API who the user is, bounded by the confirmation timeout.
    async fn confirm(&self) -> GuardState {
        let Some(token) = self.store.token() else {
            return self.apply(GuardEvent::ContextResolved { user_present: false });
        };
        match tokio::time::timeout(self.config.confirm_timeout, self.api.current_user(&token)).await {
            Ok(Ok(user)) => self.settle_with_user(user),
            Ok(Err(ApiError::Rejected { status })) => self.on_rejected(status),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "could not confirm session");
                self.apply(GuardEvent::ContextResolved { user_present: false })
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.confirm_timeout, "session confirmation timed out");
                self.apply(GuardEvent::ConfirmTimeout)
            }
        }
    }

    /// Log in and navigate to the post-login target, which is returned.
    ///
    /// `redirect` is the decoded `redirect` query parameter of the login page.
    ///
    /// # Errors
    ///
    /// Returns the API error when login fails, or [`ApiError::Decode`] when the
    /// API issued a session that cannot be stored.
    pub async fn login(&self, credentials: &Credentials, redirect: Option<&str>) -> Result<String, ApiError> {
        let grant = self.api.login(credentials).await?;
        if !self.store.store_grant(&grant) {
            return Err(ApiError::Decode("login issued an unusable session".into()));
        }
        let user = match grant.user {
            Some(user) => user,
            None => match self.api.current_user(&grant.token).await {
                Ok(user) => user,
                Err(err) => {
                    self.store.clear();
                    return Err(err);
                }
            },
        };

        tracing::info!(user_id = %user.id, "logged in");
        self.state.lock().unwrap_or_else(PoisonError::into_inner).user = Some(user);
        self.apply(GuardEvent::LoggedIn);

        let target = self.config.routes.safe_redirect_target(redirect);
        self.navigator.navigate(&target);
        Ok(target)
    }

    /// End the session locally and, best effort, at the API.
    pub async fn logout(&self) {
        if let Some(token) = self.store.token() {
            if let Err(err) = self.api.logout(&token).await {
                tracing::warn!(error = %err, "api logout failed, clearing locally");
            }
        }
        self.store.clear();
        self.apply(GuardEvent::LoggedOut);
        self.navigator.navigate(self.config.routes.login_path());
    }

    /// Refresh the token when it is close to expiry. Returns whether a
    /// refresh happened.
    ///
    /// # Errors
    ///
    /// Returns the API error. A 401/419 also ends the session.
    pub async fn refresh_if_due(&self) -> Result<bool, ApiError> {
        let (Some(token), Some(expires_at)) = (self.store.token(), self.store.expires_at()) else {
            return Ok(false);
        };
        let now = self.store.clock().now_ms();
        if !should_refresh(expires_at, now, self.config.refresh_window) {
            return Ok(false);
        }

        let grant = match self.api.refresh(&token).await {
            Ok(grant) => grant,
            Err(ApiError::Rejected { status }) => {
                self.on_rejected(status);
                return Err(ApiError::Rejected { status });
            }
            Err(err) => return Err(err),
        };
        if !self.store.store_grant(&grant) {
            return Err(ApiError::Decode("refresh issued an unusable session".into()));
        }
        if let Some(user) = grant.user {
            self.state.lock().unwrap_or_else(PoisonError::into_inner).user = Some(user);
        }
        tracing::debug!(expires_at = grant.expires_at, "session refreshed");
        Ok(true)
    }

    /// React to a cross-tab signal. A tab sitting on a protected page is
    /// sent to the login form.
    pub fn on_signal(&self, signal: SessionSignal) -> GuardState {
        match signal {
            SessionSignal::Logout => {
                let was_authenticated = self.guard().is_authenticated();
                let next = self.apply(GuardEvent::LoggedOut);
                if was_authenticated {
                    if let Some(current) = self.navigator.current() {
                        if let GuardView::Redirect(target) = guard::view_for(next, &current, &self.config.routes) {
                            tracing::info!(from = %current, to = %target, "logged out in another tab");
                            self.navigator.navigate(&target);
                        }
                    }
                }
                next
            }
        }
    }

    /// An API call answered with `status`; 401/419 end the session.
    pub fn on_rejected(&self, status: u16) -> GuardState {
        if is_session_rejection(status) && self.store.token().is_some() {
            self.store.clear();
        }
        self.apply(GuardEvent::Rejected { status })
    }

    /// Navigate to `path_and_query`: re-read storage, confirm a revived
    /// session, then apply route and permission rules. The navigator ends up
    /// at the path or at the redirect target.
    pub async fn navigate(&self, path_and_query: &str) -> GuardView {
        let stored = self.store.check();
        let mut state = self.apply(GuardEvent::Revalidated { stored });
        if matches!(state, GuardState::Checking { .. }) {
            state = self.confirm().await;
        }

        let view = match guard::view_for(state, path_and_query, &self.config.routes) {
            GuardView::Render if state.is_authenticated() => self.permission_view(path_and_query),
            view => view,
        };
        match &view {
            GuardView::Redirect(target) => self.navigator.navigate(target),
            GuardView::Passthrough | GuardView::Loading | GuardView::Render => self.navigator.navigate(path_and_query),
        }
        view
    }

    fn permission_view(&self, path_and_query: &str) -> GuardView {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let granted = state
            .user
            .as_ref()
            .map(|user| user.permissions.as_slice())
            .unwrap_or_default();
        match self.config.permission_redirect(path_and_query, granted) {
            Some(target) => GuardView::Redirect(target),
            None => GuardView::Render,
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
