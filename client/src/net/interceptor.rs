//! Shared API response interceptor.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every authenticated API call reports its status here. A 401 or 419 from
//! anywhere in the app ends the session: the token store is cleared (which
//! broadcasts a logout to other tabs) and, after a short delay that lets
//! in-flight state settle, the app is sent to the login path.
//!
//! Concurrent rejections schedule a single redirect, and none at all if the
//! app already reached the login form in the meantime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use session::TokenStore;
use session::routes::normalize_path;
use session::validate::is_session_rejection;
use tokio::sync::broadcast;

use crate::nav::Navigator;

pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(500);

const REJECTION_CAPACITY: usize = 16;

#[derive(Clone)]
pub struct SessionInterceptor {
    inner: Arc<Inner>,
}

struct Inner {
    store: TokenStore,
    navigator: Arc<dyn Navigator>,
    login_path: String,
    delay: Duration,
    redirect_pending: AtomicBool,
    rejections: broadcast::Sender<u16>,
}

impl SessionInterceptor {
    #[must_use]
    pub fn new(store: TokenStore, navigator: Arc<dyn Navigator>, login_path: &str, delay: Duration) -> Self {
        let (rejections, _) = broadcast::channel(REJECTION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                navigator,
                login_path: normalize_path(login_path).to_owned(),
                delay,
                redirect_pending: AtomicBool::new(false),
                rejections,
            }),
        }
    }

    /// Statuses that ended the session, for whoever tracks guard state.
    #[must_use]
    pub fn subscribe_rejections(&self) -> broadcast::Receiver<u16> {
        self.inner.rejections.subscribe()
    }

    /// Inspect a response status. Returns `true` when it ended the session.
    ///
    /// Must be called from within a tokio runtime; the redirect runs on a
    /// spawned task.
    pub fn observe(&self, status: u16) -> bool {
        if !is_session_rejection(status) {
            return false;
        }
        tracing::warn!(status, "api rejected session, clearing token");
        self.inner.store.clear();
        if self.inner.rejections.send(status).is_err() {
            tracing::debug!(status, "no rejection listeners");
        }

        if self.inner.redirect_pending.swap(true, Ordering::SeqCst) {
            return true;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.delay).await;
            let already_there = inner
                .navigator
                .current()
                .is_some_and(|current| normalize_path(&current) == inner.login_path);
            if !already_there {
                tracing::info!(to = %inner.login_path, "redirecting to login after rejection");
                inner.navigator.navigate(&inner.login_path);
            }
            inner.redirect_pending.store(false, Ordering::SeqCst);
        });
        true
    }
}

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;
