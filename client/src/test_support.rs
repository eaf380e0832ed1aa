//! Scriptable `AuthApi` for controller tests.

use std::future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use session::{
    ApiError, AuthApi, AuthenticatedUser, ChannelBroadcast, Credentials, ManualClock, MemoryStorage, SessionGrant,
    TokenStore,
};

pub const NOW: i64 = 1_700_000_000_000;

pub fn user(permissions: &[&str]) -> AuthenticatedUser {
    AuthenticatedUser {
        id: "u1".into(),
        name: "Ada".into(),
        email: "ada@example.com".into(),
        avatar: None,
        permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
    }
}

pub struct Harness {
    pub clock: ManualClock,
    pub storage: Arc<MemoryStorage>,
    pub bus: ChannelBroadcast,
    pub store: TokenStore,
}

pub fn harness() -> Harness {
    let clock = ManualClock::new(NOW);
    let storage = Arc::new(MemoryStorage::new());
    let bus = ChannelBroadcast::new();
    let store = TokenStore::new(storage.clone(), Arc::new(clock.clone()), Arc::new(bus.clone()));
    Harness { clock, storage, bus, store }
}

/// Each endpoint answers with its scripted result; an unscripted
/// `current_user` never answers.
#[derive(Default)]
pub struct MockApi {
    pub me: Mutex<Option<Result<AuthenticatedUser, ApiError>>>,
    pub login: Mutex<Option<Result<SessionGrant, ApiError>>>,
    pub refresh: Mutex<Option<Result<SessionGrant, ApiError>>>,
    pub me_calls: AtomicU32,
    pub logout_calls: AtomicU32,
    pub refresh_calls: AtomicU32,
}

impl MockApi {
    pub fn with_user(user: AuthenticatedUser) -> Self {
        let api = Self::default();
        *api.me.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ok(user));
        api
    }

    pub fn set_me(&self, result: Result<AuthenticatedUser, ApiError>) {
        *self.me.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    pub fn set_login(&self, result: Result<SessionGrant, ApiError>) {
        *self.login.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }

    pub fn set_refresh(&self, result: Result<SessionGrant, ApiError>) {
        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
    }
}

fn scripted<T: Clone>(slot: &Mutex<Option<Result<T, ApiError>>>) -> Result<T, ApiError> {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(|| Err(ApiError::Transport("not scripted".into())))
}

#[async_trait]
impl AuthApi for MockApi {
    async fn login(&self, _credentials: &Credentials) -> Result<SessionGrant, ApiError> {
        scripted(&self.login)
    }

    async fn logout(&self, _token: &str) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn refresh(&self, _token: &str) -> Result<SessionGrant, ApiError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        scripted(&self.refresh)
    }

    async fn current_user(&self, _token: &str) -> Result<AuthenticatedUser, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.me.lock().unwrap_or_else(PoisonError::into_inner).clone();
        match answer {
            Some(result) => result,
            None => future::pending().await,
        }
    }
}
