//! Token store: the session token and its expiry, persisted as a pair.
//!
//! DESIGN
//! ======
//! The token is written obfuscated under [`TOKEN_KEY`] and the expiry as
//! decimal epoch milliseconds under [`EXPIRES_AT_KEY`]. The pair is written or
//! cleared together; anything else found in storage (one half missing, an
//! expired pair, an undecodable token) is purged the next time it is read.
//!
//! Only [`TokenStore::clear`] broadcasts a logout. Lazy purges on read do not,
//! since every other tab reaches the same conclusion from the same clock.

use std::sync::Arc;

use crate::api::SessionGrant;
use crate::broadcast::{Broadcast, Envelope, Origin, SessionSignal};
use crate::clock::Clock;
use crate::codec;
use crate::storage::Storage;
use crate::validate::{EXPIRES_AT_KEY, SessionCheck, TOKEN_KEY, check_session};

#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    broadcast: Arc<dyn Broadcast>,
    origin: Origin,
}

impl TokenStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, broadcast: Arc<dyn Broadcast>) -> Self {
        Self { storage, clock, broadcast, origin: Origin::next() }
    }

    /// Origin stamped on this store's broadcasts. Clones share it.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Persist a token and its expiry.
    ///
    /// Returns `false` and leaves no session behind when either half is
    /// missing or the token is empty.
    pub fn store(&self, token: Option<&str>, expires_at: Option<i64>) -> bool {
        match (token.filter(|t| !t.is_empty()), expires_at) {
            (Some(token), Some(expires_at)) => {
                self.storage.set(TOKEN_KEY, &codec::obfuscate(token));
                self.storage.set(EXPIRES_AT_KEY, &expires_at.to_string());
                tracing::debug!(expires_at, "session stored");
                true
            }
            _ => {
                tracing::warn!(
                    has_token = token.is_some(),
                    has_expiry = expires_at.is_some(),
                    "refusing to store a partial session"
                );
                self.purge();
                false
            }
        }
    }

    /// Persist the token issued by a login or refresh.
    pub fn store_grant(&self, grant: &SessionGrant) -> bool {
        self.store(Some(&grant.token), Some(grant.expires_at))
    }

    /// Inspect the stored pair, purging it unless it is valid.
    pub fn check(&self) -> SessionCheck {
        self.read().0
    }

    /// The decoded token, if the stored session is valid.
    pub fn token(&self) -> Option<String> {
        self.read().1
    }

    /// The stored expiry, if the stored session is valid.
    pub fn expires_at(&self) -> Option<i64> {
        match self.check() {
            SessionCheck::Valid { expires_at } => Some(expires_at),
            SessionCheck::NoSession | SessionCheck::Expired => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.check().is_valid()
    }

    /// Remove the session and tell other tabs. Safe to call repeatedly.
    pub fn clear(&self) {
        self.purge();
        self.broadcast.publish(Envelope { origin: self.origin, signal: SessionSignal::Logout });
        tracing::info!("session cleared");
    }

    fn purge(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(EXPIRES_AT_KEY);
    }

    fn read(&self) -> (SessionCheck, Option<String>) {
        let encoded = self.storage.get(TOKEN_KEY);
        let expires_at = self.storage.get(EXPIRES_AT_KEY);
        let check = check_session(encoded.as_deref(), expires_at.as_deref(), self.clock.now_ms());

        match check {
            SessionCheck::Valid { .. } => {
                let Some(encoded) = encoded else {
                    return (SessionCheck::NoSession, None);
                };
                match codec::reveal(&encoded) {
                    Ok(token) if !token.is_empty() => (check, Some(token)),
                    Ok(_) => {
                        self.purge();
                        (SessionCheck::NoSession, None)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "purging undecodable session token");
                        self.purge();
                        (SessionCheck::NoSession, None)
                    }
                }
            }
            SessionCheck::Expired => {
                tracing::debug!("purging expired session");
                self.purge();
                (check, None)
            }
            SessionCheck::NoSession => {
                if encoded.is_some() || expires_at.is_some() {
                    tracing::debug!("purging orphaned session half");
                    self.purge();
                }
                (check, None)
            }
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
