//! Background listeners that keep an [`AuthContext`] in step with the world.
//!
//! SYSTEM CONTEXT
//! ==============
//! Three sources can end a session behind the controller's back: a logout
//! broadcast from another tab, a raw storage event (the write-then-delete of
//! the logout sentinel key), and a 401/419 observed by the shared interceptor.
//! Each listener runs until its channel closes. Lagging receivers skip ahead;
//! every signal means the same thing, so missing some is harmless.
//!
//! A context never handles its own logout broadcast. Its local logout path
//! (the interceptor's delayed redirect, or `logout`) already covers it.

use std::sync::Arc;

use session::broadcast::signal_from_event;
use session::{Envelope, StorageEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::state::auth::AuthContext;

/// Forward signals from other tabs to `ctx`.
pub fn spawn_signal_listener(ctx: Arc<AuthContext>, rx: broadcast::Receiver<Envelope>) -> JoinHandle<()> {
    spawn_listener("signal", rx, move |envelope| deliver(&ctx, envelope))
}

/// Translate storage events written by other tabs into signals for `ctx`.
pub fn spawn_storage_listener(ctx: Arc<AuthContext>, rx: broadcast::Receiver<StorageEvent>) -> JoinHandle<()> {
    spawn_listener("storage", rx, move |event| {
        if let Some(envelope) = signal_from_event(&event) {
            deliver(&ctx, envelope);
        }
    })
}

fn deliver(ctx: &AuthContext, envelope: Envelope) {
    if envelope.is_from(ctx.origin()) {
        tracing::trace!(signal = ?envelope.signal, "ignoring own session signal");
        return;
    }
    ctx.on_signal(envelope.signal);
}

/// Forward interceptor rejections to `ctx`.
pub fn spawn_rejection_listener(ctx: Arc<AuthContext>, rx: broadcast::Receiver<u16>) -> JoinHandle<()> {
    spawn_listener("rejection", rx, move |status| {
        ctx.on_rejected(status);
    })
}

fn spawn_listener<T, F>(source: &'static str, mut rx: broadcast::Receiver<T>, mut handle: F) -> JoinHandle<()>
where
    T: Clone + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(message) => handle(message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(source, skipped, "auth listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(source, "auth listener stopped");
    })
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
