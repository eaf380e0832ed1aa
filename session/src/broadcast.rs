//! Cross-tab session signals.
//!
//! DESIGN
//! ======
//! A logout in one tab must reach the others. Delivery is best effort: there
//! is no acknowledgement, and a listener that misses a signal corrects itself
//! on its next navigation or API call when the store reads empty.
//!
//! [`StorageBroadcast`] keeps the storage-event mechanism (write a sentinel key,
//! then remove it immediately) for origins that share storage but no channel.
//! [`ChannelBroadcast`] is the direct in-process form.
//!
//! Every signal travels in an [`Envelope`] naming the [`Origin`] that sent
//! it. Browsers never deliver a tab its own storage event or channel message;
//! listeners drop envelopes carrying their own origin to get the same effect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::storage::{Storage, StorageEvent};
use crate::validate::LOGOUT_SIGNAL_KEY;

const CHANNEL_CAPACITY: usize = 16;

/// Signal published to every other session holder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionSignal {
    /// The session was cleared; listeners should drop their user and leave
    /// protected screens.
    Logout,
}

/// One session holder, typically a tab. Ids start at 1; [`Origin::EXTERNAL`]
/// marks signals whose sender could not be identified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin(u64);

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

impl Origin {
    pub const EXTERNAL: Self = Self(0);

    /// A process-unique origin.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed))
    }
}

/// A signal and the holder that published it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub origin: Origin,
    pub signal: SessionSignal,
}

impl Envelope {
    /// Whether `origin` sent this envelope.
    #[must_use]
    pub fn is_from(&self, origin: Origin) -> bool {
        self.origin == origin
    }
}

/// Publisher side of a cross-tab signal.
pub trait Broadcast: Send + Sync {
    fn publish(&self, envelope: Envelope);
}

/// In-process broadcast backed by a tokio channel.
#[derive(Clone)]
pub struct ChannelBroadcast {
    tx: broadcast::Sender<Envelope>,
}

impl ChannelBroadcast {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcast for ChannelBroadcast {
    fn publish(&self, envelope: Envelope) {
        let Envelope { origin, signal } = envelope;
        match self.tx.send(envelope) {
            Ok(listeners) => tracing::debug!(?signal, ?origin, listeners, "session signal published"),
            Err(_) => tracing::debug!(?signal, ?origin, "session signal published with no listeners"),
        }
    }
}

/// Broadcast through a shared [`Storage`] by writing and then removing the
/// sentinel key. The value is `logout:<origin>:<seq>`; the sequence number
/// keeps consecutive signals distinguishable.
pub struct StorageBroadcast {
    storage: Arc<dyn Storage>,
    seq: AtomicU64,
}

impl StorageBroadcast {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage, seq: AtomicU64::new(0) }
    }
}

impl Broadcast for StorageBroadcast {
    fn publish(&self, envelope: Envelope) {
        let Envelope { origin, signal } = envelope;
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let value = match signal {
            SessionSignal::Logout => format!("logout:{}:{seq}", origin.0),
        };
        self.storage.set(LOGOUT_SIGNAL_KEY, &value);
        self.storage.remove(LOGOUT_SIGNAL_KEY);
        tracing::debug!(?signal, ?origin, seq, "session signal written to storage");
    }
}

/// Recognize a sentinel write observed on shared storage.
///
/// Only the write carries the signal; the removal that follows is ignored.
/// A sentinel value without a readable origin counts as [`Origin::EXTERNAL`].
#[must_use]
pub fn signal_from_event(event: &StorageEvent) -> Option<Envelope> {
    if event.key != LOGOUT_SIGNAL_KEY {
        return None;
    }
    let value = event.new_value.as_deref()?;
    let id = value.strip_prefix("logout:").and_then(|rest| rest.split(':').next());
    let origin = match id.map(str::parse::<u64>) {
        Some(Ok(id)) => Origin(id),
        _ => Origin::EXTERNAL,
    };
    Some(Envelope { origin, signal: SessionSignal::Logout })
}

/// Discards every signal.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBroadcast;

impl Broadcast for NoopBroadcast {
    fn publish(&self, _envelope: Envelope) {}
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
