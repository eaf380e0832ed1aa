//! Shared session validation for the admin dashboard.
//!
//! This crate owns everything both execution contexts agree on: the storage
//! and cookie keys, token obfuscation, expiry checks, route classification,
//! permission lookups and the guard state machine. The edge gateway (`server`)
//! and the in-app controller (`client`) import it instead of carrying their own
//! copies, so the two layers cannot drift apart.
//!
//! Nothing in here touches a network, a timer, or a UI framework. Platform
//! capabilities (storage, clock, cross-tab broadcast) are traits injected by
//! the caller.

pub mod api;
pub mod broadcast;
pub mod clock;
pub mod codec;
pub mod guard;
pub mod permissions;
pub mod retry;
pub mod routes;
pub mod storage;
pub mod store;
pub mod validate;

pub use api::{ApiEnvelope, ApiError, AuthApi, AuthenticatedUser, Credentials, SessionGrant};
pub use broadcast::{
    Broadcast, ChannelBroadcast, Envelope, NoopBroadcast, Origin, SessionSignal, StorageBroadcast,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{CachedSession, GuardEvent, GuardState, GuardView};
pub use permissions::{Access, PermissionMap, Requirement};
pub use retry::RetryPolicy;
pub use routes::{RouteDecision, RouteKind, RouteTable};
pub use storage::{MemoryStorage, NoopStorage, Storage, StorageEvent};
pub use store::TokenStore;
pub use validate::{EXPIRES_AT_KEY, LOGOUT_SIGNAL_KEY, SessionCheck, SessionEnd, TOKEN_KEY};
