//! # skydigest-cache
//!
//! Ephemeral shared state for skydigest: a Redis-backed [`SharedCache`] with
//! a process-local fallback, the inbound-event idempotency gate, and the
//! admin session store.
//!
//! [`SharedCache`]: skydigest_core::traits::SharedCache

pub mod fallback;
pub mod gate;
pub mod local;
pub mod redis_cache;
pub mod sessions;

pub use fallback::FallbackCache;
pub use gate::IdempotencyGate;
pub use local::LocalCache;
pub use redis_cache::RedisCache;
pub use sessions::{constant_time_eq, AdminError, AdminSessions};
