//! # skydigest-memory
//!
//! Durable state for skydigest (SQLite-backed): the schedule store, the
//! message store, the summary execution lock, and the command audit log.

pub mod audit;
pub mod store;

pub use audit::{AuditEntry, AuditLogger, AuditStatus};
pub use store::{LockTrigger, Store};
