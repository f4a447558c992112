//! # skydigest-core
//!
//! Core types, traits, configuration, and error handling shared by every
//! skydigest crate.

pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod traits;

pub use config::shellexpand;
