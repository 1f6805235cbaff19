//! Shared types and error helpers used across all ragbridge crates.

pub mod error;
pub mod types;

pub use {error::FromMessage, types::InboundMessage};
