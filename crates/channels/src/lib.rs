//! Chat transport abstraction.
//!
//! Each messaging platform implements [`ChannelOutbound`] so the router can
//! reply without knowing which transport delivered the message.

pub mod plugin;

pub use plugin::ChannelOutbound;
