//! Telegram transport: long-polling intake and outbound replies.
//!
//! Built on teloxide. Inbound updates become a stream of
//! [`ragbridge_common::InboundMessage`]; replies go out through
//! [`TelegramOutbound`], which implements
//! [`ragbridge_channels::ChannelOutbound`].

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod mock_api;

pub use {
    bot::{connect, inbound_messages},
    error::{Error, Result},
    outbound::TelegramOutbound,
};
