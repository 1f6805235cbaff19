use {anyhow::Result, async_trait::async_trait};

/// Send messages to a chat.
///
/// Implementations must be safe to call concurrently from many tasks; callers
/// do not serialize access.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Channel identifier used in logs (e.g. "telegram").
    fn id(&self) -> &str;

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;

    /// Send a "typing" indicator. No-op by default.
    async fn send_typing(&self, _chat_id: i64) -> Result<()> {
        Ok(())
    }
}
