/// A text message received from a chat transport.
///
/// Captured once from the transport's update and then moved into exactly one
/// unit of work; it is never shared between concurrent handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Chat the reply must be sent to.
    pub chat_id: i64,
    /// Sender, when the transport exposes one (channel posts have none).
    pub user_id: Option<u64>,
    pub text: String,
}

impl InboundMessage {
    pub fn new(chat_id: i64, user_id: Option<u64>, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            user_id,
            text: text.into(),
        }
    }

    /// Whether the message carries anything worth sending to the assistant.
    #[must_use]
    pub fn has_query(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_not_a_query() {
        assert!(!InboundMessage::new(1, None, "").has_query());
        assert!(!InboundMessage::new(1, None, "  \n\t").has_query());
        assert!(InboundMessage::new(1, Some(7), "hi").has_query());
    }
}
