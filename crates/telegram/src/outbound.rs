use std::{future::Future, time::Duration};

use {
    anyhow::Result,
    async_trait::async_trait,
    teloxide::{
        RequestError,
        prelude::*,
        types::{ChatAction, ChatId},
    },
    tracing::{debug, warn},
};

use ragbridge_channels::ChannelOutbound;

/// Longest text Telegram accepts in one message, in characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Run `request`, waiting out Telegram's `retry_after` rate limits a
    /// bounded number of times.
    async fn with_rate_limit_retry<T, F, Fut>(
        &self,
        chat_id: i64,
        operation: &'static str,
        mut request: F,
    ) -> std::result::Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };
                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id,
                            operation,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }
                    retries += 1;
                    warn!(
                        chat_id,
                        operation,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
///
/// Splits at the last newline inside the window, then the last space, and
/// only cuts through a word when neither exists. The separator at a split
/// point is dropped.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    loop {
        // Byte offset just past the first `max_chars` characters, if the
        // remainder is longer than that.
        let Some((window_end, _)) = remaining.char_indices().nth(max_chars) else {
            chunks.push(remaining.to_string());
            break;
        };

        let window = &remaining[..window_end];
        let (head, tail) = match window.rfind('\n').or_else(|| window.rfind(' ')) {
            Some(at) if at > 0 => (&remaining[..at], &remaining[at + 1..]),
            _ => remaining.split_at(window_end),
        };
        chunks.push(head.to_string());
        remaining = tail;
        if remaining.is_empty() {
            break;
        }
    }

    chunks
}

#[async_trait]
impl ChannelOutbound for TelegramOutbound {
    fn id(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let chunks = chunk_message(text, TELEGRAM_MAX_MESSAGE_LEN);
        debug!(
            chat_id,
            chunk_count = chunks.len(),
            text_len = text.len(),
            "sending telegram reply"
        );
        for chunk in &chunks {
            self.with_rate_limit_retry(chat_id, "send_message", || {
                self.bot.send_message(ChatId(chat_id), chunk.as_str()).send()
            })
            .await?;
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await?;
        Ok(())
    }
}
