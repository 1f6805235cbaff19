use std::time::Duration;

use {
    futures::Stream,
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {ragbridge_common::InboundMessage, ragbridge_config::TelegramConfig};

use crate::{
    error::{Error, Result},
    handlers,
};

/// Pause after a failed `getUpdates` call before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Extra time the HTTP client waits beyond the long-polling timeout, so it
/// never aborts a request Telegram is still holding open.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Build the bot client, verify the token and clear any webhook so long
/// polling works.
pub async fn connect(config: &TelegramConfig) -> Result<Bot> {
    if config.token.expose_secret().trim().is_empty() {
        return Err(Error::message("telegram bot token is empty"));
    }
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(config.poll_timeout_secs)) + CLIENT_TIMEOUT_MARGIN)
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);
    prepare(&bot).await?;
    Ok(bot)
}

async fn prepare(bot: &Bot) -> Result<()> {
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;
    info!(
        username = ?me.username,
        "telegram bot connected (webhook cleared)"
    );
    Ok(())
}

/// Long-poll `getUpdates` and yield every text message as an
/// [`InboundMessage`], in arrival order.
///
/// The stream ends when `cancel` fires or when Telegram reports that another
/// instance is polling with the same token. Any other polling error is logged
/// and retried after a pause.
pub fn inbound_messages(
    bot: Bot,
    poll_timeout_secs: u32,
    cancel: CancellationToken,
) -> impl Stream<Item = InboundMessage> {
    async_stream::stream! {
        info!(poll_timeout_secs, "starting telegram polling loop");
        let mut offset: i32 = 0;

        loop {
            let request = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout_secs)
                .allowed_updates(vec![AllowedUpdate::Message])
                .send();

            let result = tokio::select! {
                () = cancel.cancelled() => break,
                result = request => result,
            };

            match result {
                Ok(updates) => {
                    debug!(count = updates.len(), "got telegram updates");
                    for update in updates {
                        offset = update.id.as_offset();
                        match update.kind {
                            UpdateKind::Message(msg) => {
                                match handlers::inbound_from_message(&msg) {
                                    Some(inbound) => yield inbound,
                                    None => debug!(
                                        chat_id = msg.chat.id.0,
                                        "ignoring telegram message without text"
                                    ),
                                }
                            },
                            other => debug!("ignoring non-message update: {other:?}"),
                        }
                    }
                },
                Err(e) if is_conflict(&e) => {
                    warn!(
                        "telegram polling stopped: another instance is already running with this token"
                    );
                    break;
                },
                Err(e) => {
                    warn!(error = %e, "telegram getUpdates failed");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                    }
                },
            }
        }

        info!("telegram polling stopped");
    }
}

fn is_conflict(error: &RequestError) -> bool {
    matches!(error, RequestError::Api(ApiError::TerminatedByOtherGetUpdates))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {futures::StreamExt, serde_json::json};

    use {
        super::*,
        crate::mock_api::{CapturedRequest, MockTelegramApi},
    };

    fn text_update(update_id: i64, chat_id: i64, text: &str) -> serde_json::Value {
        json!({
            "update_id": update_id,
            "message": {
                "message_id": update_id,
                "date": 1,
                "chat": { "id": chat_id, "type": "private", "first_name": "Alice" },
                "from": { "id": 1001, "is_bot": false, "first_name": "Alice" },
                "text": text
            }
        })
    }

    #[test]
    fn conflict_is_detected() {
        assert!(is_conflict(&RequestError::Api(
            ApiError::TerminatedByOtherGetUpdates
        )));
        assert!(!is_conflict(&RequestError::Io(std::io::Error::other(
            "boom"
        ))));
    }

    #[tokio::test]
    async fn connect_rejects_empty_token() {
        let config = TelegramConfig {
            token: secrecy::Secret::new("  ".into()),
            ..Default::default()
        };
        let err = connect(&config).await.unwrap_err();
        assert!(matches!(err, Error::Message { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn prepare_checks_token_and_clears_webhook() {
        let api = MockTelegramApi::start().await;
        prepare(&api.bot()).await.unwrap();

        let methods: Vec<_> = api
            .requests()
            .into_iter()
            .map(|r| match r {
                CapturedRequest::Other { method } => method,
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(methods, vec!["GetMe", "DeleteWebhook"]);
    }

    #[tokio::test]
    async fn polling_yields_text_messages_and_advances_offset() {
        let api = MockTelegramApi::with_updates(vec![
            vec![text_update(10, 42, "first"), text_update(11, 43, "   ")],
            vec![text_update(12, 44, "second")],
        ])
        .await;
        let cancel = CancellationToken::new();
        let feed = inbound_messages(api.bot(), 1, cancel.clone());
        let mut feed = std::pin::pin!(feed);

        let first = feed.next().await.unwrap();
        assert_eq!(first, InboundMessage::new(42, Some(1001), "first"));
        let second = feed.next().await.unwrap();
        assert_eq!(second, InboundMessage::new(44, Some(1001), "second"));

        cancel.cancel();
        let end = tokio::time::timeout(Duration::from_secs(5), feed.next())
            .await
            .expect("feed ends after cancel");
        assert!(end.is_none());

        let offsets: Vec<_> = api
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                CapturedRequest::GetUpdates { offset } => Some(offset),
                _ => None,
            })
            .collect();
        assert_eq!(offsets[0], Some(0));
        assert_eq!(offsets[1], Some(12));
    }
}
