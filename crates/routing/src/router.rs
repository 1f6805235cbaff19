use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    futures::{Stream, StreamExt},
    tokio::{sync::Semaphore, task::JoinHandle},
    tracing::{debug, error, info, warn},
};

use {
    ragbridge_assistant::Dispatcher,
    ragbridge_channels::ChannelOutbound,
    ragbridge_common::InboundMessage,
    ragbridge_config::{DispatchConfig, RepliesConfig},
};

use crate::error::{Error, Result};

/// Produces the assistant's answer to one query.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn answer(&self, query: &str) -> ragbridge_assistant::Result<String>;
}

#[async_trait]
impl AnswerSource for Dispatcher {
    async fn answer(&self, query: &str) -> ragbridge_assistant::Result<String> {
        Dispatcher::answer(self, query).await
    }
}

/// Limits and fixed reply texts used by every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Maximum number of backend calls in flight at once.
    pub max_concurrent: usize,
    /// Deadline for one backend call; `None` waits indefinitely.
    pub query_timeout: Option<Duration>,
    pub error_reply: String,
    pub empty_reply: String,
}

impl RouterConfig {
    #[must_use]
    pub fn from_config(dispatch: &DispatchConfig, replies: &RepliesConfig) -> Self {
        Self {
            max_concurrent: dispatch.max_concurrent_queries.max(1),
            query_timeout: (dispatch.query_timeout_secs > 0)
                .then(|| Duration::from_secs(dispatch.query_timeout_secs)),
            error_reply: replies.error.clone(),
            empty_reply: replies.empty.clone(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default(), &RepliesConfig::default())
    }
}

/// What a task ended up sending back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The assistant's answer was relayed.
    Answered,
    /// The assistant produced no text; the "no answer" reply was sent.
    NoAnswer,
    /// The query failed; the error reply was sent.
    Failed,
}

struct Inner {
    backend: Arc<dyn AnswerSource>,
    outbound: Arc<dyn ChannelOutbound>,
    limiter: Arc<Semaphore>,
    config: RouterConfig,
}

/// Fans inbound messages out to independent answer tasks.
///
/// Cheap to clone; clones share the backend, the outbound channel and the
/// concurrency limit.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl Router {
    pub fn new(
        backend: Arc<dyn AnswerSource>,
        outbound: Arc<dyn ChannelOutbound>,
        config: RouterConfig,
    ) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            inner: Arc::new(Inner {
                backend,
                outbound,
                limiter,
                config,
            }),
        }
    }

    /// Consume `feed` until it ends, spawning one task per message with text.
    ///
    /// Never waits for a spawned task. Returns the number of tasks spawned.
    pub async fn run<S>(&self, feed: S) -> usize
    where
        S: Stream<Item = InboundMessage>,
    {
        let mut feed = std::pin::pin!(feed);
        let mut spawned = 0usize;
        while let Some(msg) = feed.next().await {
            if self.route(msg).is_some() {
                spawned += 1;
            }
        }
        info!(
            channel = self.inner.outbound.id(),
            spawned, "inbound feed ended"
        );
        spawned
    }

    /// Spawn the task answering `msg`, or `None` when it carries no text.
    ///
    /// The message is moved into the task, so no other task can observe it.
    pub fn route(&self, msg: InboundMessage) -> Option<JoinHandle<ReplyOutcome>> {
        if !msg.has_query() {
            debug!(chat_id = msg.chat_id, "ignoring message without text");
            return None;
        }
        info!(
            chat_id = msg.chat_id,
            user_id = ?msg.user_id,
            query_chars = msg.text.chars().count(),
            "received query"
        );
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(async move { inner.handle(msg).await }))
    }
}

impl Inner {
    async fn handle(&self, msg: InboundMessage) -> ReplyOutcome {
        let (outcome, reply) = match self.answer(&msg).await {
            Ok(text) if !text.is_empty() => (ReplyOutcome::Answered, text),
            Ok(_) => {
                warn!(chat_id = msg.chat_id, "assistant returned an empty answer");
                (ReplyOutcome::NoAnswer, self.config.empty_reply.clone())
            },
            Err(e) if e.is_empty_answer() => {
                warn!(chat_id = msg.chat_id, "assistant returned an empty answer");
                (ReplyOutcome::NoAnswer, self.config.empty_reply.clone())
            },
            Err(e) => {
                error!(chat_id = msg.chat_id, error = %e, "assistant query failed");
                (ReplyOutcome::Failed, self.config.error_reply.clone())
            },
        };

        match self.outbound.send_text(msg.chat_id, &reply).await {
            Ok(()) => info!(
                chat_id = msg.chat_id,
                user_id = ?msg.user_id,
                ?outcome,
                "reply sent"
            ),
            Err(e) => warn!(
                chat_id = msg.chat_id,
                ?outcome,
                error = %e,
                "failed to send reply"
            ),
        }
        outcome
    }

    /// Wait for a slot, then ask the backend under the configured deadline.
    async fn answer(&self, msg: &InboundMessage) -> Result<String> {
        let _permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|_| Error::LimiterClosed)?;

        if let Err(e) = self.outbound.send_typing(msg.chat_id).await {
            debug!(chat_id = msg.chat_id, error = %e, "typing indicator failed");
        }

        let query = self.backend.answer(&msg.text);
        match self.config.query_timeout {
            Some(limit) => tokio::time::timeout(limit, query)
                .await
                .map_err(|_| Error::Timeout(limit))?
                .map_err(Error::from),
            None => query.await.map_err(Error::from),
        }
    }
}
