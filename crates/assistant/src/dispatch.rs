use {reqwest::Response, tracing::debug};

use crate::{
    client::{AssistantClient, ensure_success},
    error::{Error, Result},
    sse::aggregate_stream,
};

/// Sampling parameters sent with every run. Not user-configurable.
const RUN_TEMPERATURE: f64 = 1.0;
const RUN_TOP_P: f64 = 1.0;

/// Identifiers of the resources every query runs against.
///
/// Established once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIds {
    pub assistant_id: String,
    pub vector_store_id: String,
}

impl SessionIds {
    pub fn new(assistant_id: impl Into<String>, vector_store_id: impl Into<String>) -> Result<Self> {
        let assistant_id = assistant_id.into();
        let vector_store_id = vector_store_id.into();
        if assistant_id.trim().is_empty() {
            return Err(Error::message("assistant id must not be empty"));
        }
        if vector_store_id.trim().is_empty() {
            return Err(Error::message("vector store id must not be empty"));
        }
        Ok(Self {
            assistant_id,
            vector_store_id,
        })
    }
}

/// Build the body of a streamed `threads/runs` request: a fresh thread seeded
/// with `query`, file search bound to the session's vector store.
#[must_use]
pub fn run_request_body(session: &SessionIds, query: &str) -> serde_json::Value {
    serde_json::json!({
        "assistant_id": session.assistant_id,
        "thread": {
            "messages": [{ "role": "user", "content": query }],
        },
        "tool_resources": {
            "file_search": { "vector_store_ids": [session.vector_store_id] },
        },
        "temperature": RUN_TEMPERATURE,
        "top_p": RUN_TOP_P,
        "stream": true,
    })
}

/// Issues one-shot streamed runs against a fixed assistant and vector store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: AssistantClient,
    session: SessionIds,
}

impl Dispatcher {
    pub fn new(client: AssistantClient, session: SessionIds) -> Self {
        Self { client, session }
    }

    /// Create a thread and start a streamed run for `query`.
    ///
    /// Returns the open response; its body is the event stream. A transport
    /// failure or a non-success status is returned as an error, without retry.
    pub async fn open_run(&self, query: &str) -> Result<Response> {
        debug!(
            assistant_id = %self.session.assistant_id,
            query_chars = query.chars().count(),
            "starting streamed assistant run"
        );
        let resp = self
            .client
            .post("threads/runs")
            .json(&run_request_body(&self.session, query))
            .send()
            .await?;
        ensure_success(resp).await
    }

    /// Run `query` and fold the event stream into the answer text.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let resp = self.open_run(query).await?;
        aggregate_stream(resp.bytes_stream()).await
    }
}
