/// Config schema types (assistant backend, telegram transport, dispatch limits,
/// fixed reply texts).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagbridgeConfig {
    pub assistant: AssistantConfig,
    pub telegram: TelegramConfig,
    pub dispatch: DispatchConfig,
    pub replies: RepliesConfig,
}

/// Assistant backend and the resources provisioned on it at startup.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of the Assistants API, e.g. `https://api.openai.com/v1`.
    pub api_url: String,

    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Secret<String>,

    /// Display name of the assistant created at startup.
    pub name: String,

    /// System instructions for the assistant.
    pub instructions: String,

    pub model: String,

    /// Tool types enabled on the assistant (e.g. `file_search`).
    pub tools: Vec<String>,

    /// Directory whose files are uploaded into the retrieval store.
    pub files_path: PathBuf,

    /// Reuse an existing assistant instead of creating one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    /// Reuse an existing vector store instead of creating one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_store_id: Option<String>,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("files_path", &self.files_path)
            .field("assistant_id", &self.assistant_id)
            .field("vector_store_id", &self.vector_store_id)
            .finish_non_exhaustive()
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1".into(),
            api_key: Secret::new(String::new()),
            name: "ragbridge".into(),
            instructions: "Answer questions using the attached reference files.".into(),
            model: "gpt-4o".into(),
            tools: vec!["file_search".into()],
            files_path: PathBuf::from("files"),
            assistant_id: None,
            vector_store_id: None,
        }
    }
}

impl AssistantConfig {
    /// Both identifiers are configured, so provisioning can be skipped.
    #[must_use]
    pub fn has_existing_resources(&self) -> bool {
        non_empty(self.assistant_id.as_deref()) && non_empty(self.vector_store_id.as_deref())
    }
}

/// Telegram bot account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Long-polling timeout passed to `getUpdates` (seconds).
    pub poll_timeout_secs: u32,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            poll_timeout_secs: 30,
        }
    }
}

/// Limits applied to in-flight assistant queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of assistant runs streaming at the same time.
    pub max_concurrent_queries: usize,

    /// Deadline for a single query, from dispatch to the aggregated answer.
    /// `0` disables the deadline.
    pub query_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: 16,
            query_timeout_secs: 120,
        }
    }
}

/// Fixed texts sent back to the chat when no answer can be relayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepliesConfig {
    /// Sent when the assistant call fails.
    pub error: String,
    /// Sent when the assistant produced no text.
    pub empty: String,
}

impl Default for RepliesConfig {
    fn default() -> Self {
        Self {
            error: "Sorry, something went wrong while processing your request.".into(),
            empty: "The assistant could not provide an answer.".into(),
        }
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}
