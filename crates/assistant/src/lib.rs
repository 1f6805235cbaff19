//! Client for an OpenAI-compatible Assistants API (v2) with file search.
//!
//! - [`provision`] creates the assistant and its vector store at startup.
//! - [`dispatch`] opens one streamed run per user query.
//! - [`sse`] folds the run's event stream into the final answer text.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod provision;
pub mod sse;

pub use {
    client::AssistantClient,
    dispatch::{Dispatcher, SessionIds},
    error::{Error, Result},
    sse::aggregate_stream,
};
