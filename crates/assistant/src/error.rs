use std::error::Error as StdError;

/// Errors raised while talking to the assistant backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request could not be built or sent, or the response could not be read.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("assistant API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Reading the event stream failed before it ended.
    #[error("failed to read event stream: {source}")]
    StreamRead {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The run finished without producing any answer text.
    #[error("empty response from assistant")]
    EmptyResponse,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn stream_read(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::StreamRead {
            source: Box::new(source),
        }
    }

    /// Whether the backend simply had nothing to say, as opposed to failing.
    #[must_use]
    pub fn is_empty_response(&self) -> bool {
        matches!(self, Self::EmptyResponse)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
