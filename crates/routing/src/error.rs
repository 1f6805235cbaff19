use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Assistant(#[from] ragbridge_assistant::Error),

    #[error("query did not finish within {0:?}")]
    Timeout(Duration),

    #[error("dispatch limiter closed")]
    LimiterClosed,
}

impl Error {
    /// The assistant answered but produced no text.
    #[must_use]
    pub fn is_empty_answer(&self) -> bool {
        matches!(self, Self::Assistant(e) if e.is_empty_response())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
