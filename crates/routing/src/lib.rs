//! Route inbound chat messages to the assistant and relay the answers.
//!
//! Every message with text becomes its own task: the intake loop never waits
//! for an answer, tasks share nothing mutable, and a failure in one task only
//! ever turns into a fixed reply to the chat that asked.

pub mod error;
pub mod router;

pub use {
    error::{Error, Result},
    router::{AnswerSource, ReplyOutcome, Router, RouterConfig},
};
