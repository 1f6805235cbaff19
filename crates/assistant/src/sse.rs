//! Server-sent-event aggregation for streamed assistant runs.
//!
//! The run endpoint answers with `data: <json>` lines. Text arrives in
//! `thread.message.delta` events; the stream ends with `data: [DONE]`, a
//! `thread.message.completed` event, or plain EOF. [`aggregate_stream`] folds
//! all of that into a single answer string.

use std::{error::Error as StdError, ops::ControlFlow};

use {
    futures::{Stream, StreamExt},
    serde::Deserialize,
    tracing::{debug, trace, warn},
};

use crate::error::{Error, Result};

/// Prefix of the only line type that carries a payload.
const DATA_PREFIX: &str = "data: ";

/// Explicit end-of-stream sentinel, distinct from transport EOF.
const DONE_SENTINEL: &str = "[DONE]";

/// One parsed unit of the run stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text fragments of a message delta, in content order.
    Delta(Vec<String>),
    /// The assistant message is complete.
    Completed,
    /// Any other event kind (run status, steps, ...).
    Other,
    /// The `[DONE]` sentinel.
    Done,
}

/// Outcome of parsing one raw line.
#[derive(Debug)]
pub enum SseLine {
    /// Blank separator or a line type without a payload for us.
    Skip,
    Event(StreamEvent),
    /// A `data:` line whose payload is not a valid event record.
    Malformed(serde_json::Error),
}

// Wire shapes. Only the event kinds we consume get a variant; every other
// `object` value lands in `Other`.
#[derive(Deserialize)]
#[serde(tag = "object")]
enum WireEvent {
    #[serde(rename = "thread.message.delta")]
    MessageDelta {
        #[serde(default)]
        delta: WireDelta,
    },
    #[serde(rename = "thread.message.completed")]
    MessageCompleted,
    #[serde(other)]
    Other,
}

#[derive(Default, Deserialize)]
struct WireDelta {
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Deserialize)]
struct WireText {
    #[serde(default)]
    value: Option<String>,
}

impl From<WireEvent> for StreamEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::MessageDelta { delta } => Self::Delta(
                delta
                    .content
                    .into_iter()
                    .filter_map(|c| c.text.and_then(|t| t.value))
                    .collect(),
            ),
            WireEvent::MessageCompleted => Self::Completed,
            WireEvent::Other => Self::Other,
        }
    }
}

impl StreamEvent {
    /// Parse the payload of a `data:` line.
    pub fn from_payload(payload: &str) -> std::result::Result<Self, serde_json::Error> {
        if payload == DONE_SENTINEL {
            return Ok(Self::Done);
        }
        serde_json::from_str::<WireEvent>(payload).map(Self::from)
    }
}

/// Parse a single line of the stream (without its line terminator).
pub fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Skip;
    };
    match StreamEvent::from_payload(payload) {
        Ok(event) => SseLine::Event(event),
        Err(e) => SseLine::Malformed(e),
    }
}

/// Splits a byte stream into lines.
///
/// Works on bytes so multi-byte characters split across network chunks are
/// decoded only once the full line is present.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line[..pos]).into_owned())
    }

    /// Whatever is left after EOF, if the stream did not end with a newline.
    fn remainder(self) -> Option<String> {
        (!self.buf.is_empty()).then(|| String::from_utf8_lossy(&self.buf).into_owned())
    }
}

/// Accumulates delta fragments in arrival order.
#[derive(Default)]
struct AnswerBuilder {
    text: String,
    fragments: usize,
    malformed: usize,
}

impl AnswerBuilder {
    /// Feed one line; `Break` means the stream signalled its end.
    fn apply_line(&mut self, line: &str) -> ControlFlow<()> {
        match parse_sse_line(line) {
            SseLine::Skip | SseLine::Event(StreamEvent::Other) => ControlFlow::Continue(()),
            SseLine::Malformed(e) => {
                self.malformed += 1;
                warn!(error = %e, "skipping malformed stream event");
                ControlFlow::Continue(())
            },
            SseLine::Event(StreamEvent::Delta(parts)) => {
                for part in parts {
                    self.text.push_str(&part);
                    self.fragments += 1;
                }
                ControlFlow::Continue(())
            },
            SseLine::Event(StreamEvent::Completed) => {
                debug!("assistant message completed");
                ControlFlow::Break(())
            },
            SseLine::Event(StreamEvent::Done) => {
                debug!("assistant stream done");
                ControlFlow::Break(())
            },
        }
    }

    fn finish(self) -> Result<String> {
        debug!(
            fragments = self.fragments,
            malformed = self.malformed,
            chars = self.text.chars().count(),
            "assembled assistant answer"
        );
        trace!(answer = %self.text, "assistant answer text");
        if self.text.is_empty() {
            return Err(Error::EmptyResponse);
        }
        Ok(self.text)
    }
}

/// Fold an SSE byte stream into the assistant's answer.
///
/// Reading stops at `[DONE]`, at a `thread.message.completed` event, or at
/// EOF; all three finalize normally. A trailing line without a newline at
/// EOF is discarded. Malformed payloads are logged and
/// skipped. A read error aborts immediately and discards any partial text.
/// An answer with no text is [`Error::EmptyResponse`].
///
/// The stream is consumed by value and dropped on every return path, which
/// releases the underlying connection.
pub async fn aggregate_stream<S, B, E>(stream: S) -> Result<String>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: StdError + Send + Sync + 'static,
{
    let mut stream = std::pin::pin!(stream);
    let mut lines = LineBuffer::default();
    let mut answer = AnswerBuilder::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Error::stream_read)?;
        lines.extend(chunk.as_ref());
        while let Some(line) = lines.next_line() {
            if answer.apply_line(&line).is_break() {
                return answer.finish();
            }
        }
    }

    // Only newline-terminated lines are records.
    if let Some(rest) = lines.remainder() {
        debug!(bytes = rest.len(), "dropping unterminated line at end of stream");
    }

    answer.finish()
}
