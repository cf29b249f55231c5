//! Parsing of `text/event-stream` responses from OpenAI-compatible chat
//! endpoints into text deltas.
//!
//! The parser works on raw byte chunks, splits them into lines at the byte
//! level (so multi-byte UTF-8 characters may straddle chunk boundaries), and
//! yields one delta per `data:` line that carries non-empty text.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

use crate::types::chat::ChatCompletionChunk;
use crate::Result;

/// Prefix marking an SSE data line.
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// What a single stream line amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// A non-empty piece of text to append.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Blank lines, non-data lines, malformed payloads and empty deltas.
    Skip,
}

/// Classifies one line (without its line terminator).
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.trim().is_empty() {
        return SseLine::Skip;
    }
    let Some(rest) = line.strip_prefix(DATA_PREFIX) else {
        return SseLine::Skip;
    };
    let data = rest.trim();
    if data == DONE_SENTINEL {
        return SseLine::Done;
    }

    let delta = parse_delta_text(data);
    if delta.is_empty() {
        SseLine::Skip
    } else {
        SseLine::Delta(delta)
    }
}

/// Extracts the text carried by one `data:` payload.
///
/// For every entry of `choices`, `delta.content` is used when it is a
/// non-null string, otherwise the legacy `text` field. The pieces are joined
/// in array order. Anything that does not parse yields an empty string.
pub fn parse_delta_text(data: &str) -> String {
    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => chunk.delta_text(),
        Err(_err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %_err, "skipping malformed stream line");
            String::new()
        }
    }
}

/// Turns a byte stream of SSE lines into a stream of text deltas.
///
/// The stream ends at the `[DONE]` sentinel (the inner stream is not polled
/// again) or when the inner stream ends. A transport error is yielded once and
/// also ends the stream.
pub struct ChatDeltaParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    inner: S,
    buffer: Vec<u8>,
    finished: bool,
}

impl<S> ChatDeltaParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Consumes complete lines from the buffer until one produces a delta.
    /// Returns `None` when no complete line is left or the sentinel was seen.
    fn parse_lines(&mut self) -> Option<String> {
        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line_bytes = self.buffer.drain(..=newline_pos).collect::<Vec<u8>>();

            match classify(&line_bytes) {
                SseLine::Delta(delta) => return Some(delta),
                SseLine::Done => {
                    self.finished = true;
                    self.buffer.clear();
                    return None;
                }
                SseLine::Skip => continue,
            }
        }
    }
}

fn classify(line_bytes: &[u8]) -> SseLine {
    let line = String::from_utf8_lossy(line_bytes);
    parse_sse_line(line.trim_end_matches(|c| c == '\n' || c == '\r'))
}

impl<S> Stream for ChatDeltaParser<S>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
{
    type Item = Result<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(delta) = this.parse_lines() {
                return Poll::Ready(Some(Ok(delta)));
            }

            // parse_lines may have hit the sentinel
            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // The last line may lack a terminator.
                    let rest = std::mem::take(&mut this.buffer);
                    if let SseLine::Delta(delta) = classify(&rest) {
                        return Poll::Ready(Some(Ok(delta)));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
