//! The delta stream returned by streaming chat calls, and its accumulation
//! into a final string.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::parser::ChatDeltaParser;
use crate::{Error, Result};

/// A stream of text deltas, in the order the server sent them.
///
/// Dropping the stream drops the underlying response body and closes the
/// connection.
pub struct DeltaStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl Stream for DeltaStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl DeltaStream {
    pub fn from_bytes_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + Unpin + 'static,
    {
        DeltaStream {
            inner: Box::pin(ChatDeltaParser::new(stream)),
        }
    }

    /// Drains the stream, calling `on_delta` once per delta and returning the
    /// concatenation of all deltas.
    ///
    /// The returned string always equals the deltas passed to `on_delta`,
    /// joined in call order. A transport error aborts with that error. When
    /// `cancel` fires, the stream is dropped, `on_delta` is not called again
    /// and [`Error::Cancelled`] is returned.
    pub async fn accumulate<F>(
        mut self,
        mut on_delta: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let mut accumulated = String::new();

        loop {
            let next = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(Error::Cancelled),
                    item = self.next() => item,
                },
                None => self.next().await,
            };

            match next {
                Some(delta) => {
                    let delta = delta?;
                    accumulated.push_str(&delta);
                    on_delta(&delta);
                }
                None => break,
            }
        }

        Ok(accumulated)
    }
}
