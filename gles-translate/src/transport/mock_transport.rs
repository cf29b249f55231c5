use std::sync::{Arc, Mutex};

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;

use crate::transport::{ByteStream, Transport};
use crate::types::{HttpRequest, HttpResponse};
use crate::{Error, Result};

/// A mock implementation of the [`Transport`] trait for testing purposes.
///
/// Responses are configured up front; every request that reaches the
/// transport is recorded so tests can inspect what would have gone over the
/// wire, or assert that nothing did.
#[derive(Clone, Default)]
pub struct MockTransport {
    /// Body chunks returned for the next streaming request.
    stream_items: Arc<Mutex<Vec<Result<Bytes>>>>,
    /// Keep the stream open after the configured chunks instead of ending it.
    hold_stream_open: Arc<Mutex<bool>>,
    /// Response returned for the next non-streaming request.
    http_response: Arc<Mutex<Option<HttpResponse>>>,
    /// Error returned for the next request of either kind, before any body.
    failure: Arc<Mutex<Option<Error>>>,
    /// Every request received, in order.
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Creates a new, empty [`MockTransport`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams each string as its own chunk, with a `\n` appended.
    pub fn with_stream_lines<I, T>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let chunks = lines
            .into_iter()
            .map(|line| Ok(Bytes::from(format!("{}\n", line.into()))))
            .collect();
        *self.stream_items.lock().unwrap() = chunks;
        self
    }

    /// Streams the given raw chunks as-is.
    pub fn with_stream_chunks(self, chunks: Vec<Bytes>) -> Self {
        *self.stream_items.lock().unwrap() = chunks.into_iter().map(Ok).collect();
        self
    }

    /// Streams the given items, which may include mid-stream errors.
    pub fn with_stream_items(self, items: Vec<Result<Bytes>>) -> Self {
        *self.stream_items.lock().unwrap() = items;
        self
    }

    /// After the configured chunks, the stream stays pending forever.
    pub fn hold_stream_open(self) -> Self {
        *self.hold_stream_open.lock().unwrap() = true;
        self
    }

    /// Configures the response for the next non-streaming request.
    pub fn with_http_response(self, response: HttpResponse) -> Self {
        *self.http_response.lock().unwrap() = Some(response);
        self
    }

    /// Shorthand for a `200` response with the given body.
    pub fn with_http_body(self, body: impl Into<String>) -> Self {
        self.with_http_response(HttpResponse {
            status: 200,
            body: Some(Bytes::from(body.into())),
        })
    }

    /// Makes the next request fail with `error`, as a refused connection would.
    pub fn with_failure(self, error: Error) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: HttpRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request);
        match self.failure.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    /// Returns the configured response, or an empty `200` response.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.record(request)?;
        let response = self
            .http_response
            .lock()
            .unwrap()
            .take()
            .unwrap_or(HttpResponse {
                status: 200,
                body: None,
            });
        if !response.is_success() {
            return Err(Error::Server {
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }

    /// Returns the configured chunks as a byte stream, or an empty stream.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request)))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        self.record(request)?;
        let items = self
            .stream_items
            .lock()
            .unwrap()
            .drain(..)
            .collect::<Vec<_>>();
        let byte_stream = stream::iter(items);

        if *self.hold_stream_open.lock().unwrap() {
            Ok(byte_stream.chain(stream::pending()).boxed())
        } else {
            Ok(byte_stream.boxed())
        }
    }
}
