use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};

use crate::transport::{ByteStream, Transport};
use crate::types::{HttpBody, HttpRequest, HttpResponse, HttpVerb};
use crate::{Error, Result};

/// A [`Transport`] implementation that uses the `reqwest` crate for making HTTP requests.
///
/// This is the default transport used by [`TranslateClient`](crate::TranslateClient) if no
/// custom transport is provided. The connect timeout and user agent are fixed
/// per client; whole-exchange timeouts come from each [`HttpRequest`].
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport`.
    ///
    /// # Arguments
    ///
    /// * `connect_timeout` - Maximum time to establish a connection.
    /// * `user_agent` - Default `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the `reqwest` client cannot be built.
    pub fn new(connect_timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self { client })
    }

    /// Helper to build and send a reqwest request, handling common logic.
    async fn build_and_send_request(&self, request: HttpRequest) -> Result<reqwest::Response> {
        let url = Url::parse(&request.url)
            .map_err(|e| Error::Client(format!("Invalid URL '{}': {}", request.url, e)))?;

        let mut request_builder = match request.verb {
            HttpVerb::GET => self.client.get(url),
            HttpVerb::POST => self.client.post(url),
        };

        if !request.query.is_empty() {
            request_builder = request_builder.query(&request.query);
        }

        for (name, value) in &request.headers {
            request_builder = request_builder.header(name.as_str(), value.as_str());
        }

        if let Some(token) = &request.bearer_token {
            request_builder = request_builder.bearer_auth(token);
        }

        if let Some(timeout) = request.timeout {
            request_builder = request_builder.timeout(timeout);
        }

        request_builder = match request.body {
            Some(HttpBody::Json(body)) => request_builder.json(&body),
            Some(HttpBody::Multipart(files)) => {
                let form = files.into_iter().fold(Form::new(), |form, file| {
                    let part = Part::bytes(file.data.to_vec()).file_name(file.file_name);
                    form.part(file.field, part)
                });
                request_builder.multipart(form)
            }
            None => request_builder,
        };

        let response = request_builder.send().await.map_err(Error::Transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    /// Sends a non-streaming HTTP request using `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Transport`] if the request fails or the response cannot be read,
    /// and an [`Error::Server`] for non-success statuses.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(url = %request.url)))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.build_and_send_request(request).await?;
        let status = response.status().as_u16();
        let response_bytes = response.bytes().await.map_err(Error::Transport)?;
        Ok(HttpResponse {
            status,
            body: Some(response_bytes),
        })
    }

    /// Sends a streaming HTTP request using `reqwest` and returns a stream of response bytes.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Transport`] if the request fails or the stream cannot be established,
    /// and an [`Error::Server`] for non-success statuses.
    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(url = %request.url)))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        let response = self.build_and_send_request(request).await?;
        let stream = response
            .bytes_stream()
            .map(|item| item.map_err(Error::Transport))
            .boxed();
        Ok(stream)
    }
}
