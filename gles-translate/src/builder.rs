use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::instrument;

use reqwest::Url;

use crate::transport::{ReqwestTransport, Transport};
use crate::{Error, Result, TranslateClient};

pub const DEFAULT_BUILTIN_TRANSLATE_URL: &str = "https://api.jkyai.top/API/depsek3.1.php";
pub const DEFAULT_BUILTIN_OCR_URL: &str = "https://api.pearktrue.cn/api/ocr/";
pub const DEFAULT_BUILTIN_ASR_URL: &str = "https://api.pearktrue.cn/api/audiocr/";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RECOGNITION_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolved configuration of a [`TranslateClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub builtin_translate_url: String,
    pub builtin_ocr_url: String,
    pub builtin_asr_url: String,
    /// Whole-exchange timeout of a streaming chat call.
    pub stream_timeout: Duration,
    /// Timeout of the built-in translation call.
    pub request_timeout: Duration,
    /// Timeout of a built-in OCR/ASR upload.
    pub recognition_timeout: Duration,
    pub user_agent: String,
}

/// A builder for constructing a [`TranslateClient`].
///
/// - Built-in endpoints come from the setters, then the `GLES_TRANSLATE_URL`,
///   `GLES_OCR_URL` and `GLES_ASR_URL` environment variables, then the
///   public defaults.
/// - Timeouts default to 15s connect, 60s per streaming exchange, 20s per
///   built-in translation and 60s per OCR/ASR upload.
/// - Uses `reqwest`-based transport by default - [`ReqwestTransport`].
pub struct TranslateClientBuilder {
    builtin_translate_url: Option<String>,
    builtin_ocr_url: Option<String>,
    builtin_asr_url: Option<String>,
    connect_timeout: Duration,
    stream_timeout: Duration,
    request_timeout: Duration,
    recognition_timeout: Duration,
    user_agent: Option<String>,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

impl TranslateClientBuilder {
    /// Creates a new [`TranslateClientBuilder`]. This method is called by [`TranslateClient::builder`]
    pub(crate) fn new() -> Self {
        TranslateClientBuilder {
            builtin_translate_url: None,
            builtin_ocr_url: None,
            builtin_asr_url: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            recognition_timeout: DEFAULT_RECOGNITION_TIMEOUT,
            user_agent: None,
            transport: None,
        }
    }

    /// Sets the URL of the built-in (non-streaming) translation endpoint.
    pub fn builtin_translate_url(mut self, url: impl Into<String>) -> Self {
        self.builtin_translate_url = Some(url.into());
        self
    }

    /// Sets the URL of the built-in image OCR endpoint.
    pub fn builtin_ocr_url(mut self, url: impl Into<String>) -> Self {
        self.builtin_ocr_url = Some(url.into());
        self
    }

    /// Sets the URL of the built-in audio recognition endpoint.
    pub fn builtin_asr_url(mut self, url: impl Into<String>) -> Self {
        self.builtin_asr_url = Some(url.into());
        self
    }

    /// Sets the connect timeout of the default transport.
    ///
    /// Ignored when a custom transport is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn recognition_timeout(mut self, timeout: Duration) -> Self {
        self.recognition_timeout = timeout;
        self
    }

    /// Overrides the `User-Agent` sent with every request. Some
    /// OpenAI-compatible providers reject requests without one.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets a custom transport implementation for the client.
    ///
    /// For testing, you can use [`MockTransport`](crate::transport::MockTransport)
    /// or your own mock [`Transport`] implementations.
    pub fn transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`TranslateClient`] with the configured options.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`](variant@Error::Client) if a built-in URL is invalid or
    /// if there's an issue initializing [`ReqwestTransport`].
    #[cfg_attr(feature = "tracing", instrument(skip(self)))]
    pub fn build(self) -> Result<TranslateClient> {
        let settings = ClientSettings {
            builtin_translate_url: resolve_url(
                self.builtin_translate_url,
                "GLES_TRANSLATE_URL",
                DEFAULT_BUILTIN_TRANSLATE_URL,
            )?,
            builtin_ocr_url: resolve_url(
                self.builtin_ocr_url,
                "GLES_OCR_URL",
                DEFAULT_BUILTIN_OCR_URL,
            )?,
            builtin_asr_url: resolve_url(
                self.builtin_asr_url,
                "GLES_ASR_URL",
                DEFAULT_BUILTIN_ASR_URL,
            )?,
            stream_timeout: self.stream_timeout,
            request_timeout: self.request_timeout,
            recognition_timeout: self.recognition_timeout,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| format!("GlesTranslate/{}", env!("CARGO_PKG_VERSION"))),
        };

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(
                self.connect_timeout,
                &settings.user_agent,
            )?),
        };

        Ok(TranslateClient {
            transport,
            settings,
        })
    }
}

fn resolve_url(explicit: Option<String>, env_var: &str, default: &str) -> Result<String> {
    let url = explicit
        .or_else(|| std::env::var(env_var).ok())
        .unwrap_or_else(|| default.to_string());
    Url::parse(&url).map_err(|e| Error::Client(format!("Invalid URL '{}': {}", url, e)))?;
    Ok(url)
}
