use std::sync::Arc;

use thiserror::Error;

use self::builder::ClientSettings;
use self::transport::Transport;

pub mod builder;
pub mod client;
pub mod endpoint;
pub mod parser;
pub mod prompt;
pub mod recognition;
pub mod session;
pub mod state;
pub mod store;
pub mod stream;
pub mod transport;
pub mod types;

pub use session::TranslatorSession;
pub use types::ChatTarget;

/// Client for the translation backends: the OpenAI-compatible streaming chat
/// endpoint configured per call, and the built-in translation and OCR/ASR
/// endpoints configured at build time.
#[derive(Clone)]
pub struct TranslateClient {
    transport: Arc<dyn Transport + Send + Sync>,
    settings: ClientSettings,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error: HTTP {status}: {body}")]
    Server { status: u16, body: String },

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Stream cancelled")]
    Cancelled,
}
