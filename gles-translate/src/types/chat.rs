//! Contains all data structures used with OpenAI-compatible Chat Completions endpoints

use serde::{Deserialize, Serialize};

use crate::endpoint::chat_completions_url;
use crate::{Error, Result};

use super::Role;

/// Where a streaming chat request goes and how it authenticates.
///
/// All three fields are user-supplied settings and must be non-blank; see
/// [`ChatTarget::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTarget {
    /// Base URL of the provider, e.g. `https://api.openai.com` or `https://host/v1`.
    pub base_url: String,
    /// Bearer credential sent in the `Authorization` header.
    pub api_key: String,
    /// Model identifier placed in the request body.
    pub model: String,
}

impl ChatTarget {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Fails with [`Error::Config`] when any field is blank.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Config("AI base URL is not configured".into()));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("AI API key is not configured".into()));
        }
        if self.model.trim().is_empty() {
            return Err(Error::Config("AI model is not configured".into()));
        }
        Ok(())
    }

    /// The absolute chat-completions endpoint derived from [`ChatTarget::base_url`].
    pub fn completions_url(&self) -> String {
        chat_completions_url(&self.base_url)
    }
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

impl ChatCompletionRequest {
    /// Creates a request that asks the server to stream its answer.
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            stream: true,
            messages,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message made of several typed parts (text, image, audio).
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Message content is either a plain string or a list of typed parts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    InputAudio { input_audio: InputAudio },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// An image embedded as a `data:<media type>;base64,<payload>` URL.
    pub fn image_base64(media_type: &str, base64: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{};base64,{}", media_type, base64),
            },
        }
    }

    pub fn audio_base64(format: impl Into<String>, base64: impl Into<String>) -> Self {
        ContentPart::InputAudio {
            input_audio: InputAudio {
                data: base64.into(),
                format: format.into(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputAudio {
    /// Base64 audio payload.
    pub data: String,
    /// Container/codec hint such as `mp3`, `wav` or `mpeg`.
    pub format: String,
}

/// One `data:` payload of a streaming response.
///
/// Both the Chat shape (`choices[].delta.content`) and the legacy Completions
/// shape (`choices[].text`) are accepted.
#[derive(Deserialize, Debug, Default)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Option<Vec<ChunkChoice>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChunkChoice {
    /// `delta.content` when present and non-null, otherwise `text`.
    pub fn delta_text(&self) -> Option<&str> {
        self.delta
            .as_ref()
            .and_then(|d| d.content.as_deref())
            .or(self.text.as_deref())
    }
}

impl ChatCompletionChunk {
    /// Concatenation of every choice's delta text, in array order.
    pub fn delta_text(&self) -> String {
        self.choices
            .iter()
            .flatten()
            .filter_map(ChunkChoice::delta_text)
            .collect()
    }
}
