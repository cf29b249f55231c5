use bytes::Bytes;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
use metrics::counter;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::builder::{ClientSettings, TranslateClientBuilder};
use crate::prompt::{
    audio_recognition_messages, image_recognition_messages, translation_messages,
    translation_system_prompt,
};
use crate::recognition::{parse_recognition_body, parse_translation_body};
use crate::stream::DeltaStream;
use crate::types::chat::{ChatCompletionRequest, ChatMessage};
use crate::types::{ChatTarget, HttpRequest, Modality};
use crate::TranslateClient;
use crate::{Error, Result};

const EVENT_STREAM: &str = "text/event-stream";

impl TranslateClient {
    pub fn builder() -> TranslateClientBuilder {
        TranslateClientBuilder::new()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Starts a streaming chat completion and returns its deltas.
    ///
    /// `target` is validated before anything is sent, so a blank base URL,
    /// API key or model fails with [`Error::Config`] without touching the
    /// network.
    #[cfg_attr(feature = "tracing", instrument(skip(self, target, messages), fields(model = %target.model)))]
    pub async fn chat_stream(
        &self,
        target: &ChatTarget,
        messages: Vec<ChatMessage>,
    ) -> Result<DeltaStream> {
        target.validate()?;

        let body = ChatCompletionRequest::streaming(target.model.as_str(), messages);
        let request = HttpRequest::new(target.completions_url())
            .post()
            .bearer_auth(target.api_key.as_str())
            .accept(EVENT_STREAM)
            .header("User-Agent", self.settings.user_agent.as_str())
            .timeout(self.settings.stream_timeout)
            .body(body)?;

        let byte_stream = self.transport.send_http_stream_request(request).await?;
        Ok(DeltaStream::from_bytes_stream(byte_stream))
    }

    /// Streams a translation of `source_text` into `target_language`.
    ///
    /// `on_delta` sees every non-empty piece in arrival order; the return value
    /// is their concatenation.
    pub async fn stream_text<F>(
        &self,
        target: &ChatTarget,
        target_language: &str,
        source_text: &str,
        on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let messages = translation_messages(target_language, source_text);
        self.stream_modality(Modality::Text, target, messages, on_delta, None)
            .await
    }

    /// Streams the text recognized in a base64-encoded image.
    pub async fn stream_recognize_image<F>(
        &self,
        target: &ChatTarget,
        image_base64: &str,
        media_type: &str,
        on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let messages = image_recognition_messages(image_base64, media_type);
        self.stream_modality(Modality::Image, target, messages, on_delta, None)
            .await
    }

    /// Streams the text recognized in base64-encoded audio.
    pub async fn stream_recognize_audio<F>(
        &self,
        target: &ChatTarget,
        audio_base64: &str,
        audio_format: &str,
        on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let messages = audio_recognition_messages(audio_base64, audio_format);
        self.stream_modality(Modality::Audio, target, messages, on_delta, None)
            .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(modality = modality.as_str())))]
    pub(crate) async fn stream_modality<F>(
        &self,
        modality: Modality,
        target: &ChatTarget,
        messages: Vec<ChatMessage>,
        on_delta: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        target.validate()?;

        #[cfg(feature = "metrics")]
        counter!("gles_translate.chat_requests_total", "modality" => modality.as_str())
            .increment(1);

        let stream = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                stream = self.chat_stream(target, messages) => stream?,
            },
            None => self.chat_stream(target, messages).await?,
        };

        let text = stream.accumulate(on_delta, cancel).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(chars = text.chars().count(), "stream finished");

        #[cfg(not(any(feature = "tracing", feature = "metrics")))]
        let _ = modality;

        Ok(text)
    }

    /// Translates with the built-in, non-streaming endpoint.
    #[cfg_attr(feature = "tracing", instrument(skip(self, question)))]
    pub async fn translate_builtin(&self, question: &str, target_language: &str) -> Result<String> {
        #[cfg(feature = "metrics")]
        counter!("gles_translate.builtin_requests_total", "kind" => "translate").increment(1);

        let request = HttpRequest::new(self.settings.builtin_translate_url.as_str())
            .get()
            .accept("text/plain")
            .query("question", question)
            .query("type", "text")
            .query("system", translation_system_prompt(target_language))
            .timeout(self.settings.request_timeout);

        let response = self.transport.send_http_request(request).await?;
        Ok(parse_translation_body(&response.text()))
    }

    /// Recognizes image text with the built-in OCR endpoint.
    pub async fn recognize_image_builtin(
        &self,
        image: impl Into<Bytes>,
        file_name: &str,
    ) -> Result<String> {
        self.recognize_builtin(&self.settings.builtin_ocr_url, image.into(), file_name)
            .await
    }

    /// Recognizes speech with the built-in ASR endpoint.
    pub async fn recognize_audio_builtin(
        &self,
        audio: impl Into<Bytes>,
        file_name: &str,
    ) -> Result<String> {
        self.recognize_builtin(&self.settings.builtin_asr_url, audio.into(), file_name)
            .await
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, data), fields(len = data.len())))]
    async fn recognize_builtin(&self, url: &str, data: Bytes, file_name: &str) -> Result<String> {
        #[cfg(feature = "metrics")]
        counter!("gles_translate.builtin_requests_total", "kind" => "recognize").increment(1);

        let request = HttpRequest::new(url)
            .post()
            .multipart_file("file", file_name, data)
            .timeout(self.settings.recognition_timeout);

        let response = self.transport.send_http_request(request).await?;
        match response.body {
            Some(_) => Ok(parse_recognition_body(&response.text())),
            None => Err(Error::Protocol("Missing response body".into())),
        }
    }
}
