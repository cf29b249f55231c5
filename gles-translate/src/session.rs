//! The application layer: owns the state and its store, routes each request
//! to the built-in or the user-configured backend, and records history.

use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::prompt::{audio_recognition_messages, image_recognition_messages, translation_messages};
use crate::state::{AiConfig, AppState, CustomLanguage, SelectedLanguage, TranslationBackup};
use crate::store::StateStore;
use crate::types::Modality;
use crate::{Error, Result, TranslateClient};

const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/jpeg";
const DEFAULT_IMAGE_FILE_NAME: &str = "image.jpg";
const DEFAULT_AUDIO_MEDIA_TYPE: &str = "audio/mpeg";
const DEFAULT_AUDIO_FILE_NAME: &str = "audio.mp3";
const DEFAULT_AUDIO_FORMAT: &str = "mpeg";

/// A user's translation session.
///
/// Holds the loaded [`AppState`]; every mutating call updates it and then
/// writes the whole state back through the [`StateStore`].
pub struct TranslatorSession<S: StateStore> {
    client: TranslateClient,
    store: S,
    state: AppState,
}

impl<S: StateStore> TranslatorSession<S> {
    /// Loads the state from `store` and starts a session.
    pub async fn open(client: TranslateClient, store: S) -> Result<Self> {
        let state = store.load().await?;
        Ok(Self {
            client,
            store,
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn client(&self) -> &TranslateClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn persist(&self) -> Result<()> {
        self.store.save(&self.state).await
    }

    /// Translates `source_text` into the selected language.
    ///
    /// With the custom provider enabled the answer is streamed and `on_delta`
    /// sees each piece; otherwise the built-in endpoint answers at once and
    /// `on_delta` sees the whole (non-empty) result. A successful translation
    /// is added to the history.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(ai = self.state.ai_config_enabled)))]
    pub async fn translate<F>(
        &mut self,
        source_text: &str,
        cancel: &CancellationToken,
        mut on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let language = self.state.selected_language.name.clone();

        let translated = if self.state.ai_config_enabled {
            let target = self.state.ai_config.text_target();
            target.validate()?;
            let messages = translation_messages(&language, source_text);
            self.client
                .stream_modality(Modality::Text, &target, messages, on_delta, Some(cancel))
                .await?
        } else {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                result = self.client.translate_builtin(source_text, &language) => result?,
            };
            if !result.is_empty() {
                on_delta(&result);
            }
            result
        };

        self.state.add_history(source_text, &translated, &language);
        self.persist().await?;
        Ok(translated)
    }

    /// Extracts the text of an image.
    ///
    /// `media_type` defaults to `image/jpeg` and `file_name` to `image.jpg`.
    /// The custom multimodal model is used when both the custom provider and
    /// multimodal recognition are enabled; otherwise the built-in OCR endpoint.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(len = image.len())))]
    pub async fn recognize_image<F>(
        &self,
        image: &[u8],
        media_type: Option<&str>,
        file_name: Option<&str>,
        cancel: &CancellationToken,
        on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let media_type = media_type.unwrap_or(DEFAULT_IMAGE_MEDIA_TYPE);
        let file_name = file_name.unwrap_or(DEFAULT_IMAGE_FILE_NAME);

        if self.state.uses_multi_modal() {
            let target = self.state.ai_config.multi_modal_target();
            target.validate()?;
            let encoded = general_purpose::STANDARD.encode(image);
            let messages = image_recognition_messages(&encoded, media_type);
            self.client
                .stream_modality(Modality::Image, &target, messages, on_delta, Some(cancel))
                .await
        } else {
            let data = Bytes::copy_from_slice(image);
            let recognition = self.client.recognize_image_builtin(data, file_name);
            one_shot(recognition, cancel, on_delta).await
        }
    }

    /// Transcribes an audio clip.
    ///
    /// `media_type` defaults to `audio/mpeg` and `file_name` to `audio.mp3`;
    /// the audio format sent to the multimodal model is the media type's
    /// subtype (`mpeg` when there is none).
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(len = audio.len())))]
    pub async fn recognize_audio<F>(
        &self,
        audio: &[u8],
        media_type: Option<&str>,
        file_name: Option<&str>,
        cancel: &CancellationToken,
        on_delta: F,
    ) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let media_type = media_type.unwrap_or(DEFAULT_AUDIO_MEDIA_TYPE);
        let file_name = file_name.unwrap_or(DEFAULT_AUDIO_FILE_NAME);

        if self.state.uses_multi_modal() {
            let target = self.state.ai_config.multi_modal_target();
            target.validate()?;
            let format = audio_format(media_type);
            let encoded = general_purpose::STANDARD.encode(audio);
            let messages = audio_recognition_messages(&encoded, format);
            self.client
                .stream_modality(Modality::Audio, &target, messages, on_delta, Some(cancel))
                .await
        } else {
            let data = Bytes::copy_from_slice(audio);
            let recognition = self.client.recognize_audio_builtin(data, file_name);
            one_shot(recognition, cancel, on_delta).await
        }
    }

    pub async fn select_language(&mut self, language: SelectedLanguage) -> Result<()> {
        self.state.select_language(language);
        self.persist().await
    }

    pub async fn add_custom_language(&mut self, name: &str) -> Result<CustomLanguage> {
        let language = self.state.add_custom_language(name);
        self.persist().await?;
        Ok(language)
    }

    pub async fn delete_custom_language(&mut self, code: &str) -> Result<bool> {
        let removed = self.state.delete_custom_language(code);
        self.persist().await?;
        Ok(removed)
    }

    pub async fn edit_custom_language(&mut self, code: &str, name: &str) -> Result<bool> {
        let edited = self.state.edit_custom_language(code, name);
        self.persist().await?;
        Ok(edited)
    }

    pub async fn set_ai_config_enabled(&mut self, enabled: bool) -> Result<()> {
        self.state.set_ai_config_enabled(enabled);
        self.persist().await
    }

    pub async fn set_ai_config(&mut self, config: AiConfig) -> Result<()> {
        self.state.set_ai_config(config);
        self.persist().await
    }

    pub async fn set_multi_modal_enabled(&mut self, enabled: bool) -> Result<()> {
        self.state.set_multi_modal_enabled(enabled);
        self.persist().await
    }

    pub async fn delete_history_item(&mut self, id: i64) -> Result<bool> {
        let removed = self.state.delete_history_item(id);
        self.persist().await?;
        Ok(removed)
    }

    pub async fn clear_history(&mut self) -> Result<()> {
        self.state.clear_history();
        self.persist().await
    }

    /// The current state wrapped in a [`TranslationBackup`], as JSON.
    pub fn export_backup(&self) -> Result<String> {
        TranslationBackup::new(self.state.clone()).to_json()
    }

    /// Replaces the whole state with the one inside a backup document.
    pub async fn import_backup(&mut self, backup: impl Into<Bytes>) -> Result<()> {
        let backup = TranslationBackup::from_bytes(backup.into())?;
        self.state = backup.data;
        self.persist().await
    }
}

/// Runs a non-streaming recognition, reporting its result as a single delta.
async fn one_shot<Fut, F>(recognition: Fut, cancel: &CancellationToken, mut on_delta: F) -> Result<String>
where
    Fut: std::future::Future<Output = Result<String>>,
    F: FnMut(&str) + Send,
{
    let text = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        text = recognition => text?,
    };
    if !text.is_empty() {
        on_delta(&text);
    }
    Ok(text)
}

/// `audio/wav` -> `wav`; no subtype -> `mpeg`.
fn audio_format(media_type: &str) -> &str {
    media_type
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or(DEFAULT_AUDIO_FORMAT)
}
