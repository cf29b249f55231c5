//! Persisted application state and the plain functions that update it.
//!
//! The whole state is one JSON document (camelCase keys). It is read in full
//! at startup and written in full after every change; see [`crate::store`].

use chrono::{Local, Utc};
use gles_translate_macros::FromBytes;
use serde::{Deserialize, Serialize};

use crate::types::ChatTarget;
use crate::Result;

const HISTORY_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const CUSTOM_LANGUAGE_PREFIX: &str = "custom_";

/// Languages offered before any custom ones, as `(code, display name)`.
pub const PREDEFINED_LANGUAGES: [(&str, &str); 10] = [
    ("zh", "Chinese"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("pt", "Portuguese"),
];

#[derive(Serialize, Deserialize, FromBytes, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    /// Newest first.
    pub translation_history: Vec<TranslationHistoryItem>,
    pub custom_languages: Vec<CustomLanguage>,
    pub selected_language: SelectedLanguage,
    pub ai_config_enabled: bool,
    pub ai_config: AiConfig,
    pub multi_modal_enabled: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslationHistoryItem {
    /// Creation time in epoch milliseconds, unique within one history.
    pub id: i64,
    pub source_text: String,
    pub translated_text: String,
    /// Display name of the language translated into.
    pub target_language: String,
    /// Local time, `yyyy/MM/dd HH:mm:ss`.
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CustomLanguage {
    pub code: String,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SelectedLanguage {
    pub code: String,
    pub name: String,
}

impl SelectedLanguage {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Default for SelectedLanguage {
    fn default() -> Self {
        Self::new("en", "English")
    }
}

impl From<&CustomLanguage> for SelectedLanguage {
    fn from(language: &CustomLanguage) -> Self {
        Self::new(language.code.as_str(), language.name.as_str())
    }
}

/// Settings of the user's own OpenAI-compatible provider.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// Model used for image and audio recognition.
    pub multi_modal_model: String,
}

impl AiConfig {
    /// Target for text translation.
    pub fn text_target(&self) -> ChatTarget {
        ChatTarget::new(
            self.base_url.as_str(),
            self.api_key.as_str(),
            self.model.as_str(),
        )
    }

    /// Target for image/audio recognition.
    pub fn multi_modal_target(&self) -> ChatTarget {
        ChatTarget::new(
            self.base_url.as_str(),
            self.api_key.as_str(),
            self.multi_modal_model.as_str(),
        )
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            translation_history: Vec::new(),
            custom_languages: Vec::new(),
            selected_language: SelectedLanguage::default(),
            ai_config_enabled: false,
            ai_config: AiConfig::default(),
            multi_modal_enabled: false,
        }
    }
}

impl AppState {
    /// Prepends a history entry stamped with the current time.
    pub fn add_history(
        &mut self,
        source_text: &str,
        translated_text: &str,
        target_language: &str,
    ) -> &TranslationHistoryItem {
        let mut id = Utc::now().timestamp_millis();
        while self.translation_history.iter().any(|item| item.id == id) {
            id += 1;
        }

        let item = TranslationHistoryItem {
            id,
            source_text: source_text.to_string(),
            translated_text: translated_text.to_string(),
            target_language: target_language.to_string(),
            timestamp: Local::now().format(HISTORY_TIMESTAMP_FORMAT).to_string(),
        };
        self.translation_history.insert(0, item);
        &self.translation_history[0]
    }

    /// Returns whether an entry was removed.
    pub fn delete_history_item(&mut self, id: i64) -> bool {
        let before = self.translation_history.len();
        self.translation_history.retain(|item| item.id != id);
        self.translation_history.len() != before
    }

    pub fn clear_history(&mut self) {
        self.translation_history.clear();
    }

    pub fn select_language(&mut self, language: SelectedLanguage) {
        self.selected_language = language;
    }

    /// Appends a language with a fresh `custom_<millis>` code.
    pub fn add_custom_language(&mut self, name: &str) -> CustomLanguage {
        let mut millis = Utc::now().timestamp_millis();
        let code = loop {
            let code = format!("{}{}", CUSTOM_LANGUAGE_PREFIX, millis);
            if !self.custom_languages.iter().any(|l| l.code == code) {
                break code;
            }
            millis += 1;
        };

        let language = CustomLanguage {
            code,
            name: name.to_string(),
        };
        self.custom_languages.push(language.clone());
        language
    }

    /// Returns whether a language was removed.
    pub fn delete_custom_language(&mut self, code: &str) -> bool {
        let before = self.custom_languages.len();
        self.custom_languages.retain(|l| l.code != code);
        self.custom_languages.len() != before
    }

    /// Renames a custom language. Returns whether one matched `code`.
    pub fn edit_custom_language(&mut self, code: &str, name: &str) -> bool {
        match self.custom_languages.iter_mut().find(|l| l.code == code) {
            Some(language) => {
                language.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Turning the custom provider off also turns multimodal recognition off.
    pub fn set_ai_config_enabled(&mut self, enabled: bool) {
        self.ai_config_enabled = enabled;
        if !enabled {
            self.multi_modal_enabled = false;
        }
    }

    pub fn set_ai_config(&mut self, config: AiConfig) {
        self.ai_config = config;
    }

    pub fn set_multi_modal_enabled(&mut self, enabled: bool) {
        self.multi_modal_enabled = enabled;
    }

    /// Whether recognition goes through the custom multimodal model.
    pub fn uses_multi_modal(&self) -> bool {
        self.ai_config_enabled && self.multi_modal_enabled
    }

    /// Predefined languages followed by custom ones.
    pub fn available_languages(&self) -> Vec<SelectedLanguage> {
        PREDEFINED_LANGUAGES
            .iter()
            .map(|(code, name)| SelectedLanguage::new(*code, *name))
            .chain(self.custom_languages.iter().map(SelectedLanguage::from))
            .collect()
    }
}

/// Export format wrapping a full [`AppState`].
#[derive(Serialize, Deserialize, FromBytes, Debug, Clone, PartialEq)]
pub struct TranslationBackup {
    pub version: String,
    pub timestamp: String,
    pub data: AppState,
}

impl TranslationBackup {
    pub fn new(data: AppState) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Local::now().to_rfc3339(),
            data,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
