//! Fixed instructions sent to translation and recognition models, and the
//! chat messages built from them.

use crate::types::chat::{ChatMessage, ContentPart};

/// Asks for an image's text content and nothing else.
pub const IMAGE_RECOGNITION_PROMPT: &str = "Recognize the text content in this image and return \
only the recognized text, without any explanation.";

/// Asks for an audio clip's spoken content and nothing else.
pub const AUDIO_RECOGNITION_PROMPT: &str = "Recognize the spoken content in this audio file and \
return only the recognized text, without any explanation.";

/// System instruction for translating user input into `language_name`.
///
/// Shared by the streaming chat backend and the built-in endpoint's `system`
/// query parameter.
pub fn translation_system_prompt(language_name: &str) -> String {
    format!(
        "You are a professional translation assistant. Translate the user's text into {language_name}. Requirements:\n\
         1. Preserve the tone and style of the original text\n\
         2. Make the translation accurate, natural and fluent\n\
         3. Translate technical terms with their accurate counterparts\n\
         4. Return only the translation, without any explanation or notes\n\
         5. If the text is already in the target language, return it unchanged"
    )
}

/// System instruction plus the text to translate.
pub fn translation_messages(language_name: &str, source_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(translation_system_prompt(language_name)),
        ChatMessage::user(source_text),
    ]
}

/// One multimodal user message: the recognition instruction and the image as a data URL.
pub fn image_recognition_messages(image_base64: &str, media_type: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user_parts(vec![
        ContentPart::text(IMAGE_RECOGNITION_PROMPT),
        ContentPart::image_base64(media_type, image_base64),
    ])]
}

/// One multimodal user message: the recognition instruction and the audio payload.
pub fn audio_recognition_messages(audio_base64: &str, audio_format: &str) -> Vec<ChatMessage> {
    vec![ChatMessage::user_parts(vec![
        ContentPart::text(AUDIO_RECOGNITION_PROMPT),
        ContentPart::audio_base64(audio_format, audio_base64),
    ])]
}
