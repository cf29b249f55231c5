//! Normalization of user-supplied provider URLs.

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Turns a provider base URL into its absolute chat-completions endpoint.
///
/// Surrounding whitespace and trailing slashes are removed first, then:
/// - a URL already ending in `/chat/completions` is used as-is;
/// - a URL ending in `/v1` gets `/chat/completions` appended;
/// - anything else gets `/v1/chat/completions` appended.
pub fn chat_completions_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with(CHAT_COMPLETIONS_PATH) {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{}{}", trimmed, CHAT_COMPLETIONS_PATH)
    } else {
        format!("{}/v1{}", trimmed, CHAT_COMPLETIONS_PATH)
    }
}
