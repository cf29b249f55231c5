//! Reduction of built-in endpoint responses to plain text.
//!
//! The built-in endpoints answer with loosely shaped JSON (or plain text), so
//! these functions look through [`serde_json::Value`]s instead of typed
//! structs and fall back to the raw body when nothing matches.

use serde_json::{Map, Value};

const SUCCESS_CODE: &str = "200";

/// Text of a built-in translation response.
///
/// A body that looks like a JSON object yields its `result` field, then its
/// `text` field; everything else, including unparseable JSON, is returned
/// trimmed as-is.
pub fn parse_translation_body(body: &str) -> String {
    let body = body.trim();
    if !(body.starts_with('{') && body.ends_with('}')) {
        return body.to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(root)) => field_text(&root, "result")
            .or_else(|| field_text(&root, "text"))
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

/// Text of a built-in OCR/ASR response.
///
/// Candidates, first non-blank wins: `data.ParsedText`, `data.TextLine[]`,
/// `ParsedText`, `TextLine[]`, `text`, `result`. Failing those, a non-success
/// `code` with a non-blank `msg` yields the message; otherwise the trimmed
/// body is returned.
pub fn parse_recognition_body(body: &str) -> String {
    let body = body.trim();
    let root = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(root)) => root,
        _ => return body.to_string(),
    };

    if let Some(Value::Object(data)) = root.get("data") {
        if let Some(text) = parsed_text(data).or_else(|| text_lines(data)) {
            return text;
        }
    }

    let found = parsed_text(&root)
        .or_else(|| text_lines(&root))
        .or_else(|| normalized_field(&root, "text"))
        .or_else(|| normalized_field(&root, "result"));
    if let Some(text) = found {
        return text;
    }

    let code = field_text(&root, "code");
    let msg = field_text(&root, "msg").map(|m| m.trim().to_string());
    match (code, msg) {
        (Some(code), Some(msg)) if code != SUCCESS_CODE && !msg.is_empty() => msg,
        _ => body.to_string(),
    }
}

fn parsed_text(obj: &Map<String, Value>) -> Option<String> {
    normalized_field(obj, "ParsedText")
}

fn text_lines(obj: &Map<String, Value>) -> Option<String> {
    let Some(Value::Array(lines)) = obj.get("TextLine") else {
        return None;
    };
    let joined = lines
        .iter()
        .map(|line| normalize_newlines(&primitive_text(line).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join("\n");
    non_blank(joined.trim())
}

fn normalized_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    field_text(obj, key).and_then(|text| non_blank(normalize_newlines(&text).trim()))
}

fn field_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(primitive_text)
}

/// Strings as-is, numbers and booleans in their JSON spelling.
fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
