//! Presentation helpers for UI adapters.
//!
//! None of these fail: anything that cannot be parsed or rendered degrades to
//! truncated raw text.

pub mod curl;
pub mod sections;

pub use curl::{convert_to_curl, curl_for};
pub use sections::{http_sections, query_params, socket_sections, NetworkSections};

use serde_json::Value;

use crate::console::types::LogKind;
use crate::kernel::payload::Payload;

pub const DEFAULT_CHAR_LIMIT: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewLine {
    Leading,
    Trailing,
    None,
}

/// Cuts `text` to `limit` characters and says so.
pub fn limit_text(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}\n---LIMITED TO {} CHARACTERS---", &text[..cut], limit),
        None => text.to_string(),
    }
}

/// Strings render raw, other payloads as JSON. An absent value renders as the
/// JSON empty string.
pub fn limit_char(value: Option<&Payload>, limit: usize) -> String {
    let rendered = match value {
        Some(payload) => payload.to_display_string(),
        None => "\"\"".to_string(),
    };
    limit_text(&rendered, limit)
}

pub fn key_value_to_string(key: &str, value: Option<&Payload>, new_line: NewLine) -> String {
    let value = limit_char(value, DEFAULT_CHAR_LIMIT);
    match new_line {
        NewLine::Leading => format!("\n{}: {}", key, value),
        NewLine::Trailing => format!("{}: {}\n", key, value),
        NewLine::None => format!("{}: {}", key, value),
    }
}

pub fn format_request_method(method: Option<&str>) -> String {
    method.unwrap_or("GET").to_string()
}

/// A zero duration still reads as pending.
pub fn format_request_duration(duration: Option<u64>) -> String {
    match duration {
        Some(ms) if ms > 0 => format!("{}ms", ms),
        _ => "pending".to_string(),
    }
}

pub fn format_request_status_code(status: Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "pending".to_string(),
    }
}

/// `LOG: first, second`
pub fn format_log_message(kind: LogKind, values: &[Payload]) -> String {
    let message = values
        .iter()
        .map(|value| limit_char(Some(value), DEFAULT_CHAR_LIMIT))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}: {}", kind.as_str().to_uppercase(), message)
}

/// Parses text payloads as JSON and pretty-prints when asked. Text that is
/// not JSON comes back truncated but otherwise untouched.
pub fn beautify(data: Option<&Payload>, beautified: bool) -> String {
    let parsed: Option<Value> = match data {
        Some(Payload::Text(text)) => serde_json::from_str(text).ok(),
        Some(Payload::Json(value)) => Some(value.clone()),
        _ => None,
    };

    match parsed {
        Some(value) if beautified => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| limit_char(data, DEFAULT_CHAR_LIMIT)),
        Some(value) => limit_char(Some(&Payload::Json(value)), DEFAULT_CHAR_LIMIT),
        None => limit_char(data, DEFAULT_CHAR_LIMIT),
    }
}
