use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Captured argument, request body or response body.
/// The engine observes and forwards these, it never interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
    /// Host object the engine cannot render, only measure.
    Opaque { type_name: String, size: usize },
}

impl Payload {
    /// Byte size as a transport would count it.
    pub fn size(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Bytes(bytes) => bytes.len(),
            Payload::Json(value) => value.to_string().len(),
            Payload::Opaque { size, .. } => *size,
        }
    }

    /// Plain strings render raw, everything else renders as compact JSON
    /// or a short descriptor.
    pub fn to_display_string(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Json(Value::String(text)) => text.clone(),
            Payload::Json(value) => value.to_string(),
            Payload::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => format!("<{} bytes>", bytes.len()),
            },
            Payload::Opaque { type_name, size } => format!("[{}: {} bytes]", type_name, size),
        }
    }

    /// False for values a UI would treat as "nothing here": empty text,
    /// empty bytes, JSON null or empty string.
    pub fn is_truthy(&self) -> bool {
        match self {
            Payload::Text(text) => !text.is_empty(),
            Payload::Bytes(bytes) => !bytes.is_empty(),
            Payload::Json(Value::Null) => false,
            Payload::Json(Value::String(text)) => !text.is_empty(),
            Payload::Json(_) | Payload::Opaque { .. } => true,
        }
    }

    /// Response type label in the XHR vocabulary.
    pub fn response_type(&self) -> &'static str {
        match self {
            Payload::Text(_) => "text",
            Payload::Json(_) => "json",
            Payload::Bytes(_) => "arraybuffer",
            Payload::Opaque { .. } => "blob",
        }
    }

    /// Decodes a raw transport body. JSON content types are parsed when valid,
    /// UTF-8 becomes text, anything else stays bytes.
    pub fn from_body(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);

        if is_json {
            if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
                return Payload::Json(value);
            }
        }

        match String::from_utf8(bytes) {
            Ok(text) => Payload::Text(text),
            Err(err) => Payload::Bytes(err.into_bytes()),
        }
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

macro_rules! payload_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::Json(Value::from(value))
                }
            }
        )*
    };
}

payload_from_number!(i32, i64, u32, u64, f64, bool);
