use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Instant;

use crate::kernel::id::ActivityId;
use crate::kernel::payload::Payload;
use crate::kernel::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    #[serde(rename = "xhr")]
    Xhr,
    #[serde(rename = "fetch")]
    Fetch,
    #[serde(rename = "ws")]
    WebSocket,
}

/// Per-request lifecycle.
/// `Opened -> (header set)* -> Sent -> HeadersReceived -> Completed`,
/// with `Errored`/`TimedOut` reachable once the request is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleStage {
    Opened,
    Sent,
    HeadersReceived,
    Completed,
    Errored,
    TimedOut,
}

impl LifecycleStage {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleStage::Completed | LifecycleStage::Errored | LifecycleStage::TimedOut
        )
    }
}

/// Header map with case-insensitive unique names. A repeated name replaces
/// the earlier value and spelling. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => *entry = (name.to_string(), value.to_string()),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Headers {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct HeadersVisitor;

impl<'de> Visitor<'de> for HeadersVisitor {
    type Value = Headers;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of header names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
        let mut headers = Headers::new();
        while let Some((name, value)) = access.next_entry::<String, String>()? {
            headers.insert(&name, &value);
        }
        Ok(headers)
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(HeadersVisitor)
    }
}

/// One HTTP exchange. Fields fill in as lifecycle events arrive and are never
/// cleared, so a later snapshot is always a superset of an earlier one.
/// A `None` field means "not known yet", not "never".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub kind: Option<NetworkType>,
    pub stage: LifecycleStage,
    pub method: Option<String>,
    pub url: Option<String>,
    pub request_headers: Headers,
    pub body: Option<Payload>,
    pub response_content_type: Option<String>,
    pub response_size: Option<u64>,
    pub response_headers: Option<String>,
    pub status: Option<u16>,
    /// Milliseconds from open to completion.
    pub duration: Option<u64>,
    pub response: Option<Payload>,
    #[serde(rename = "responseURL")]
    pub response_url: Option<String>,
    pub response_type: Option<String>,
    /// Timeout the caller configured, in milliseconds.
    pub timeout: Option<u64>,
    pub error: Option<String>,
    pub opened_at: Option<Timestamp>,
    #[serde(skip)]
    pub(crate) started: Option<Instant>,
}

impl NetworkRecord {
    pub(crate) fn blank(id: ActivityId, stage: LifecycleStage) -> Self {
        Self {
            id,
            kind: None,
            stage,
            method: None,
            url: None,
            request_headers: Headers::new(),
            body: None,
            response_content_type: None,
            response_size: None,
            response_headers: None,
            status: None,
            duration: None,
            response: None,
            response_url: None,
            response_type: None,
            timeout: None,
            error: None,
            opened_at: None,
            started: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketMessage {
    pub direction: Direction,
    pub data: Payload,
    pub at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocketState {
    Connecting,
    Open,
    /// Close requested by the client, handshake still running.
    Closing,
    Closed,
    Errored,
}

impl SocketState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SocketState::Closed | SocketState::Errored)
    }
}

/// One WebSocket connection and its append-only message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketRecord {
    pub id: ActivityId,
    pub url: Option<String>,
    pub protocols: Vec<String>,
    pub state: SocketState,
    pub messages: Vec<SocketMessage>,
    pub close_code: Option<u16>,
    pub close_reason: Option<String>,
    pub error: Option<String>,
    pub opened_at: Option<Timestamp>,
}

impl WebSocketRecord {
    pub(crate) fn blank(id: ActivityId) -> Self {
        Self {
            id,
            url: None,
            protocols: Vec::new(),
            state: SocketState::Connecting,
            messages: Vec::new(),
            close_code: None,
            close_reason: None,
            error: None,
            opened_at: None,
        }
    }
}

/// Lifecycle events of a WebSocket connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SocketEvent {
    Connect { url: String, protocols: Vec<String> },
    Open,
    Message { direction: Direction, data: Payload },
    /// Client asked to close. Traffic may still arrive until `Close`.
    Closing { code: Option<u16>, reason: Option<String> },
    Close { code: Option<u16>, reason: Option<String> },
    Error { reason: String },
}
