use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;

use super::types::{
    Direction, LifecycleStage, NetworkRecord, NetworkType, SocketEvent, SocketMessage, SocketState,
    WebSocketRecord,
};
use crate::kernel::id::ActivityId;
use crate::kernel::payload::Payload;
use crate::kernel::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("request {0} already reached a terminal stage")]
    Terminal(ActivityId),
    #[error("socket {0} is already closed")]
    SocketClosed(ActivityId),
}

/// Completion data reported by the host transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseInfo {
    pub status: Option<u16>,
    pub timeout: Option<u64>,
    /// Milliseconds since open. Computed from the open instant when absent.
    pub duration: Option<u64>,
    pub response: Option<Payload>,
    pub response_url: Option<String>,
    pub response_type: Option<String>,
}

/// Transport failure, reported instead of a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureInfo {
    pub reason: String,
    pub timed_out: bool,
    pub timeout: Option<u64>,
    pub duration: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HttpUpdate {
    Open {
        kind: NetworkType,
        method: String,
        url: String,
    },
    RequestHeader {
        name: String,
        value: String,
    },
    Send {
        body: Option<Payload>,
    },
    HeadersReceived {
        content_type: Option<String>,
        size: Option<u64>,
        headers: String,
    },
    Response(ResponseInfo),
    Failure(FailureInfo),
}

impl HttpUpdate {
    fn stage(&self) -> LifecycleStage {
        match self {
            HttpUpdate::Open { .. } | HttpUpdate::RequestHeader { .. } => LifecycleStage::Opened,
            HttpUpdate::Send { .. } => LifecycleStage::Sent,
            HttpUpdate::HeadersReceived { .. } => LifecycleStage::HeadersReceived,
            HttpUpdate::Response(_) => LifecycleStage::Completed,
            HttpUpdate::Failure(failure) if failure.timed_out => LifecycleStage::TimedOut,
            HttpUpdate::Failure(_) => LifecycleStage::Errored,
        }
    }
}

/// In-memory map from activity id to its accumulating record.
///
/// Records are created on the first event seen for an id, whatever that event
/// is, and only removed by `clear`. Updates for different ids never touch each
/// other. Optional values arriving as `None` never erase what is already known.
#[derive(Debug, Default)]
pub struct LifecycleRegistry {
    requests: HashMap<ActivityId, NetworkRecord>,
    request_order: Vec<ActivityId>,
    sockets: HashMap<ActivityId, WebSocketRecord>,
    socket_order: Vec<ActivityId>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one lifecycle event and returns the updated snapshot.
    /// Fails only when the record is already terminal.
    pub fn apply(&mut self, id: &ActivityId, update: HttpUpdate) -> Result<NetworkRecord, RegistryError> {
        let stage = update.stage();

        if !self.requests.contains_key(id) {
            self.request_order.push(id.clone());
        }
        let record = self
            .requests
            .entry(id.clone())
            .or_insert_with(|| NetworkRecord::blank(id.clone(), stage));

        if record.is_terminal() {
            return Err(RegistryError::Terminal(id.clone()));
        }

        match update {
            HttpUpdate::Open { kind, method, url } => {
                record.kind = Some(kind);
                record.method = Some(method);
                record.url = Some(url);
                if record.opened_at.is_none() {
                    record.opened_at = Some(Timestamp::now());
                    record.started = Some(Instant::now());
                }
            }
            HttpUpdate::RequestHeader { name, value } => {
                // Accepted at any stage, last write wins
                record.request_headers.insert(&name, &value);
            }
            HttpUpdate::Send { body } => {
                if body.is_some() {
                    record.body = body;
                }
                if record.started.is_none() {
                    record.started = Some(Instant::now());
                }
            }
            HttpUpdate::HeadersReceived { content_type, size, headers } => {
                if content_type.is_some() {
                    record.response_content_type = content_type;
                }
                if size.is_some() {
                    record.response_size = size;
                }
                record.response_headers = Some(headers);
            }
            HttpUpdate::Response(info) => {
                let duration = info.duration.or_else(|| elapsed_ms(record.started));
                set_if_some(&mut record.status, info.status);
                set_if_some(&mut record.timeout, info.timeout);
                set_if_some(&mut record.duration, duration);
                set_if_some(&mut record.response, info.response);
                set_if_some(&mut record.response_url, info.response_url);
                set_if_some(&mut record.response_type, info.response_type);
            }
            HttpUpdate::Failure(failure) => {
                let duration = failure.duration.or_else(|| elapsed_ms(record.started));
                set_if_some(&mut record.timeout, failure.timeout);
                set_if_some(&mut record.duration, duration);
                record.error = Some(failure.reason);
            }
        }

        // Stage only moves forward
        if stage > record.stage {
            record.stage = stage;
        }

        Ok(record.clone())
    }

    pub fn apply_socket(&mut self, id: &ActivityId, event: SocketEvent) -> Result<WebSocketRecord, RegistryError> {
        if !self.sockets.contains_key(id) {
            self.socket_order.push(id.clone());
        }
        let record = self
            .sockets
            .entry(id.clone())
            .or_insert_with(|| WebSocketRecord::blank(id.clone()));

        if record.state.is_terminal() {
            return Err(RegistryError::SocketClosed(id.clone()));
        }

        match event {
            SocketEvent::Connect { url, protocols } => {
                record.url = Some(url);
                record.protocols = protocols;
                if record.opened_at.is_none() {
                    record.opened_at = Some(Timestamp::now());
                }
            }
            SocketEvent::Open => {
                // Never reopens a socket that is already closing
                if record.state == SocketState::Connecting {
                    record.state = SocketState::Open;
                }
            }
            SocketEvent::Message { direction, data } => {
                if direction == Direction::Received && record.state == SocketState::Connecting {
                    record.state = SocketState::Open;
                }
                record.messages.push(SocketMessage {
                    direction,
                    data,
                    at: Timestamp::now(),
                });
            }
            SocketEvent::Closing { code, reason } => {
                set_if_some(&mut record.close_code, code);
                set_if_some(&mut record.close_reason, reason);
                record.state = SocketState::Closing;
            }
            SocketEvent::Close { code, reason } => {
                set_if_some(&mut record.close_code, code);
                set_if_some(&mut record.close_reason, reason);
                record.state = SocketState::Closed;
            }
            SocketEvent::Error { reason } => {
                record.error = Some(reason);
                record.state = SocketState::Errored;
            }
        }

        Ok(record.clone())
    }

    pub fn request(&self, id: &ActivityId) -> Option<&NetworkRecord> {
        self.requests.get(id)
    }

    /// Requests in the order they were first seen.
    pub fn requests(&self) -> impl Iterator<Item = &NetworkRecord> {
        self.request_order.iter().filter_map(|id| self.requests.get(id))
    }

    pub fn socket(&self, id: &ActivityId) -> Option<&WebSocketRecord> {
        self.sockets.get(id)
    }

    pub fn sockets(&self) -> impl Iterator<Item = &WebSocketRecord> {
        self.socket_order.iter().filter_map(|id| self.sockets.get(id))
    }

    pub fn len(&self) -> usize {
        self.requests.len() + self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.request_order.clear();
        self.sockets.clear();
        self.socket_order.clear();
    }
}

fn set_if_some<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn elapsed_ms(started: Option<Instant>) -> Option<u64> {
    started.map(|at| at.elapsed().as_millis() as u64)
}
