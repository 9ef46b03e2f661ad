use std::sync::Arc;

use super::interceptor::NetworkInterceptor;
use super::types::{Direction, SocketEvent};
use crate::kernel::id::{generate_id, ActivityId};
use crate::kernel::payload::Payload;

/// The host's WebSocket object.
pub trait SocketTransport {
    type Error;

    fn send(&mut self, data: &Payload) -> Result<(), Self::Error>;
    fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<(), Self::Error>;
}

/// Instrumented WebSocket connection. Outbound calls are reported then
/// delegated; inbound events are reported by the host through the
/// `*_received`/`opened`/`closed`/`failed` hooks.
pub struct WebSocket<T> {
    inner: T,
    interceptor: Arc<NetworkInterceptor>,
    id: ActivityId,
}

impl<T: SocketTransport> WebSocket<T> {
    pub fn connect(inner: T, url: &str, protocols: &[&str]) -> Self {
        Self::connect_with_interceptor(inner, url, protocols, NetworkInterceptor::instance())
    }

    pub fn connect_with_interceptor(
        inner: T,
        url: &str,
        protocols: &[&str],
        interceptor: Arc<NetworkInterceptor>,
    ) -> Self {
        let id = generate_id();
        interceptor.on_socket(
            &id,
            SocketEvent::Connect {
                url: url.to_string(),
                protocols: protocols.iter().map(|p| p.to_string()).collect(),
            },
        );
        Self { inner, interceptor, id }
    }

    pub fn id(&self) -> &ActivityId {
        &self.id
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn send(&mut self, data: Payload) -> Result<(), T::Error> {
        self.interceptor.on_socket(
            &self.id,
            SocketEvent::Message {
                direction: Direction::Sent,
                data: data.clone(),
            },
        );
        self.inner.send(&data)
    }

    /// Starts the closing handshake. The record stays open to traffic until
    /// the host reports `closed`.
    pub fn close(&mut self, code: Option<u16>, reason: Option<&str>) -> Result<(), T::Error> {
        self.interceptor.on_socket(
            &self.id,
            SocketEvent::Closing {
                code,
                reason: reason.map(str::to_string),
            },
        );
        self.inner.close(code, reason)
    }

    pub fn opened(&self) {
        self.interceptor.on_socket(&self.id, SocketEvent::Open);
    }

    pub fn message_received(&self, data: Payload) {
        self.interceptor.on_socket(
            &self.id,
            SocketEvent::Message {
                direction: Direction::Received,
                data,
            },
        );
    }

    /// Connection fully closed, whoever started it. The code and reason
    /// reported here replace the ones requested by `close`.
    pub fn closed(&self, code: Option<u16>, reason: Option<&str>) {
        self.interceptor.on_socket(
            &self.id,
            SocketEvent::Close {
                code,
                reason: reason.map(str::to_string),
            },
        );
    }

    pub fn failed(&self, reason: &str) {
        self.interceptor.on_socket(
            &self.id,
            SocketEvent::Error {
                reason: reason.to_string(),
            },
        );
    }
}
