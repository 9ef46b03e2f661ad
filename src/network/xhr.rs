use std::sync::Arc;
use std::time::Instant;

use super::interceptor::NetworkInterceptor;
use super::registry::{FailureInfo, ResponseInfo};
use super::types::NetworkType;
use crate::kernel::id::{generate_id, ActivityId};
use crate::kernel::payload::Payload;

/// The host's XHR-style request object being wrapped.
pub trait XhrTransport {
    type Error;

    fn open(&mut self, method: &str, url: &str) -> Result<(), Self::Error>;
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), Self::Error>;
    fn send(&mut self, body: Option<&Payload>) -> Result<(), Self::Error>;
}

/// Progress reported asynchronously by the host transport.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadyState {
    HeadersReceived {
        content_type: Option<String>,
        size: Option<u64>,
        headers: String,
    },
    Done {
        status: u16,
        response: Option<Payload>,
        response_url: Option<String>,
        response_type: Option<String>,
    },
    Error(String),
    Timeout,
}

/// Instrumented XHR-style request.
///
/// Each call is reported to the interceptor first and then delegated to the
/// wrapped transport, whose result comes back unchanged.
pub struct XhrRequest<T> {
    inner: T,
    interceptor: Arc<NetworkInterceptor>,
    id: Option<ActivityId>,
    timeout: Option<u64>,
    started: Option<Instant>,
}

impl<T: XhrTransport> XhrRequest<T> {
    pub fn new(inner: T) -> Self {
        Self::with_interceptor(inner, NetworkInterceptor::instance())
    }

    pub fn with_interceptor(inner: T, interceptor: Arc<NetworkInterceptor>) -> Self {
        Self {
            inner,
            interceptor,
            id: None,
            timeout: None,
            started: None,
        }
    }

    /// Assigned by `open`.
    pub fn id(&self) -> Option<&ActivityId> {
        self.id.as_ref()
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Milliseconds. Recorded on completion; the transport enforces it.
    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.timeout = Some(timeout_ms);
    }

    pub fn open(&mut self, method: &str, url: &str) -> Result<(), T::Error> {
        let id = generate_id();
        self.interceptor.on_open(&id, NetworkType::Xhr, method, url);
        self.id = Some(id);
        self.started = Some(Instant::now());
        self.inner.open(method, url)
    }

    pub fn set_request_header(&mut self, name: &str, value: &str) -> Result<(), T::Error> {
        if let Some(id) = &self.id {
            self.interceptor.on_request_header(id, name, value);
        }
        self.inner.set_request_header(name, value)
    }

    pub fn send(&mut self, body: Option<Payload>) -> Result<(), T::Error> {
        if let Some(id) = &self.id {
            self.interceptor.on_send(id, body.as_ref());
        }
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
        self.inner.send(body.as_ref())
    }

    /// Entry point for the host transport's progress events.
    pub fn ready_state_changed(&mut self, state: ReadyState) {
        let Some(id) = &self.id else {
            return;
        };
        let duration = self.started.map(|at| at.elapsed().as_millis() as u64);

        match state {
            ReadyState::HeadersReceived { content_type, size, headers } => {
                self.interceptor
                    .on_headers_received(id, content_type.as_deref(), size, &headers);
            }
            ReadyState::Done { status, response, response_url, response_type } => {
                let info = ResponseInfo {
                    status: Some(status),
                    timeout: self.timeout,
                    duration,
                    response,
                    response_url,
                    response_type,
                };
                self.interceptor.on_response(id, info);
            }
            ReadyState::Error(reason) => {
                let failure = FailureInfo {
                    reason,
                    timed_out: false,
                    timeout: self.timeout,
                    duration,
                };
                self.interceptor.on_error(id, failure);
            }
            ReadyState::Timeout => {
                let failure = FailureInfo {
                    reason: "request timed out".to_string(),
                    timed_out: true,
                    timeout: self.timeout,
                    duration,
                };
                self.interceptor.on_error(id, failure);
            }
        }
    }
}
