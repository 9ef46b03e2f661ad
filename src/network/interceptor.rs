use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::debug;

use super::registry::{FailureInfo, HttpUpdate, LifecycleRegistry, ResponseInfo};
use super::types::{LifecycleStage, NetworkRecord, NetworkType, SocketEvent, WebSocketRecord};
use crate::kernel::id::ActivityId;
use crate::kernel::patch::{notify, InterceptionClass, Patch, ReentryGuard};
use crate::kernel::payload::Payload;

pub type OpenCallback = Arc<dyn Fn(&ActivityId, NetworkType, &str, &str) + Send + Sync>;
pub type RequestHeaderCallback = Arc<dyn Fn(&ActivityId, &str, &str) + Send + Sync>;
pub type SendCallback = Arc<dyn Fn(&ActivityId, Option<&Payload>) + Send + Sync>;
pub type HeadersReceivedCallback = Arc<dyn Fn(&ActivityId, Option<&str>, Option<u64>, &str) + Send + Sync>;
pub type ResponseCallback = Arc<dyn Fn(&ActivityId, &ResponseInfo) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&ActivityId, &FailureInfo) + Send + Sync>;
pub type SocketCallback = Arc<dyn Fn(&ActivityId, &SocketEvent) + Send + Sync>;

/// One optional handler per lifecycle stage.
#[derive(Clone, Default)]
pub struct NetworkCallbacks {
    pub on_open: Option<OpenCallback>,
    pub on_request_header: Option<RequestHeaderCallback>,
    pub on_send: Option<SendCallback>,
    pub on_headers_received: Option<HeadersReceivedCallback>,
    pub on_response: Option<ResponseCallback>,
    pub on_error: Option<ErrorCallback>,
    pub on_socket: Option<SocketCallback>,
}

impl NetworkCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, NetworkType, &str, &str) + Send + Sync + 'static,
    {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_request_header<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, &str, &str) + Send + Sync + 'static,
    {
        self.on_request_header = Some(Arc::new(f));
        self
    }

    pub fn on_send<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, Option<&Payload>) + Send + Sync + 'static,
    {
        self.on_send = Some(Arc::new(f));
        self
    }

    pub fn on_headers_received<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, Option<&str>, Option<u64>, &str) + Send + Sync + 'static,
    {
        self.on_headers_received = Some(Arc::new(f));
        self
    }

    pub fn on_response<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, &ResponseInfo) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, &FailureInfo) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_socket<F>(mut self, f: F) -> Self
    where
        F: Fn(&ActivityId, &SocketEvent) + Send + Sync + 'static,
    {
        self.on_socket = Some(Arc::new(f));
        self
    }
}

static INSTANCE: OnceLock<Arc<NetworkInterceptor>> = OnceLock::new();

/// Network interception and the lifecycle registry it feeds.
///
/// Wrappers report each stage here keyed by the activity id minted at open.
/// While enabled, the registry is updated first and the matching callback is
/// invoked afterwards with the registry lock released, so a callback may read
/// the registry or issue requests of its own.
pub struct NetworkInterceptor {
    patch: Patch<NetworkCallbacks>,
    registry: Mutex<LifecycleRegistry>,
}

impl NetworkInterceptor {
    /// Detached interceptor, not wired to the process-wide wrappers.
    pub fn new() -> Self {
        Self {
            patch: Patch::new(InterceptionClass::Network),
            registry: Mutex::new(LifecycleRegistry::new()),
        }
    }

    /// The process-wide interceptor.
    pub fn instance() -> Arc<NetworkInterceptor> {
        INSTANCE
            .get_or_init(|| Arc::new(NetworkInterceptor::new()))
            .clone()
    }

    pub fn set_callback(&self, callbacks: NetworkCallbacks) -> &Self {
        self.patch.set_observer(Some(callbacks));
        self
    }

    pub fn clear_callback(&self) -> &Self {
        self.patch.set_observer(None);
        self
    }

    pub fn enable_interception(&self) -> bool {
        self.patch.enable()
    }

    pub fn disable_interception(&self) -> bool {
        self.patch.disable()
    }

    pub fn is_interceptor_enabled(&self) -> bool {
        self.patch.is_enabled()
    }

    pub fn on_open(&self, id: &ActivityId, kind: NetworkType, method: &str, url: &str) {
        let update = HttpUpdate::Open {
            kind,
            method: method.to_string(),
            url: url.to_string(),
        };
        self.record(id, update, |callbacks, _| {
            if let Some(cb) = &callbacks.on_open {
                cb(id, kind, method, url);
            }
        });
    }

    pub fn on_request_header(&self, id: &ActivityId, name: &str, value: &str) {
        let update = HttpUpdate::RequestHeader {
            name: name.to_string(),
            value: value.to_string(),
        };
        let snapshot = self.record(id, update, |callbacks, _| {
            if let Some(cb) = &callbacks.on_request_header {
                cb(id, name, value);
            }
        });
        if snapshot.is_some_and(|record| record.stage > LifecycleStage::Opened) {
            debug!("Header '{}' set on {} after send", name, id);
        }
    }

    /// A missing body stays absent in the record.
    pub fn on_send(&self, id: &ActivityId, body: Option<&Payload>) {
        let update = HttpUpdate::Send { body: body.cloned() };
        self.record(id, update, |callbacks, _| {
            if let Some(cb) = &callbacks.on_send {
                cb(id, body);
            }
        });
    }

    pub fn on_headers_received(&self, id: &ActivityId, content_type: Option<&str>, size: Option<u64>, headers: &str) {
        let update = HttpUpdate::HeadersReceived {
            content_type: content_type.map(str::to_string),
            size,
            headers: headers.to_string(),
        };
        self.record(id, update, |callbacks, _| {
            if let Some(cb) = &callbacks.on_headers_received {
                cb(id, content_type, size, headers);
            }
        });
    }

    /// Terminal. The callback receives the duration as recorded.
    pub fn on_response(&self, id: &ActivityId, info: ResponseInfo) {
        self.record(id, HttpUpdate::Response(info.clone()), |callbacks, record| {
            if let Some(cb) = &callbacks.on_response {
                let info = ResponseInfo {
                    duration: record.duration,
                    ..info
                };
                cb(id, &info);
            }
        });
    }

    /// Terminal. Covers both transport errors and timeouts.
    pub fn on_error(&self, id: &ActivityId, failure: FailureInfo) {
        self.record(id, HttpUpdate::Failure(failure.clone()), |callbacks, record| {
            if let Some(cb) = &callbacks.on_error {
                let failure = FailureInfo {
                    duration: record.duration,
                    ..failure
                };
                cb(id, &failure);
            }
        });
    }

    pub fn on_socket(&self, id: &ActivityId, event: SocketEvent) {
        let Some(_guard) = ReentryGuard::enter(InterceptionClass::Network) else {
            return;
        };
        let Some(armed) = self.patch.armed() else {
            return;
        };

        let applied = self.registry().apply_socket(id, event.clone());
        if let Err(err) = applied {
            debug!("Dropped socket event: {}", err);
            return;
        }

        if let Some(cb) = armed.observer.and_then(|callbacks| callbacks.on_socket) {
            notify(InterceptionClass::Network, || cb(id, &event));
        }
    }

    pub fn request(&self, id: &ActivityId) -> Option<NetworkRecord> {
        self.registry().request(id).cloned()
    }

    pub fn requests(&self) -> Vec<NetworkRecord> {
        self.registry().requests().cloned().collect()
    }

    pub fn socket(&self, id: &ActivityId) -> Option<WebSocketRecord> {
        self.registry().socket(id).cloned()
    }

    pub fn sockets(&self) -> Vec<WebSocketRecord> {
        self.registry().sockets().cloned().collect()
    }

    /// Forgets everything captured so far. Interception state is untouched.
    pub fn clear_registry(&self) {
        self.registry().clear();
    }

    fn registry(&self) -> MutexGuard<'_, LifecycleRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the updated record, or `None` if the event was not observed.
    fn record<F>(&self, id: &ActivityId, update: HttpUpdate, forward: F) -> Option<NetworkRecord>
    where
        F: FnOnce(&NetworkCallbacks, &NetworkRecord),
    {
        // Requests issued from inside a callback are not observed
        let _guard = ReentryGuard::enter(InterceptionClass::Network)?;
        let armed = self.patch.armed()?;

        // Lock released before anything can log or call out
        let applied = self.registry().apply(id, update);
        let snapshot = match applied {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!("Dropped network event: {}", err);
                return None;
            }
        };

        if let Some(callbacks) = armed.observer {
            notify(InterceptionClass::Network, || forward(&callbacks, &snapshot));
        }
        Some(snapshot)
    }
}

impl Default for NetworkInterceptor {
    fn default() -> Self {
        Self::new()
    }
}
