//! Consumer-side stores for UI adapters.
//!
//! Each session registers itself as the observer of one interceptor and keeps
//! its own copy of what it was told: an append-only log for the console and a
//! keyed registry for the network. The interceptors never read these back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::console::interceptor::ConsoleInterceptor;
use crate::console::types::LogMessage;
use crate::kernel::id::ActivityId;
use crate::network::interceptor::{NetworkCallbacks, NetworkInterceptor};
use crate::network::registry::{HttpUpdate, LifecycleRegistry};
use crate::network::types::{NetworkRecord, WebSocketRecord};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ConsoleSession {
    interceptor: Arc<ConsoleInterceptor>,
    messages: Arc<Mutex<Vec<LogMessage>>>,
    auto_enabled: bool,
}

impl ConsoleSession {
    /// With `auto_enabled`, interception starts now and stops when the session drops.
    pub fn new(interceptor: Arc<ConsoleInterceptor>, auto_enabled: bool) -> Self {
        let session = Self {
            interceptor,
            messages: Arc::new(Mutex::new(Vec::new())),
            auto_enabled,
        };
        if auto_enabled {
            session.enable_interception();
        }
        session
    }

    /// Leaves an already enabled interceptor and its observer alone.
    pub fn enable_interception(&self) {
        if self.interceptor.is_interceptor_enabled() {
            return;
        }

        let messages = Arc::clone(&self.messages);
        self.interceptor.set_callback(move |message: &LogMessage| {
            lock(&messages).push(message.clone());
        });
        self.interceptor.enable_interception();
    }

    pub fn disable_interception(&self) {
        if !self.interceptor.is_interceptor_enabled() {
            return;
        }
        self.interceptor.disable_interception();
    }

    pub fn is_interceptor_enabled(&self) -> bool {
        self.interceptor.is_interceptor_enabled()
    }

    pub fn log_messages(&self) -> Vec<LogMessage> {
        lock(&self.messages).clone()
    }

    pub fn clear_all_log_messages(&self) {
        lock(&self.messages).clear();
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        if self.auto_enabled {
            self.disable_interception();
        }
    }
}

/// Rebuilds network records from per-stage callbacks, joined on the activity id.
pub struct NetworkSession {
    interceptor: Arc<NetworkInterceptor>,
    store: Arc<Mutex<LifecycleRegistry>>,
    auto_enabled: bool,
}

impl NetworkSession {
    pub fn new(interceptor: Arc<NetworkInterceptor>, auto_enabled: bool) -> Self {
        let session = Self {
            interceptor,
            store: Arc::new(Mutex::new(LifecycleRegistry::new())),
            auto_enabled,
        };
        if auto_enabled {
            session.enable_interception();
        }
        session
    }

    pub fn enable_interception(&self) {
        if self.interceptor.is_interceptor_enabled() {
            return;
        }
        self.interceptor.set_callback(Self::callbacks(&self.store));
        self.interceptor.enable_interception();
    }

    pub fn disable_interception(&self) {
        if !self.interceptor.is_interceptor_enabled() {
            return;
        }
        self.interceptor.disable_interception();
    }

    pub fn is_interceptor_enabled(&self) -> bool {
        self.interceptor.is_interceptor_enabled()
    }

    pub fn requests(&self) -> Vec<NetworkRecord> {
        lock(&self.store).requests().cloned().collect()
    }

    pub fn sockets(&self) -> Vec<WebSocketRecord> {
        lock(&self.store).sockets().cloned().collect()
    }

    pub fn clear_all_network_requests(&self) {
        lock(&self.store).clear();
    }

    fn callbacks(store: &Arc<Mutex<LifecycleRegistry>>) -> NetworkCallbacks {
        let open = Arc::clone(store);
        let header = Arc::clone(store);
        let send = Arc::clone(store);
        let headers_received = Arc::clone(store);
        let response = Arc::clone(store);
        let error = Arc::clone(store);
        let sockets = Arc::clone(store);

        NetworkCallbacks::new()
            .on_open(move |id, kind, method, url| {
                let update = HttpUpdate::Open {
                    kind,
                    method: method.to_string(),
                    url: url.to_string(),
                };
                apply(&open, id, update);
            })
            .on_request_header(move |id, name, value| {
                let update = HttpUpdate::RequestHeader {
                    name: name.to_string(),
                    value: value.to_string(),
                };
                apply(&header, id, update);
            })
            .on_send(move |id, body| apply(&send, id, HttpUpdate::Send { body: body.cloned() }))
            .on_headers_received(move |id, content_type, size, headers| {
                let update = HttpUpdate::HeadersReceived {
                    content_type: content_type.map(str::to_string),
                    size,
                    headers: headers.to_string(),
                };
                apply(&headers_received, id, update);
            })
            .on_response(move |id, info| apply(&response, id, HttpUpdate::Response(info.clone())))
            .on_error(move |id, failure| apply(&error, id, HttpUpdate::Failure(failure.clone())))
            .on_socket(move |id, event| {
                // Terminal sockets reject further events, same as the engine's registry
                let _ = lock(&sockets).apply_socket(id, event.clone());
            })
    }
}

/// Late events for a record cleared in the meantime start a fresh record.
fn apply(store: &Mutex<LifecycleRegistry>, id: &ActivityId, update: HttpUpdate) {
    let _ = lock(store).apply(id, update);
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        if self.auto_enabled {
            self.disable_interception();
        }
    }
}
