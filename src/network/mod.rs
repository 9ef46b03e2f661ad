pub mod fetch;
pub mod interceptor;
pub mod registry;
pub mod types;
pub mod websocket;
pub mod xhr;

pub use fetch::{Fetch, FetchRequest, FetchResponse, FetchTransport, TransportError};
pub use interceptor::{NetworkCallbacks, NetworkInterceptor};
pub use registry::{FailureInfo, HttpUpdate, LifecycleRegistry, RegistryError, ResponseInfo};
pub use types::*;
pub use websocket::{SocketTransport, WebSocket};
pub use xhr::{ReadyState, XhrRequest, XhrTransport};
