pub mod console;
pub mod engine;
pub mod format;
pub mod kernel;
pub mod network;
pub mod session;

// Re-export the entry points hosts reach for first
pub use console::{Console, ConsoleInterceptor};
pub use engine::Engine;
pub use kernel::{generate_id, ActivityId, EngineConfig, Payload};
pub use network::NetworkInterceptor;
