pub mod config;
pub mod id;
pub mod patch;
pub mod payload;
pub mod time;

pub use config::{ConfigError, EngineConfig};
pub use id::{generate_id, ActivityId};
pub use patch::{InterceptionClass, Patch, ReentryGuard};
pub use payload::Payload;
pub use time::Timestamp;
