pub mod host;
pub mod interceptor;
pub mod layer;
pub mod types;

pub use host::{BufferSink, CapturedLine, Console, ConsoleSink, StdioSink};
pub use interceptor::{ConsoleCallback, ConsoleInterceptor};
pub use layer::ConsoleLayer;
pub use types::{LogKind, LogMessage};
