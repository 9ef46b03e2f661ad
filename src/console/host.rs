use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::interceptor::ConsoleInterceptor;
use super::types::LogKind;
use crate::format::format_log_message;
use crate::kernel::payload::Payload;

/// The original logging implementation behind the console entry points.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, kind: LogKind, values: &[Payload]) -> io::Result<()>;
}

/// Writes `KIND: v1, v2` lines, warnings and errors to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioSink;

impl ConsoleSink for StdioSink {
    fn write(&self, kind: LogKind, values: &[Payload]) -> io::Result<()> {
        let line = format_log_message(kind, values);
        if kind.is_diagnostic() {
            writeln!(io::stderr().lock(), "{}", line)
        } else {
            writeln!(io::stdout().lock(), "{}", line)
        }
    }
}

/// A captured console line.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedLine {
    pub kind: LogKind,
    pub content: String,
}

/// Sink that keeps lines in memory, for hosts without a terminal.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<CapturedLine>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<CapturedLine> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ConsoleSink for BufferSink {
    fn write(&self, kind: LogKind, values: &[Payload]) -> io::Result<()> {
        let content = format_log_message(kind, values);
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLine { kind, content });
        Ok(())
    }
}

static GLOBAL: OnceLock<Console> = OnceLock::new();

/// Host-facing console entry points.
///
/// The sink slot is the original implementation. Interception never replaces
/// it; each call is dispatched through the interceptor, which decides whether
/// to observe before delegating to the sink.
pub struct Console {
    sink: Arc<dyn ConsoleSink>,
    interceptor: Arc<ConsoleInterceptor>,
}

impl Console {
    /// Console bound to the process-wide interceptor.
    pub fn new(sink: Arc<dyn ConsoleSink>) -> Self {
        Self::with_interceptor(sink, ConsoleInterceptor::instance())
    }

    pub fn with_interceptor(sink: Arc<dyn ConsoleSink>, interceptor: Arc<ConsoleInterceptor>) -> Self {
        Self {
            sink,
            interceptor,
        }
    }

    /// Process-wide console writing to stdio.
    pub fn global() -> &'static Console {
        GLOBAL.get_or_init(|| Console::new(Arc::new(StdioSink)))
    }

    pub fn interceptor(&self) -> &Arc<ConsoleInterceptor> {
        &self.interceptor
    }

    /// The entry point currently installed.
    pub fn sink(&self) -> Arc<dyn ConsoleSink> {
        Arc::clone(&self.sink)
    }

    pub fn emit(&self, kind: LogKind, values: &[Payload]) -> io::Result<()> {
        self.interceptor
            .intercept(kind, values, || self.sink.write(kind, values))
    }

    pub fn log(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Log, values)
    }

    pub fn info(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Info, values)
    }

    pub fn warn(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Warn, values)
    }

    pub fn error(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Error, values)
    }

    pub fn debug(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Debug, values)
    }

    pub fn trace(&self, values: &[Payload]) -> io::Result<()> {
        self.emit(LogKind::Trace, values)
    }
}

/// Logs through the global instrumented console.
///
/// ```ignore
/// console!(Warn, "retrying", 3);
/// ```
#[macro_export]
macro_rules! console {
    ($kind:ident, $($value:expr),* $(,)?) => {
        $crate::console::Console::global().emit(
            $crate::console::LogKind::$kind,
            &[$($crate::kernel::payload::Payload::from($value)),*],
        )
    };
}
