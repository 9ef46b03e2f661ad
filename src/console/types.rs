use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kernel::payload::Payload;
use crate::kernel::time::Timestamp;

/// Logging entry points that can be instrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Log,
    Info,
    Warn,
    Error,
    Debug,
    Trace,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Log => "log",
            LogKind::Info => "info",
            LogKind::Warn => "warn",
            LogKind::Error => "error",
            LogKind::Debug => "debug",
            LogKind::Trace => "trace",
        }
    }

    /// Kinds the stdio sink sends to stderr.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, LogKind::Warn | LogKind::Error)
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for LogKind {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            LogKind::Error
        } else if level == tracing::Level::WARN {
            LogKind::Warn
        } else if level == tracing::Level::INFO {
            LogKind::Info
        } else if level == tracing::Level::DEBUG {
            LogKind::Debug
        } else {
            LogKind::Trace
        }
    }
}

/// Snapshot of one intercepted logging call. Never mutated after capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMessage {
    pub kind: LogKind,
    pub values: Vec<Payload>,
    pub captured_at: Timestamp,
}

impl LogMessage {
    pub fn new(kind: LogKind, values: Vec<Payload>) -> Self {
        Self {
            kind,
            values,
            captured_at: Timestamp::now(),
        }
    }
}
