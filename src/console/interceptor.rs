use std::sync::{Arc, OnceLock};

use super::types::{LogKind, LogMessage};
use crate::kernel::patch::{notify, InterceptionClass, Patch, ReentryGuard};
use crate::kernel::payload::Payload;

pub type ConsoleCallback = Arc<dyn Fn(&LogMessage) + Send + Sync>;

static INSTANCE: OnceLock<Arc<ConsoleInterceptor>> = OnceLock::new();

/// Console interception: `Disabled <-> Enabled`, nothing richer.
///
/// Every logging entry point funnels through [`ConsoleInterceptor::intercept`],
/// which forwards a [`LogMessage`] to the observer and then runs the original.
pub struct ConsoleInterceptor {
    patch: Patch<ConsoleCallback>,
}

impl ConsoleInterceptor {
    /// Detached interceptor, not wired to the process-wide console.
    pub fn new() -> Self {
        Self {
            patch: Patch::new(InterceptionClass::Console),
        }
    }

    /// The process-wide interceptor.
    pub fn instance() -> Arc<ConsoleInterceptor> {
        INSTANCE
            .get_or_init(|| Arc::new(ConsoleInterceptor::new()))
            .clone()
    }

    pub fn set_callback<F>(&self, callback: F) -> &Self
    where
        F: Fn(&LogMessage) + Send + Sync + 'static,
    {
        self.patch.set_observer(Some(Arc::new(callback)));
        self
    }

    pub fn clear_callback(&self) -> &Self {
        self.patch.set_observer(None);
        self
    }

    /// No-op if already enabled. Returns true on a state change.
    pub fn enable_interception(&self) -> bool {
        self.patch.enable()
    }

    /// No-op if already disabled. Returns true on a state change.
    pub fn disable_interception(&self) -> bool {
        self.patch.disable()
    }

    pub fn is_interceptor_enabled(&self) -> bool {
        self.patch.is_enabled()
    }

    /// Wrapper body for a logging entry point.
    ///
    /// The observer sees the call before `original` runs. Whatever `original`
    /// returns, including an error, is handed back untouched. A nested call made
    /// from inside the observer skips observation and goes straight to `original`.
    pub fn intercept<R, F>(&self, kind: LogKind, values: &[Payload], original: F) -> R
    where
        F: FnOnce() -> R,
    {
        if let Some(_guard) = ReentryGuard::enter(InterceptionClass::Console) {
            if let Some(observer) = self.patch.armed().and_then(|armed| armed.observer) {
                let message = LogMessage::new(kind, values.to_vec());
                notify(InterceptionClass::Console, || observer(&message));
            }
        }

        original()
    }
}

impl Default for ConsoleInterceptor {
    fn default() -> Self {
        Self::new()
    }
}
