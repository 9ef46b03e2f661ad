use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// A family of host entry points that is instrumented as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterceptionClass {
    Console,
    Network,
}

impl InterceptionClass {
    fn bit(self) -> u8 {
        match self {
            InterceptionClass::Console => 0b01,
            InterceptionClass::Network => 0b10,
        }
    }
}

thread_local! {
    static IN_FLIGHT: Cell<u8> = const { Cell::new(0) };
}

/// Marks a class as being observed on the current thread until dropped.
///
/// While held, any nested call into the same class (e.g. an observer that logs)
/// still reaches the original implementation but is not observed again.
#[derive(Debug)]
pub struct ReentryGuard {
    class: InterceptionClass,
}

impl ReentryGuard {
    /// Returns `None` if the class is already in flight on this thread.
    pub fn enter(class: InterceptionClass) -> Option<Self> {
        IN_FLIGHT.with(|flags| {
            let current = flags.get();
            if current & class.bit() != 0 {
                return None;
            }
            flags.set(current | class.bit());
            Some(ReentryGuard { class })
        })
    }
}

impl Drop for ReentryGuard {
    fn drop(&mut self) {
        let bit = self.class.bit();
        IN_FLIGHT.with(|flags| flags.set(flags.get() & !bit));
    }
}

#[derive(Debug)]
struct PatchState<O> {
    enabled: bool,
    observer: Option<O>,
}

/// What a wrapper needs to know at the instant an event fires.
#[derive(Debug, Clone)]
pub struct Armed<O> {
    pub observer: Option<O>,
}

/// Sole owner of the enable flag and observer slot for one interception class.
///
/// Host entry points consult `armed()` on every call instead of being swapped
/// out, so enabling twice can never stack wrappers and disabling always leaves
/// the original entry point in place.
#[derive(Debug)]
pub struct Patch<O> {
    class: InterceptionClass,
    state: RwLock<PatchState<O>>,
}

impl<O: Clone> Patch<O> {
    pub fn new(class: InterceptionClass) -> Self {
        Self {
            class,
            state: RwLock::new(PatchState {
                enabled: false,
                observer: None,
            }),
        }
    }

    /// Returns true if this call changed the state.
    pub fn enable(&self) -> bool {
        if !self.swap_enabled(true) {
            return false;
        }
        // Logged after the lock is released; a tracing layer may call back into us
        debug!("{:?} interception enabled", self.class);
        true
    }

    /// Returns true if this call changed the state.
    pub fn disable(&self) -> bool {
        if !self.swap_enabled(false) {
            return false;
        }
        debug!("{:?} interception disabled", self.class);
        true
    }

    fn swap_enabled(&self, enabled: bool) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.enabled == enabled {
            return false;
        }
        state.enabled = enabled;
        true
    }

    pub fn is_enabled(&self) -> bool {
        self.state.read().unwrap_or_else(PoisonError::into_inner).enabled
    }

    /// Replaces the observer. Events already dispatched keep the observer they
    /// were armed with.
    pub fn set_observer(&self, observer: Option<O>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.observer = observer;
    }

    /// `None` while disabled.
    pub fn armed(&self) -> Option<Armed<O>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if !state.enabled {
            return None;
        }
        Some(Armed {
            observer: state.observer.clone(),
        })
    }
}

/// Runs observer code, containing any panic so the wrapper can still delegate
/// to the original implementation.
pub fn notify<F: FnOnce()>(class: InterceptionClass, f: F) {
    if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        warn!("{:?} observer panicked, event dropped: {}", class, reason);
    }
}
