//! Per-call-site instance cache for class bindings.
//!
//! A class binding is stateful across invocations of the same call site:
//! the first call constructs the bound instance, every later call at that
//! site reuses it. Each site the consuming compiler generates owns one
//! [`CallSite`], which moves through `Unbound -> Constructing -> Bound` and
//! constructs at most once even when first used from several threads.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// Observable state of a [`CallSite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    Constructing,
    Bound,
}

enum Slot<T> {
    Unbound,
    Constructing,
    Bound(Arc<T>),
}

/// Lazily constructed, cached instance for one binding call site.
pub struct CallSite<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> CallSite<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Unbound),
            ready: Condvar::new(),
        }
    }

    pub fn state(&self) -> BindingState {
        match *self.lock() {
            Slot::Unbound => BindingState::Unbound,
            Slot::Constructing => BindingState::Constructing,
            Slot::Bound(_) => BindingState::Bound,
        }
    }

    /// The bound instance, if the site has been constructed.
    pub fn instance(&self) -> Option<Arc<T>> {
        match &*self.lock() {
            Slot::Bound(instance) => Some(instance.clone()),
            _ => None,
        }
    }

    /// Return the bound instance, constructing it on first use.
    ///
    /// Callers racing the first construction block until it finishes and
    /// then observe the same instance. A failed construction leaves the site
    /// unbound so a later call may try again.
    pub fn get_or_construct<E>(
        &self,
        construct: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut slot = self.lock();
        loop {
            match &*slot {
                Slot::Bound(instance) => return Ok(instance.clone()),
                Slot::Unbound => break,
                Slot::Constructing => {}
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *slot = Slot::Constructing;
        drop(slot);

        let mut guard = ResetOnUnwind { site: self, armed: true };
        let result = construct();
        guard.armed = false;

        let mut slot = self.lock();
        let outcome = match result {
            Ok(instance) => {
                let instance = Arc::new(instance);
                *slot = Slot::Bound(instance.clone());
                trace!("binding call site constructed");
                Ok(instance)
            }
            Err(err) => {
                *slot = Slot::Unbound;
                Err(err)
            }
        };
        drop(slot);
        self.ready.notify_all();
        outcome
    }

    /// Invoke the bound method, constructing the instance on first use.
    pub fn call<R, E>(
        &self,
        construct: impl FnOnce() -> Result<T, E>,
        invoke: impl FnOnce(&T) -> R,
    ) -> Result<R, E> {
        let instance = self.get_or_construct(construct)?;
        Ok(invoke(&instance))
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for CallSite<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CallSite<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSite")
            .field("state", &self.state())
            .finish()
    }
}

/// Puts a site back to `Unbound` if the constructor panics.
struct ResetOnUnwind<'a, T> {
    site: &'a CallSite<T>,
    armed: bool,
}

impl<T> Drop for ResetOnUnwind<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            *self.site.lock() = Slot::Unbound;
            self.site.ready.notify_all();
        }
    }
}
