//! The built-in base capability set.
//!
//! Every context may include the base set. It is assembled once per process,
//! on first use, and shared by reference afterwards.

use crate::{CapabilitySet, Loader, Result};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Canonical list of built-in sources, as `(source id, text)`.
pub const BASE_SOURCES: &[(&str, &str)] = &[
    ("host.lang.txt", include_str!("base/host.lang.txt")),
    ("host.math.txt", include_str!("base/host.math.txt")),
    ("host.text.txt", include_str!("base/host.text.txt")),
    ("host.time.txt", include_str!("base/host.time.txt")),
    ("host.util.txt", include_str!("base/host.util.txt")),
    ("host.util.function.txt", include_str!("base/host.util.function.txt")),
    ("host.util.regex.txt", include_str!("base/host.util.regex.txt")),
];

static BASE: OnceLock<Arc<CapabilitySet>> = OnceLock::new();
static INIT: Mutex<()> = Mutex::new(());

/// The shared base capability set, loading it on first call.
///
/// Loading happens at most once successfully; a failed load is returned to
/// the caller and attempted again on the next call.
pub fn base() -> Result<Arc<CapabilitySet>> {
    if let Some(set) = BASE.get() {
        return Ok(set.clone());
    }

    let _init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = BASE.get() {
        return Ok(set.clone());
    }
    let set = Arc::new(load_base()?);
    // Only this thread can set the cell while holding INIT.
    let _ = BASE.set(set.clone());
    Ok(set)
}

/// Load a fresh, unshared copy of the base capability set.
pub fn load_base() -> Result<CapabilitySet> {
    BASE_SOURCES
        .iter()
        .fold(Loader::new(), |loader, (id, text)| loader.source(*id, *text))
        .load()
}
