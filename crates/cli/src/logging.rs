//! Tracing setup for `allowlistc`.
//!
//! The subscriber is only installed when `--verbose` is passed, or when
//! `ALLOWLIST_LOG` (or `RUST_LOG`) is set:
//!
//! ```bash
//! ALLOWLIST_LOG=debug allowlistc check score.txt
//! ALLOWLIST_LOG="allowlist::merge=trace" allowlistc dump --context score
//! ```

use tracing_subscriber::EnvFilter;

const LOG_VAR: &str = "ALLOWLIST_LOG";

/// `--verbose` forces `debug`; otherwise `ALLOWLIST_LOG` takes precedence
/// over `RUST_LOG`.
fn build_filter(verbose: bool) -> Option<EnvFilter> {
    if verbose {
        Some(EnvFilter::new("debug"))
    } else if let Ok(value) = std::env::var(LOG_VAR) {
        Some(EnvFilter::builder().parse_lossy(value))
    } else if std::env::var("RUST_LOG").is_ok() {
        Some(EnvFilter::from_default_env())
    } else {
        None
    }
}

/// Install the global subscriber, writing to stderr so stdout stays clean
/// for dumped capability sets.
pub fn init(verbose: bool) {
    let Some(filter) = build_filter(verbose) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
