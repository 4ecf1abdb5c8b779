//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The requested context is not in the configuration.
    #[error("no context named '{name}' in {config}")]
    UnknownContext { name: String, config: String },

    /// `dump` was run without `--context` and the config has several.
    #[error("several contexts configured ({}); pass --context", contexts.join(", "))]
    AmbiguousContext { contexts: Vec<String> },

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Loading or merging a capability set failed.
    #[error(transparent)]
    Allowlist(#[from] allowlist::Error),

    /// A capability set could not be serialized.
    #[error("failed to serialize capability set: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
