//! Configuration loading from allowlist.toml.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Execution contexts and the sources feeding each.
    #[serde(default, rename = "context")]
    pub contexts: Vec<ContextConfig>,
}

/// One execution context.
#[derive(Debug, Deserialize)]
pub struct ContextConfig {
    pub name: String,

    /// Include the built-in base set.
    #[serde(default = "default_base")]
    pub base: bool,

    /// Declaration sources, relative to the config file.
    #[serde(default)]
    pub sources: Vec<PathBuf>,
}

fn default_base() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Relative source paths are resolved against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        if let Some(dir) = path.parent() {
            for context in &mut config.contexts {
                for source in &mut context.sources {
                    if source.is_relative() {
                        *source = dir.join(&*source);
                    }
                }
            }
        }
        Ok(config)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut seen = HashSet::new();
        for context in &config.contexts {
            if !seen.insert(context.name.as_str()) {
                return Err(ConfigError::DuplicateContext(context.name.clone()));
            }
        }
        Ok(config)
    }

    pub fn context(&self, name: &str) -> Option<&ContextConfig> {
        self.contexts.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("context `{0}` is configured more than once")]
    DuplicateContext(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_contexts_with_defaults() {
        let config = Config::parse(
            r#"
[[context]]
name = "score"
sources = ["score.txt", "extra.txt"]

[[context]]
name = "bare"
base = false
"#,
        )
        .unwrap();

        assert_eq!(config.contexts.len(), 2);
        let score = config.context("score").unwrap();
        assert!(score.base);
        assert_eq!(score.sources, vec![PathBuf::from("score.txt"), PathBuf::from("extra.txt")]);
        let bare = config.context("bare").unwrap();
        assert!(!bare.base);
        assert!(bare.sources.is_empty());
    }

    #[test]
    fn empty_config_has_no_contexts() {
        assert!(Config::parse("").unwrap().contexts.is_empty());
    }

    #[test]
    fn rejects_duplicate_contexts() {
        let err =
            Config::parse("[[context]]\nname = \"a\"\n[[context]]\nname = \"a\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateContext(name) if name == "a"));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(Config::parse("[[context]\n"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn resolves_sources_against_config_dir() {
        let dir = std::env::temp_dir().join(format!("allowlistc-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("allowlist.toml");
        std::fs::write(
            &path,
            "[[context]]\nname = \"score\"\nsources = [\"score.txt\", \"/abs/other.txt\"]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let score = config.context("score").unwrap();
        assert_eq!(score.sources[0], dir.join("score.txt"));
        assert_eq!(score.sources[1], PathBuf::from("/abs/other.txt"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Config::load("/definitely/not/allowlist.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
