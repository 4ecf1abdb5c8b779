//! Diagnostic provenance for declarations.

use serde::Serialize;
use std::fmt;

/// Where a declaration came from: a source identifier and a 1-based line.
///
/// Origins never take part in merge semantics; they only make diagnostics
/// point at the offending declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Origin {
    source: String,
    line: usize,
}

impl Origin {
    pub fn new(source: impl Into<String>, line: usize) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }

    /// Origin for a declaration built in code rather than parsed from text.
    pub fn synthetic(label: impl Into<String>) -> Self {
        Self::new(label, 0)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Line within the source, or `0` for synthetic origins.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "[{}]", self.source)
        } else {
            write!(f, "[{}]:{}", self.source, self.line)
        }
    }
}
