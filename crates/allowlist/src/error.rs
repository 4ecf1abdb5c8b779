//! Allowlist error types.

use crate::Origin;
use thiserror::Error;

/// Errors raised while parsing, merging, or registering allowlists.
///
/// Every load is all-or-nothing: any of these aborts the whole load and no
/// partially built capability set is ever handed out.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A source does not follow the declaration grammar.
    #[error("{origin}: syntax error: {message}")]
    Syntax { origin: Origin, message: String },

    /// An annotation name is not present in the annotation registry.
    #[error("{origin}: unknown annotation @{name}")]
    UnknownAnnotation { origin: Origin, name: String },

    /// A registered annotation parser rejected its arguments.
    #[error("{origin}: invalid annotation @{name}: {message}")]
    InvalidAnnotation {
        origin: Origin,
        name: String,
        message: String,
    },

    /// Two constructors, methods, fields, or functions collide.
    #[error("{origin}: {message} on {owner} (first declared at {existing})")]
    OverloadConflict {
        origin: Origin,
        existing: Origin,
        owner: String,
        message: String,
    },

    /// One class is declared with different values for the same annotation.
    #[error("{origin}: conflicting @{name} on {owner} (first declared at {existing})")]
    AnnotationConflict {
        origin: Origin,
        existing: Origin,
        owner: String,
        name: String,
    },

    /// A type name is not declared by any merged source.
    #[error("{origin}: unresolved type `{type_name}`")]
    UnresolvedType { origin: Origin, type_name: String },

    /// Two distinct host types claim the same script type name.
    #[error("{origin}: {message} (first declared at {existing})")]
    NameClash {
        origin: Origin,
        existing: Origin,
        name: String,
        message: String,
    },

    /// A class binding target does not have exactly one constructor and one method.
    #[error("{origin}: unsupported binding shape for {host_type}: {message}")]
    UnsupportedBindingShape {
        origin: Origin,
        host_type: String,
        message: String,
    },

    /// The host resolver could not resolve a declared symbol.
    #[error("{origin}: unresolved host symbol {symbol}: {message}")]
    UnresolvedSymbol {
        origin: Origin,
        symbol: String,
        message: String,
    },

    /// Combining several capability sets for one context failed.
    #[error("failed to merge capability sets for context `{context}`: {source}")]
    Merge {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error occurred while reading a source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The origin of the offending declaration, if the error has one.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Error::Syntax { origin, .. }
            | Error::UnknownAnnotation { origin, .. }
            | Error::InvalidAnnotation { origin, .. }
            | Error::OverloadConflict { origin, .. }
            | Error::AnnotationConflict { origin, .. }
            | Error::UnresolvedType { origin, .. }
            | Error::NameClash { origin, .. }
            | Error::UnsupportedBindingShape { origin, .. }
            | Error::UnresolvedSymbol { origin, .. } => Some(origin),
            Error::Merge { source, .. } => source.origin(),
            Error::Io(_) => None,
        }
    }

    pub(crate) fn syntax(origin: Origin, message: impl Into<String>) -> Self {
        Error::Syntax {
            origin,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
