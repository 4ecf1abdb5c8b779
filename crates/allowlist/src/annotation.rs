//! Annotation values and the pluggable annotation parser registry.
//!
//! The source parser never interprets annotations itself. Every `@name` it
//! meets is handed, together with its ordered `key="value"` arguments, to
//! the parser registered under `name`.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

pub const NO_IMPORT: &str = "no_import";
pub const DEPRECATED: &str = "deprecated";
pub const NONDETERMINISTIC: &str = "nondeterministic";
pub const NO_SIDE_EFFECT: &str = "no_side_effect";
pub const COMPILE_TIME_ONLY: &str = "compile_time_only";
pub const INJECT_CONSTANT: &str = "inject_constant";

/// Annotations attached to one declaration, keyed by annotation name.
pub type Annotations = BTreeMap<String, Annotation>;

/// A parsed annotation value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// The class registers no short-name alias.
    NoImport,
    /// The member is deprecated; scripts should move away from it.
    Deprecated { message: String },
    /// The member may return different results for the same inputs.
    Nondeterministic,
    /// The member does not mutate observable state.
    NoSideEffect,
    /// The member may only be invoked with compile-time constant arguments.
    CompileTimeOnly,
    /// Named constants injected ahead of the script-supplied arguments.
    InjectConstant { constants: Vec<String> },
    /// A host-defined annotation; the value is opaque to this crate.
    Custom {
        name: String,
        value: serde_json::Value,
    },
}

impl Annotation {
    /// The registry name this annotation is stored under.
    pub fn name(&self) -> &str {
        match self {
            Annotation::NoImport => NO_IMPORT,
            Annotation::Deprecated { .. } => DEPRECATED,
            Annotation::Nondeterministic => NONDETERMINISTIC,
            Annotation::NoSideEffect => NO_SIDE_EFFECT,
            Annotation::CompileTimeOnly => COMPILE_TIME_ONLY,
            Annotation::InjectConstant { .. } => INJECT_CONSTANT,
            Annotation::Custom { name, .. } => name,
        }
    }
}

/// Turns the ordered arguments of one `@name[...]` occurrence into a value.
///
/// Returning `Err` rejects the arguments; the message ends up in
/// [`Error::InvalidAnnotation`](crate::Error::InvalidAnnotation).
pub trait AnnotationParser: Send + Sync {
    fn parse(&self, arguments: &[(String, String)]) -> Result<Annotation, String>;
}

impl<F> AnnotationParser for F
where
    F: Fn(&[(String, String)]) -> Result<Annotation, String> + Send + Sync,
{
    fn parse(&self, arguments: &[(String, String)]) -> Result<Annotation, String> {
        self(arguments)
    }
}

/// Mapping from annotation name to the parser producing its value.
#[derive(Clone, Default)]
pub struct AnnotationRegistry {
    parsers: HashMap<String, Arc<dyn AnnotationParser>>,
}

impl AnnotationRegistry {
    /// An empty registry; every annotation is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of annotations every host understands.
    pub fn base() -> Self {
        Self::new()
            .with_parser(NO_IMPORT, flag(Annotation::NoImport))
            .with_parser(NONDETERMINISTIC, flag(Annotation::Nondeterministic))
            .with_parser(NO_SIDE_EFFECT, flag(Annotation::NoSideEffect))
            .with_parser(COMPILE_TIME_ONLY, flag(Annotation::CompileTimeOnly))
            .with_parser(DEPRECATED, parse_deprecated)
            .with_parser(INJECT_CONSTANT, parse_inject_constant)
    }

    pub fn with_parser(
        mut self,
        name: impl Into<String>,
        parser: impl AnnotationParser + 'static,
    ) -> Self {
        self.register(name, parser);
        self
    }

    /// Register a parser, replacing any parser already under `name`.
    pub fn register(&mut self, name: impl Into<String>, parser: impl AnnotationParser + 'static) {
        self.parsers.insert(name.into(), Arc::new(parser));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Parse one annotation occurrence. `None` means `name` is not registered.
    pub fn parse(
        &self,
        name: &str,
        arguments: &[(String, String)],
    ) -> Option<Result<Annotation, String>> {
        self.parsers.get(name).map(|parser| parser.parse(arguments))
    }
}

impl fmt::Debug for AnnotationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.parsers.keys().collect();
        names.sort();
        f.debug_struct("AnnotationRegistry")
            .field("parsers", &names)
            .finish()
    }
}

fn flag(annotation: Annotation) -> impl AnnotationParser {
    move |arguments: &[(String, String)]| {
        if arguments.is_empty() {
            Ok(annotation.clone())
        } else {
            Err("takes no arguments".to_string())
        }
    }
}

fn parse_deprecated(arguments: &[(String, String)]) -> Result<Annotation, String> {
    match arguments {
        [(key, message)] if key == "message" => Ok(Annotation::Deprecated {
            message: message.clone(),
        }),
        [] => Err("requires a `message` argument".to_string()),
        _ => Err("takes exactly one `message` argument".to_string()),
    }
}

// Arguments are positional: 1="first", 2="second", ...
fn parse_inject_constant(arguments: &[(String, String)]) -> Result<Annotation, String> {
    if arguments.is_empty() {
        return Err("requires at least one constant".to_string());
    }
    let mut constants = Vec::with_capacity(arguments.len());
    for (index, (key, value)) in arguments.iter().enumerate() {
        if key.parse::<usize>() != Ok(index + 1) {
            return Err(format!("expected argument `{}`, found `{key}`", index + 1));
        }
        constants.push(value.clone());
    }
    Ok(Annotation::InjectConstant { constants })
}
