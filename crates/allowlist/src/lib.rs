//! Capability allowlists for sandboxed scripts.
//!
//! Core principle: **a script reaches only what some allowlist declares.**
//!
//! Declaration sources are parsed independently, then merged and validated
//! into one immutable [`CapabilitySet`] per execution context:
//!
//! ```
//! use allowlist::{ContextRegistry, Loader};
//! use std::sync::Arc;
//!
//! let set = Loader::new()
//!     .source("score.txt", "class int {\n}\nclass my.Score {\n  int total(int)\n}\n")
//!     .load()?;
//!
//! let registry = ContextRegistry::default();
//! registry.register("score", vec![Arc::new(set)])?;
//! assert!(registry.lookup("score").unwrap().class("Score").is_some());
//! # Ok::<(), allowlist::Error>(())
//! ```

mod annotation;
mod base;
mod binding;
mod error;
mod lexer;
mod loader;
mod merge;
mod model;
mod origin;
mod parser;
mod registry;
mod resolver;
mod set;
pub mod whitelist;

pub use annotation::{
    Annotation, AnnotationParser, AnnotationRegistry, Annotations, COMPILE_TIME_ONLY, DEPRECATED,
    INJECT_CONSTANT, NO_IMPORT, NO_SIDE_EFFECT, NONDETERMINISTIC,
};
pub use base::{BASE_SOURCES, base, load_base};
pub use binding::{BindingState, CallSite};
pub use error::{Error, Result};
pub use loader::Loader;
pub use merge::merge;
pub use model::{
    Class, ClassBinding, Constructor, DEF_TYPE, Declaration, Field, HostInstance, InstanceBinding,
    Method, canonical_type_name, element_type_name, short_type_name,
};
pub use origin::Origin;
pub use parser::parse;
pub use registry::{ContextRegistry, Extension};
pub use resolver::{
    BindingShape, HostHandle, HostResolver, HostSymbol, HostType, NameOnlyResolver,
    StaticResolver,
};
pub use set::CapabilitySet;
