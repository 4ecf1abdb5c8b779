//! Loading one capability set from many declaration sources.

use crate::{
    AnnotationRegistry, CapabilitySet, Declaration, HostResolver, InstanceBinding,
    NameOnlyResolver, Result,
};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One declaration source: an identifier used in diagnostics, and its text.
#[derive(Debug, Clone)]
struct Source {
    id: String,
    text: String,
}

/// Builder collecting sources and instance bindings for one capability set.
///
/// # Example
///
/// ```
/// use allowlist::Loader;
///
/// let set = Loader::new()
///     .source("numbers.txt", "class int {\n}\n")
///     .source("example.txt", "class my.Example @no_import {\n  ()\n  int add(int)\n}\n")
///     .load()?;
///
/// assert_eq!(set.classes().len(), 2);
/// assert!(set.class("Example").is_none());
/// # Ok::<(), allowlist::Error>(())
/// ```
pub struct Loader {
    annotations: AnnotationRegistry,
    resolver: Arc<dyn HostResolver>,
    sources: Vec<Source>,
    included: Vec<Declaration>,
    instance_bindings: Vec<InstanceBinding>,
}

impl Loader {
    /// A loader using the base annotations and a name-only resolver.
    pub fn new() -> Self {
        Self {
            annotations: AnnotationRegistry::base(),
            resolver: Arc::new(NameOnlyResolver),
            sources: Vec::new(),
            included: Vec::new(),
            instance_bindings: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: AnnotationRegistry) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn HostResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Add a source held in memory.
    pub fn source(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.push(Source {
            id: id.into(),
            text: text.into(),
        });
        self
    }

    /// Add a source read from disk. The path becomes the source identifier.
    pub fn file(self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(self.source(path.display().to_string(), text))
    }

    /// Merge the contents of an already loaded set along with the sources,
    /// so sources may refer to its types.
    pub fn include(mut self, set: &CapabilitySet) -> Self {
        self.included.extend(set.declarations());
        self
    }

    /// Add an instance binding supplied by the host.
    pub fn instance_binding(mut self, binding: InstanceBinding) -> Self {
        self.instance_bindings.push(binding);
        self
    }

    /// Parse every source and merge them into one capability set.
    ///
    /// Sources are parsed in parallel; when several fail, the error of the
    /// earliest source is reported.
    #[tracing::instrument(level = "debug", skip_all, fields(sources = self.sources.len()))]
    pub fn load(self) -> Result<CapabilitySet> {
        let annotations = &self.annotations;
        let parsed: Vec<Result<Vec<Declaration>>> = self
            .sources
            .par_iter()
            .map(|source| crate::parse(&source.id, &source.text, annotations))
            .collect();

        let mut declarations = self.included;
        for result in parsed {
            declarations.extend(result?);
        }
        declarations.extend(
            self.instance_bindings
                .into_iter()
                .map(Declaration::InstanceBinding),
        );

        let set = crate::merge(self.resolver, declarations)?;
        info!(
            sources = self.sources.len(),
            classes = set.classes().len(),
            "loaded capability set"
        );
        Ok(set)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotations, Error, Origin};

    #[test]
    fn earliest_failing_source_is_reported() {
        let err = Loader::new()
            .source("a.txt", "class int {\n}\n")
            .source("b.txt", "class x.Y {\n  int f(\n}\n")
            .source("c.txt", "oops")
            .load()
            .unwrap_err();
        assert_eq!(err.origin().unwrap().source(), "b.txt");
    }

    #[test]
    fn instance_bindings_are_merged() {
        let shared: crate::HostInstance = Arc::new(String::from("state"));
        let set = Loader::new()
            .source("a.txt", "class int {\n}\n")
            .instance_binding(InstanceBinding::new(
                Origin::synthetic("host"),
                shared.clone(),
                "size",
                "int",
                Vec::new(),
                Annotations::new(),
            ))
            .load()
            .unwrap();
        let binding = set.instance_binding("size", 0).unwrap();
        assert!(Arc::ptr_eq(binding.instance(), &shared));
    }

    #[test]
    fn sources_may_use_included_types() {
        let numbers = Loader::new().source("numbers.txt", "class int {\n}\n").load().unwrap();
        let set = Loader::new()
            .include(&numbers)
            .source("example.txt", "class my.Example {\n  int add(int)\n}\n")
            .load()
            .unwrap();
        assert_eq!(set.class("int").unwrap().origin().source(), "numbers.txt");
        assert!(set.class("Example").is_some());

        let alone = Loader::new()
            .source("example.txt", "class my.Example {\n  int add(int)\n}\n")
            .load();
        assert!(matches!(alone, Err(Error::UnresolvedType { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Loader::new().file("/definitely/not/here.txt");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn loads_files_from_disk() {
        let dir = std::env::temp_dir().join(format!("allowlist-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("numbers.txt");
        std::fs::write(&path, "class int {\n}\nclass long {\n}\n").unwrap();

        let set = Loader::new().file(&path).unwrap().load().unwrap();
        assert_eq!(set.classes().len(), 2);
        assert_eq!(
            set.class("long").unwrap().origin().source(),
            path.display().to_string()
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
