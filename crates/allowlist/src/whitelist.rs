//! Deprecated names for the allowlist API.
//!
//! Every item here forwards to its current counterpart; nothing is derived
//! independently, so both surfaces always produce the same capability set.
#![allow(deprecated)]

use crate::{
    AnnotationRegistry, CapabilitySet, Class, ClassBinding, Constructor, ContextRegistry, Field,
    HostResolver, InstanceBinding, Loader, Method, Result,
};
use serde::{Serialize, Serializer};
use std::path::Path;
use std::sync::Arc;

#[deprecated(note = "renamed to `Class`")]
pub type WhitelistClass = Class;
#[deprecated(note = "renamed to `Constructor`")]
pub type WhitelistConstructor = Constructor;
#[deprecated(note = "renamed to `Method`")]
pub type WhitelistMethod = Method;
#[deprecated(note = "renamed to `Field`")]
pub type WhitelistField = Field;
#[deprecated(note = "renamed to `ClassBinding`")]
pub type WhitelistClassBinding = ClassBinding;
#[deprecated(note = "renamed to `InstanceBinding`")]
pub type WhitelistInstanceBinding = InstanceBinding;

/// Deprecated view of a [`CapabilitySet`].
#[deprecated(note = "renamed to `CapabilitySet`")]
#[derive(Debug, Clone)]
pub struct Whitelist {
    allowlist: Arc<CapabilitySet>,
}

impl Whitelist {
    pub fn new(
        resolver: Arc<dyn HostResolver>,
        whitelist_classes: Vec<WhitelistClass>,
        whitelist_imported_methods: Vec<WhitelistMethod>,
        whitelist_class_bindings: Vec<WhitelistClassBinding>,
        whitelist_instance_bindings: Vec<WhitelistInstanceBinding>,
    ) -> Result<Self> {
        let set = CapabilitySet::build(
            resolver,
            whitelist_classes,
            whitelist_imported_methods,
            whitelist_class_bindings,
            whitelist_instance_bindings,
        )?;
        Ok(Self::from(set))
    }

    pub fn base() -> Result<Self> {
        crate::base().map(Self::from)
    }

    pub fn resolver(&self) -> &Arc<dyn HostResolver> {
        self.allowlist.resolver()
    }

    pub fn whitelist_classes(&self) -> &[WhitelistClass] {
        self.allowlist.classes()
    }

    pub fn whitelist_imported_methods(&self) -> &[WhitelistMethod] {
        self.allowlist.imported_methods()
    }

    pub fn whitelist_class_bindings(&self) -> &[WhitelistClassBinding] {
        self.allowlist.class_bindings()
    }

    pub fn whitelist_instance_bindings(&self) -> &[WhitelistInstanceBinding] {
        self.allowlist.instance_bindings()
    }

    pub fn as_allowlist(&self) -> &CapabilitySet {
        &self.allowlist
    }

    pub fn into_allowlist(self) -> Arc<CapabilitySet> {
        self.allowlist
    }
}

impl From<CapabilitySet> for Whitelist {
    fn from(allowlist: CapabilitySet) -> Self {
        Self::from(Arc::new(allowlist))
    }
}

impl From<Arc<CapabilitySet>> for Whitelist {
    fn from(allowlist: Arc<CapabilitySet>) -> Self {
        Self { allowlist }
    }
}

impl From<Whitelist> for Arc<CapabilitySet> {
    fn from(whitelist: Whitelist) -> Self {
        whitelist.allowlist
    }
}

impl Serialize for Whitelist {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.allowlist.serialize(serializer)
    }
}

/// Deprecated name for [`Loader`].
#[deprecated(note = "renamed to `Loader`")]
#[derive(Default)]
pub struct WhitelistLoader {
    loader: Loader,
}

impl WhitelistLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_annotations(self, annotations: AnnotationRegistry) -> Self {
        Self {
            loader: self.loader.with_annotations(annotations),
        }
    }

    pub fn with_resolver(self, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            loader: self.loader.with_resolver(resolver),
        }
    }

    pub fn source(self, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            loader: self.loader.source(id, text),
        }
    }

    pub fn file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            loader: self.loader.file(path)?,
        })
    }

    pub fn instance_binding(self, binding: WhitelistInstanceBinding) -> Self {
        Self {
            loader: self.loader.instance_binding(binding),
        }
    }

    pub fn load(self) -> Result<Whitelist> {
        self.loader.load().map(Whitelist::from)
    }
}

/// Deprecated name for [`ContextRegistry`].
#[deprecated(note = "renamed to `ContextRegistry`")]
#[derive(Debug, Default)]
pub struct WhitelistRegistry {
    registry: ContextRegistry,
}

impl WhitelistRegistry {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            registry: ContextRegistry::new(resolver),
        }
    }

    pub fn register(&self, context: impl Into<String>, whitelists: Vec<Whitelist>) -> Result<()> {
        let sets = whitelists.into_iter().map(Whitelist::into_allowlist).collect();
        self.registry.register(context, sets)
    }

    pub fn lookup(&self, context: &str) -> Option<Whitelist> {
        self.registry.lookup(context).map(Whitelist::from)
    }

    pub fn contexts(&self) -> Vec<String> {
        self.registry.contexts()
    }

    pub fn as_registry(&self) -> &ContextRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Annotations, NameOnlyResolver, Origin};

    const SOURCE: &str = "class int {\n}\nclass my.Example @no_import {\n  ()\n  (int)\n  int add(int)\n}\nstatic_import {\n  int twice(int) from_class my.Util\n}\n";

    #[test]
    fn both_loaders_build_identical_sets() {
        let current = Loader::new().source("example.txt", SOURCE).load().unwrap();
        let deprecated = WhitelistLoader::new().source("example.txt", SOURCE).load().unwrap();
        assert_eq!(
            serde_json::to_string(&current).unwrap(),
            serde_json::to_string(&deprecated).unwrap()
        );
        assert_eq!(deprecated.whitelist_classes().len(), 2);
        assert_eq!(deprecated.whitelist_imported_methods().len(), 1);
    }

    #[test]
    fn constructor_goes_through_merge() {
        let origin = Origin::new("host", 1);
        let int = WhitelistClass::new(
            origin.clone(),
            "int",
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Annotations::new(),
        );
        let example = WhitelistClass::new(
            origin.clone(),
            "my.Example",
            vec![WhitelistConstructor::new(origin.clone(), vec!["int".into()], Annotations::new())],
            Vec::new(),
            vec![WhitelistField::new(origin, "int", "count", Annotations::new())],
            Annotations::new(),
        );

        let whitelist = Whitelist::new(
            Arc::new(NameOnlyResolver),
            vec![example.clone(), int.clone()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let allowlist = CapabilitySet::build(
            Arc::new(NameOnlyResolver),
            vec![example, int],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&whitelist).unwrap(),
            serde_json::to_value(&allowlist).unwrap()
        );
        assert_eq!(whitelist.whitelist_classes()[0].host_type(), "int");
    }

    #[test]
    fn registry_views_share_sets() {
        let registry = WhitelistRegistry::default();
        let whitelist = WhitelistLoader::new()
            .source("numbers.txt", "class int {\n}\n")
            .load()
            .unwrap();
        registry.register("score", vec![whitelist.clone()]).unwrap();

        let current = registry.as_registry().lookup("score").unwrap();
        assert!(Arc::ptr_eq(&current, &whitelist.into_allowlist()));
        assert_eq!(registry.contexts(), vec!["score"]);
    }

    struct Legacy;

    impl crate::Extension for Legacy {
        fn context_whitelists(&self) -> Vec<(String, Vec<Whitelist>)> {
            let whitelist = WhitelistLoader::new()
                .source("legacy.txt", "class long {\n}\n")
                .load()
                .unwrap();
            vec![("legacy".to_string(), vec![whitelist])]
        }
    }

    #[test]
    fn deprecated_extension_feeds_current_contributions() {
        let registry = ContextRegistry::default();
        registry.install(&Legacy).unwrap();
        assert!(registry.lookup("legacy").unwrap().class("long").is_some());
    }
}
