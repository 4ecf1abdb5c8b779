//! The merged, immutable capability set.

use crate::model::{DEF_TYPE, element_type_name};
use crate::resolver::{HostHandle, HostSymbol};
use crate::{
    Class, ClassBinding, Declaration, Error, HostResolver, InstanceBinding, Method,
    NameOnlyResolver, Origin, Result,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Everything a sandboxed script in one context is allowed to reach.
///
/// A capability set is only ever produced by a successful merge, so every
/// type it mentions resolves and every overload is legal. It is deeply
/// immutable and can be shared across threads freely; reloading produces a
/// new set instead of mutating this one.
#[derive(Clone, Serialize)]
pub struct CapabilitySet {
    #[serde(skip)]
    resolver: Arc<dyn HostResolver>,
    classes: Vec<Class>,
    aliases: BTreeMap<String, String>,
    imported_methods: Vec<Method>,
    class_bindings: Vec<ClassBinding>,
    instance_bindings: Vec<InstanceBinding>,
}

impl CapabilitySet {
    pub(crate) fn new(
        resolver: Arc<dyn HostResolver>,
        classes: Vec<Class>,
        aliases: BTreeMap<String, String>,
        imported_methods: Vec<Method>,
        class_bindings: Vec<ClassBinding>,
        instance_bindings: Vec<InstanceBinding>,
    ) -> Self {
        Self {
            resolver,
            classes,
            aliases,
            imported_methods,
            class_bindings,
            instance_bindings,
        }
    }

    /// Build a capability set from already constructed entities.
    ///
    /// The entities go through the same merge and validation as parsed
    /// sources do.
    pub fn build(
        resolver: Arc<dyn HostResolver>,
        classes: Vec<Class>,
        imported_methods: Vec<Method>,
        class_bindings: Vec<ClassBinding>,
        instance_bindings: Vec<InstanceBinding>,
    ) -> Result<Self> {
        let declarations = classes
            .into_iter()
            .map(Declaration::Class)
            .chain(imported_methods.into_iter().map(Declaration::ImportedMethod))
            .chain(class_bindings.into_iter().map(Declaration::ClassBinding))
            .chain(instance_bindings.into_iter().map(Declaration::InstanceBinding))
            .collect();
        crate::merge(resolver, declarations)
    }

    /// A set that allows nothing but the dynamic type.
    pub fn empty() -> Self {
        Self::new(
            Arc::new(NameOnlyResolver),
            Vec::new(),
            BTreeMap::new(),
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    /// The host resolver this set was validated against.
    pub fn resolver(&self) -> &Arc<dyn HostResolver> {
        &self.resolver
    }

    /// Classes ordered by host type name.
    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    /// Look a class up by any script name: canonical or short alias.
    pub fn class(&self, name: &str) -> Option<&Class> {
        let host_type = self.aliases.get(name)?;
        self.class_by_host_type(host_type)
    }

    pub fn class_by_host_type(&self, host_type: &str) -> Option<&Class> {
        self.classes
            .binary_search_by(|c| c.host_type().cmp(host_type))
            .ok()
            .map(|index| &self.classes[index])
    }

    /// Every registered script type name with the host type it denotes.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases
            .iter()
            .map(|(name, host_type)| (name.as_str(), host_type.as_str()))
    }

    /// Host type denoted by a script type name, without array suffixes.
    pub fn host_type_of(&self, name: &str) -> Option<&str> {
        if name == DEF_TYPE {
            return Some(DEF_TYPE);
        }
        self.aliases.get(name).map(String::as_str)
    }

    /// Host type denoted by a script type name, keeping array suffixes.
    pub fn resolve_type(&self, name: &str) -> Option<String> {
        let element = element_type_name(name);
        let host_type = self.host_type_of(element)?;
        Some(format!("{host_type}{}", &name[element.len()..]))
    }

    pub fn imported_methods(&self) -> &[Method] {
        &self.imported_methods
    }

    pub fn imported_method(&self, name: &str, arity: usize) -> Option<&Method> {
        self.imported_methods
            .iter()
            .find(|m| m.name() == name && m.arity() == arity)
    }

    pub fn class_bindings(&self) -> &[ClassBinding] {
        &self.class_bindings
    }

    pub fn class_binding(&self, name: &str, arity: usize) -> Option<&ClassBinding> {
        self.class_bindings
            .iter()
            .find(|b| b.method_name() == name && b.arity() == arity)
    }

    pub fn instance_bindings(&self) -> &[InstanceBinding] {
        &self.instance_bindings
    }

    pub fn instance_binding(&self, name: &str, arity: usize) -> Option<&InstanceBinding> {
        self.instance_bindings
            .iter()
            .find(|b| b.method_name() == name && b.arity() == arity)
    }

    /// Decompose into declarations, so several sets can be merged again.
    pub fn declarations(&self) -> Vec<Declaration> {
        self.classes
            .iter()
            .cloned()
            .map(Declaration::Class)
            .chain(
                self.imported_methods
                    .iter()
                    .cloned()
                    .map(Declaration::ImportedMethod),
            )
            .chain(
                self.class_bindings
                    .iter()
                    .cloned()
                    .map(Declaration::ClassBinding),
            )
            .chain(
                self.instance_bindings
                    .iter()
                    .cloned()
                    .map(Declaration::InstanceBinding),
            )
            .collect()
    }

    /// Check every declared symbol against the host resolver.
    ///
    /// A class binding's constructor and method are only checked when the
    /// resolver describes the target's shape, since that shape is what
    /// splits the parameter list between the two. Instance bindings are not
    /// checked: their receiver is an opaque host object with no declared type.
    pub fn verify(&self) -> Result<()> {
        for class in &self.classes {
            let host_type = class.host_type();
            self.resolve_symbol(&HostSymbol::Type { host_type }, class.origin())?;

            for constructor in class.constructors() {
                let parameters = self.host_types(constructor.parameters());
                self.resolve_symbol(
                    &HostSymbol::Constructor {
                        host_type,
                        parameters: &parameters,
                    },
                    constructor.origin(),
                )?;
            }
            for method in class.methods() {
                let parameters = self.host_types(method.parameters());
                self.resolve_symbol(
                    &HostSymbol::Method {
                        host_type,
                        declaring_type: method.declaring_type(),
                        name: method.name(),
                        parameters: &parameters,
                    },
                    method.origin(),
                )?;
            }
            for field in class.fields() {
                self.resolve_symbol(
                    &HostSymbol::Field {
                        host_type,
                        name: field.name(),
                    },
                    field.origin(),
                )?;
            }
        }

        for method in &self.imported_methods {
            let parameters = self.host_types(method.parameters());
            self.resolve_symbol(
                &HostSymbol::Method {
                    host_type: method.declaring_type(),
                    declaring_type: method.declaring_type(),
                    name: method.name(),
                    parameters: &parameters,
                },
                method.origin(),
            )?;
        }
        for binding in &self.class_bindings {
            self.verify_class_binding(binding)?;
        }
        Ok(())
    }

    fn verify_class_binding(&self, binding: &ClassBinding) -> Result<()> {
        let host_type = binding.target_type();
        self.resolve_symbol(&HostSymbol::Type { host_type }, binding.origin())?;

        let Some(shape) = self.resolver.binding_shape(host_type) else {
            return Ok(());
        };
        let [constructor_arity] = shape.constructors.as_slice() else {
            return Ok(());
        };
        if *constructor_arity > binding.arity() {
            return Ok(());
        }
        let parameters = self.host_types(binding.parameters());
        let (constructor, method) = parameters.split_at(*constructor_arity);
        self.resolve_symbol(
            &HostSymbol::Constructor {
                host_type,
                parameters: constructor,
            },
            binding.origin(),
        )?;
        self.resolve_symbol(
            &HostSymbol::Method {
                host_type,
                declaring_type: host_type,
                name: binding.method_name(),
                parameters: method,
            },
            binding.origin(),
        )?;
        Ok(())
    }

    fn host_types(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .map(|name| self.resolve_type(name).unwrap_or_else(|| name.clone()))
            .collect()
    }

    fn resolve_symbol(&self, symbol: &HostSymbol<'_>, origin: &Origin) -> Result<HostHandle> {
        self.resolver
            .resolve(symbol)
            .map_err(|message| Error::UnresolvedSymbol {
                origin: origin.clone(),
                symbol: symbol.to_string(),
                message,
            })
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilitySet")
            .field("classes", &self.classes.len())
            .field("imported_methods", &self.imported_methods.len())
            .field("class_bindings", &self.class_bindings.len())
            .field("instance_bindings", &self.instance_bindings.len())
            .finish_non_exhaustive()
    }
}
