//! The capability model: classes, their members, and stateful bindings.
//!
//! Every entity is immutable once constructed. The same types describe raw
//! declarations coming out of the parser and the merged entries of a
//! [`CapabilitySet`](crate::CapabilitySet).

use crate::Origin;
use crate::annotation::{Annotations, NO_IMPORT};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The dynamic placeholder type; always resolvable, never declared.
pub const DEF_TYPE: &str = "def";

/// An already-constructed host object shared with an instance binding.
pub type HostInstance = Arc<dyn Any + Send + Sync>;

/// Script name of a host type: nested-type `$` separators become dots.
pub fn canonical_type_name(host_type: &str) -> String {
    host_type.replace('$', ".")
}

/// Short (unqualified) alias of a host type.
///
/// `host.util.Map$Entry` imports as `Map.Entry`.
pub fn short_type_name(host_type: &str) -> String {
    let tail = host_type.rsplit('.').next().unwrap_or(host_type);
    tail.replace('$', ".")
}

/// Strip `[]` suffixes from an array type name.
pub fn element_type_name(type_name: &str) -> &str {
    let mut name = type_name;
    while let Some(stripped) = name.strip_suffix("[]") {
        name = stripped;
    }
    name
}

/// A constructor, distinguished from its siblings by arity only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constructor {
    origin: Origin,
    parameters: Vec<String>,
    annotations: Annotations,
}

impl Constructor {
    pub fn new(origin: Origin, parameters: Vec<String>, annotations: Annotations) -> Self {
        Self {
            origin,
            parameters,
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Script type names of the parameters.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Same declaration apart from where it came from.
    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.parameters == other.parameters && self.annotations == other.annotations
    }
}

/// A method, imported function, or augmented method.
///
/// `declaring_type` equals the owning class for plain methods. For augmented
/// methods it names the host type holding the free function that is
/// invoked as if it were an instance method of the owner. For imported
/// methods it names the host type the function is taken from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    origin: Origin,
    declaring_type: String,
    name: String,
    return_type: String,
    parameters: Vec<String>,
    annotations: Annotations,
}

impl Method {
    pub fn new(
        origin: Origin,
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: Vec<String>,
        annotations: Annotations,
    ) -> Self {
        Self {
            origin,
            declaring_type: declaring_type.into(),
            name: name.into(),
            return_type: return_type.into(),
            parameters,
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Whether this method is an augmentation when owned by `owner`.
    pub fn is_augmented_for(&self, owner: &str) -> bool {
        self.declaring_type != owner
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.declaring_type == other.declaring_type
            && self.name == other.name
            && self.return_type == other.return_type
            && self.parameters == other.parameters
            && self.annotations == other.annotations
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    origin: Origin,
    type_name: String,
    name: String,
    annotations: Annotations,
}

impl Field {
    pub fn new(
        origin: Origin,
        type_name: impl Into<String>,
        name: impl Into<String>,
        annotations: Annotations,
    ) -> Self {
        Self {
            origin,
            type_name: type_name.into(),
            name: name.into(),
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.name == other.name
            && self.annotations == other.annotations
    }
}

/// An allowlisted host type with its reachable members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub(crate) origin: Origin,
    pub(crate) host_type: String,
    pub(crate) constructors: Vec<Constructor>,
    pub(crate) methods: Vec<Method>,
    pub(crate) fields: Vec<Field>,
    pub(crate) annotations: Annotations,
}

impl Class {
    pub fn new(
        origin: Origin,
        host_type: impl Into<String>,
        constructors: Vec<Constructor>,
        methods: Vec<Method>,
        fields: Vec<Field>,
        annotations: Annotations,
    ) -> Self {
        Self {
            origin,
            host_type: host_type.into(),
            constructors,
            methods,
            fields,
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Fully qualified host type name, as declared.
    pub fn host_type(&self) -> &str {
        &self.host_type
    }

    /// Fully qualified script name of this class.
    pub fn canonical_name(&self) -> String {
        canonical_type_name(&self.host_type)
    }

    /// Short alias of this class, registered unless it is `@no_import`.
    pub fn short_name(&self) -> String {
        short_type_name(&self.host_type)
    }

    pub fn is_importable(&self) -> bool {
        !self.annotations.contains_key(NO_IMPORT)
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn constructor(&self, arity: usize) -> Option<&Constructor> {
        self.constructors.iter().find(|c| c.arity() == arity)
    }

    pub fn method(&self, name: &str, arity: usize) -> Option<&Method> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.arity() == arity)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A call backed by a lazily constructed instance of `target_type`.
///
/// The parameter list is the constructor parameters followed by the method
/// parameters. The first call at a site constructs the instance; later calls
/// at that site reuse it (see [`CallSite`](crate::CallSite)).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBinding {
    origin: Origin,
    target_type: String,
    method_name: String,
    return_type: String,
    parameters: Vec<String>,
    annotations: Annotations,
}

impl ClassBinding {
    pub fn new(
        origin: Origin,
        target_type: impl Into<String>,
        method_name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: Vec<String>,
        annotations: Annotations,
    ) -> Self {
        Self {
            origin,
            target_type: target_type.into(),
            method_name: method_name.into(),
            return_type: return_type.into(),
            parameters,
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.target_type == other.target_type
            && self.method_name == other.method_name
            && self.return_type == other.return_type
            && self.parameters == other.parameters
            && self.annotations == other.annotations
    }
}

/// A call fixed to one host object supplied by the caller.
#[derive(Clone, Serialize)]
pub struct InstanceBinding {
    origin: Origin,
    #[serde(skip)]
    instance: HostInstance,
    method_name: String,
    return_type: String,
    parameters: Vec<String>,
    annotations: Annotations,
}

impl InstanceBinding {
    pub fn new(
        origin: Origin,
        instance: HostInstance,
        method_name: impl Into<String>,
        return_type: impl Into<String>,
        parameters: Vec<String>,
        annotations: Annotations,
    ) -> Self {
        Self {
            origin,
            instance,
            method_name: method_name.into(),
            return_type: return_type.into(),
            parameters,
            annotations,
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The bound object. Its identity never changes for this binding.
    pub fn instance(&self) -> &HostInstance {
        &self.instance
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Whether both bindings share the very same host object.
    pub fn same_instance(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(&other.instance))
    }

    pub(crate) fn same_as(&self, other: &Self) -> bool {
        self.same_instance(other)
            && self.method_name == other.method_name
            && self.return_type == other.return_type
            && self.parameters == other.parameters
            && self.annotations == other.annotations
    }
}

impl PartialEq for InstanceBinding {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.same_as(other)
    }
}

impl fmt::Debug for InstanceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceBinding")
            .field("origin", &self.origin)
            .field("instance", &Arc::as_ptr(&self.instance))
            .field("method_name", &self.method_name)
            .field("return_type", &self.return_type)
            .field("parameters", &self.parameters)
            .field("annotations", &self.annotations)
            .finish()
    }
}

/// One raw declaration, as produced per source before merging.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Class(Class),
    ImportedMethod(Method),
    ClassBinding(ClassBinding),
    InstanceBinding(InstanceBinding),
}

impl Declaration {
    pub fn origin(&self) -> &Origin {
        match self {
            Declaration::Class(class) => class.origin(),
            Declaration::ImportedMethod(method) => method.origin(),
            Declaration::ClassBinding(binding) => binding.origin(),
            Declaration::InstanceBinding(binding) => binding.origin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Annotation;

    #[test]
    fn naming_of_nested_host_types() {
        assert_eq!(canonical_type_name("host.util.Map$Entry"), "host.util.Map.Entry");
        assert_eq!(short_type_name("host.util.Map$Entry"), "Map.Entry");
        assert_eq!(short_type_name("int"), "int");
        assert_eq!(element_type_name("def[][]"), "def");
    }

    #[test]
    fn no_import_marks_class_non_importable() {
        let mut annotations = Annotations::new();
        annotations.insert(NO_IMPORT.into(), Annotation::NoImport);
        let class = Class::new(
            Origin::new("test", 1),
            "my.Example",
            vec![],
            vec![],
            vec![],
            annotations,
        );
        assert!(!class.is_importable());
        assert_eq!(class.short_name(), "Example");
    }

    #[test]
    fn augmented_methods_have_foreign_declaring_type() {
        let method = Method::new(
            Origin::new("test", 3),
            "some.other.Class",
            "sub",
            "int",
            vec!["int".into()],
            Annotations::new(),
        );
        assert!(method.is_augmented_for("my.Example"));
        assert!(!method.is_augmented_for("some.other.Class"));
    }

    #[test]
    fn instance_binding_identity() {
        let shared: HostInstance = Arc::new(5_i32);
        let a = InstanceBinding::new(
            Origin::synthetic("a"),
            shared.clone(),
            "get",
            "int",
            vec![],
            Annotations::new(),
        );
        let b = InstanceBinding::new(
            Origin::synthetic("b"),
            Arc::new(5_i32),
            "get",
            "int",
            vec![],
            Annotations::new(),
        );
        assert!(a.same_instance(&a.clone()));
        assert!(!a.same_instance(&b));
        assert!(Arc::ptr_eq(a.instance(), &shared));
    }
}
