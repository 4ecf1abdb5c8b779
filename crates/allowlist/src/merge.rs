//! Merge and validation of raw declarations into one capability set.
//!
//! The merge runs once every source feeding a context has been parsed:
//!
//! 1. class declarations are grouped by host type and their members
//!    concatenated, rejecting arity and signature collisions;
//! 2. every class is registered under its canonical name and, unless it is
//!    `@no_import`, its short name, rejecting clashes between host types;
//! 3. every type reference is resolved against the registered names;
//! 4. imported methods and bindings are checked for name/arity collisions;
//! 5. class binding targets are checked against the resolver's view of them;
//! 6. the result is put in canonical order and verified against the host.
//!
//! When two declarations collide, the error points at the later one and
//! names the first-seen one as `existing`. Identical declarations collapse
//! into a single entry that keeps the first-seen origin.

use crate::model::{DEF_TYPE, element_type_name};
use crate::{
    Annotation, Annotations, CapabilitySet, Class, ClassBinding, Constructor, Declaration, Error,
    Field, HostResolver, InstanceBinding, Method, Origin, Result,
};
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type FunctionKey = (String, usize);

/// Merge raw declarations from any number of sources into one capability set.
#[tracing::instrument(level = "debug", skip_all, fields(declarations = declarations.len()))]
pub fn merge(
    resolver: Arc<dyn HostResolver>,
    declarations: Vec<Declaration>,
) -> Result<CapabilitySet> {
    let mut classes: IndexMap<String, ClassBuilder> = IndexMap::new();
    let mut functions = Functions::default();

    for declaration in declarations {
        check_names(&declaration)?;
        match declaration {
            Declaration::Class(class) => match classes.entry(class.host_type.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().absorb(class)?,
                Entry::Vacant(entry) => {
                    entry.insert(ClassBuilder::new(class)?);
                }
            },
            Declaration::ImportedMethod(method) => functions.add_imported(method)?,
            Declaration::ClassBinding(binding) => functions.add_class_binding(binding)?,
            Declaration::InstanceBinding(binding) => functions.add_instance_binding(binding)?,
        }
    }

    let classes: Vec<Class> = classes.into_values().map(ClassBuilder::finish).collect();
    let aliases = register_names(&classes)?;
    resolve_types(&classes, &functions, &aliases)?;

    for binding in functions.class_bindings.values() {
        check_binding_shape(resolver.as_ref(), binding)?;
    }

    let set = functions.finish(resolver, classes, aliases);
    set.verify()?;

    debug!(
        classes = set.classes().len(),
        aliases = set.aliases().count(),
        imported_methods = set.imported_methods().len(),
        class_bindings = set.class_bindings().len(),
        instance_bindings = set.instance_bindings().len(),
        "merged capability set"
    );
    Ok(set)
}

/// One logical class accumulated across sources.
struct ClassBuilder {
    origin: Origin,
    host_type: String,
    importable: bool,
    constructors: IndexMap<usize, Constructor>,
    methods: IndexMap<FunctionKey, Method>,
    fields: IndexMap<String, Field>,
    annotations: IndexMap<String, (Annotation, Origin)>,
}

impl ClassBuilder {
    fn new(class: Class) -> Result<Self> {
        let mut builder = Self {
            origin: class.origin.clone(),
            host_type: class.host_type.clone(),
            importable: class.is_importable(),
            constructors: IndexMap::new(),
            methods: IndexMap::new(),
            fields: IndexMap::new(),
            annotations: IndexMap::new(),
        };
        builder.absorb(class)?;
        Ok(builder)
    }

    fn absorb(&mut self, class: Class) -> Result<()> {
        if class.is_importable() != self.importable {
            return Err(Error::NameClash {
                origin: class.origin,
                existing: self.origin.clone(),
                name: self.host_type.clone(),
                message: format!(
                    "`{}` is declared both with and without @no_import",
                    self.host_type
                ),
            });
        }

        for (name, annotation) in class.annotations {
            match self.annotations.entry(name) {
                Entry::Occupied(entry) => {
                    let (existing, existing_origin) = entry.get();
                    if *existing != annotation {
                        return Err(Error::AnnotationConflict {
                            origin: class.origin.clone(),
                            existing: existing_origin.clone(),
                            owner: self.host_type.clone(),
                            name: entry.key().clone(),
                        });
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert((annotation, class.origin.clone()));
                }
            }
        }

        for constructor in class.constructors {
            self.add_constructor(constructor)?;
        }
        for method in class.methods {
            self.add_method(method)?;
        }
        for field in class.fields {
            self.add_field(field)?;
        }
        Ok(())
    }

    fn add_constructor(&mut self, constructor: Constructor) -> Result<()> {
        match self.constructors.entry(constructor.arity()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if !existing.same_as(&constructor) {
                    return Err(conflict(
                        &self.host_type,
                        constructor.origin(),
                        existing.origin(),
                        format!(
                            "constructors ({}) and ({}) have the same arity",
                            existing.parameters().join(", "),
                            constructor.parameters().join(", ")
                        ),
                    ));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(constructor);
            }
        }
        Ok(())
    }

    fn add_method(&mut self, method: Method) -> Result<()> {
        // Overloads differ in arity only and must agree on the return type.
        if let Some(overload) = self
            .methods
            .values()
            .find(|m| m.name() == method.name() && m.return_type() != method.return_type())
        {
            return Err(conflict(
                &self.host_type,
                method.origin(),
                overload.origin(),
                format!(
                    "overloads of `{}` return both `{}` and `{}`",
                    method.name(),
                    overload.return_type(),
                    method.return_type()
                ),
            ));
        }

        match self
            .methods
            .entry((method.name().to_string(), method.arity()))
        {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if !existing.same_as(&method) {
                    return Err(conflict(
                        &self.host_type,
                        method.origin(),
                        existing.origin(),
                        format!(
                            "method `{}` with arity {} is declared with different signatures",
                            method.name(),
                            method.arity()
                        ),
                    ));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(method);
            }
        }
        Ok(())
    }

    fn add_field(&mut self, field: Field) -> Result<()> {
        match self.fields.entry(field.name().to_string()) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if !existing.same_as(&field) {
                    return Err(conflict(
                        &self.host_type,
                        field.origin(),
                        existing.origin(),
                        format!("field `{}` is declared with different types", field.name()),
                    ));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(field);
            }
        }
        Ok(())
    }

    fn finish(self) -> Class {
        let mut constructors: Vec<Constructor> = self.constructors.into_values().collect();
        constructors.sort_by_key(Constructor::arity);

        let mut methods: Vec<Method> = self.methods.into_values().collect();
        methods.sort_by(|a, b| (a.name(), a.arity()).cmp(&(b.name(), b.arity())));

        let mut fields: Vec<Field> = self.fields.into_values().collect();
        fields.sort_by(|a, b| a.name().cmp(b.name()));

        let annotations: Annotations = self
            .annotations
            .into_iter()
            .map(|(name, (annotation, _))| (name, annotation))
            .collect();

        Class::new(
            self.origin,
            self.host_type,
            constructors,
            methods,
            fields,
            annotations,
        )
    }
}

/// Imported methods and bindings share one `name/arity` namespace.
#[derive(Default)]
struct Functions {
    imported: IndexMap<FunctionKey, Method>,
    class_bindings: IndexMap<FunctionKey, ClassBinding>,
    instance_bindings: IndexMap<FunctionKey, InstanceBinding>,
}

impl Functions {
    fn add_imported(&mut self, method: Method) -> Result<()> {
        let key = (method.name().to_string(), method.arity());
        if let Some(existing) = self
            .class_bindings
            .get(&key)
            .map(ClassBinding::origin)
            .or_else(|| self.instance_bindings.get(&key).map(InstanceBinding::origin))
        {
            return Err(function_conflict(method.origin(), existing, &key));
        }
        match self.imported.entry(key) {
            Entry::Occupied(entry) if !entry.get().same_as(&method) => Err(function_conflict(
                method.origin(),
                entry.get().origin(),
                entry.key(),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(method);
                Ok(())
            }
        }
    }

    fn add_class_binding(&mut self, binding: ClassBinding) -> Result<()> {
        let key = (binding.method_name().to_string(), binding.arity());
        if let Some(existing) = self
            .imported
            .get(&key)
            .map(Method::origin)
            .or_else(|| self.instance_bindings.get(&key).map(InstanceBinding::origin))
        {
            return Err(function_conflict(binding.origin(), existing, &key));
        }
        match self.class_bindings.entry(key) {
            Entry::Occupied(entry) if !entry.get().same_as(&binding) => Err(function_conflict(
                binding.origin(),
                entry.get().origin(),
                entry.key(),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(binding);
                Ok(())
            }
        }
    }

    fn add_instance_binding(&mut self, binding: InstanceBinding) -> Result<()> {
        let key = (binding.method_name().to_string(), binding.arity());
        if let Some(existing) = self
            .imported
            .get(&key)
            .map(Method::origin)
            .or_else(|| self.class_bindings.get(&key).map(ClassBinding::origin))
        {
            return Err(function_conflict(binding.origin(), existing, &key));
        }
        match self.instance_bindings.entry(key) {
            Entry::Occupied(entry) if !entry.get().same_as(&binding) => Err(function_conflict(
                binding.origin(),
                entry.get().origin(),
                entry.key(),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(binding);
                Ok(())
            }
        }
    }

    fn finish(
        self,
        resolver: Arc<dyn HostResolver>,
        mut classes: Vec<Class>,
        aliases: BTreeMap<String, String>,
    ) -> CapabilitySet {
        classes.sort_by(|a, b| a.host_type().cmp(b.host_type()));

        let mut imported: Vec<Method> = self.imported.into_values().collect();
        imported.sort_by(|a, b| (a.name(), a.arity()).cmp(&(b.name(), b.arity())));

        let mut class_bindings: Vec<ClassBinding> = self.class_bindings.into_values().collect();
        class_bindings.sort_by(|a, b| {
            (a.method_name(), a.arity()).cmp(&(b.method_name(), b.arity()))
        });

        let mut instance_bindings: Vec<InstanceBinding> =
            self.instance_bindings.into_values().collect();
        instance_bindings.sort_by(|a, b| {
            (a.method_name(), a.arity()).cmp(&(b.method_name(), b.arity()))
        });

        CapabilitySet::new(
            resolver,
            classes,
            aliases,
            imported,
            class_bindings,
            instance_bindings,
        )
    }
}

fn conflict(owner: &str, origin: &Origin, existing: &Origin, message: String) -> Error {
    Error::OverloadConflict {
        origin: origin.clone(),
        existing: existing.clone(),
        owner: owner.to_string(),
        message,
    }
}

fn function_conflict(origin: &Origin, existing: &Origin, key: &FunctionKey) -> Error {
    Error::OverloadConflict {
        origin: origin.clone(),
        existing: existing.clone(),
        owner: "static imports".to_string(),
        message: format!(
            "function `{}` with arity {} is declared with different signatures",
            key.0, key.1
        ),
    }
}

/// Names set by the public constructors are not checked by the parser.
fn check_names(declaration: &Declaration) -> Result<()> {
    match declaration {
        Declaration::Class(class) => {
            require(class.host_type(), "host type", class.origin())?;
            for constructor in class.constructors() {
                require_types(constructor.parameters(), constructor.origin())?;
            }
            for method in class.methods() {
                check_method_names(method)?;
            }
            for field in class.fields() {
                require(field.name(), "field name", field.origin())?;
                require(field.type_name(), "field type", field.origin())?;
            }
            Ok(())
        }
        Declaration::ImportedMethod(method) => check_method_names(method),
        Declaration::ClassBinding(binding) => {
            require(binding.target_type(), "binding target type", binding.origin())?;
            require(binding.method_name(), "method name", binding.origin())?;
            require(binding.return_type(), "return type", binding.origin())?;
            require_types(binding.parameters(), binding.origin())
        }
        Declaration::InstanceBinding(binding) => {
            require(binding.method_name(), "method name", binding.origin())?;
            require(binding.return_type(), "return type", binding.origin())?;
            require_types(binding.parameters(), binding.origin())
        }
    }
}

fn check_method_names(method: &Method) -> Result<()> {
    require(method.declaring_type(), "declaring type", method.origin())?;
    require(method.name(), "method name", method.origin())?;
    require(method.return_type(), "return type", method.origin())?;
    require_types(method.parameters(), method.origin())
}

fn require(value: &str, what: &str, origin: &Origin) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::syntax(origin.clone(), format!("missing {what}")));
    }
    Ok(())
}

fn require_types(type_names: &[String], origin: &Origin) -> Result<()> {
    type_names
        .iter()
        .try_for_each(|t| require(t, "parameter type", origin))
}

/// Map every script type name to the host type it denotes.
fn register_names(classes: &[Class]) -> Result<BTreeMap<String, String>> {
    let mut names: BTreeMap<String, (&str, &Origin)> = BTreeMap::new();

    for class in classes {
        let canonical = class.canonical_name();
        let short = class.short_name();
        let mut claimed = vec![canonical];
        if class.is_importable() && short != claimed[0] {
            claimed.push(short);
        }

        for name in claimed {
            if name == DEF_TYPE {
                return Err(Error::NameClash {
                    origin: class.origin().clone(),
                    existing: class.origin().clone(),
                    name,
                    message: format!(
                        "`{}` would shadow the dynamic type `{DEF_TYPE}`",
                        class.host_type()
                    ),
                });
            }
            match names.get(&name) {
                Some((host_type, existing)) if *host_type != class.host_type() => {
                    return Err(Error::NameClash {
                        origin: class.origin().clone(),
                        existing: (*existing).clone(),
                        message: format!(
                            "`{name}` refers to both `{host_type}` and `{}`",
                            class.host_type()
                        ),
                        name,
                    });
                }
                Some(_) => {}
                None => {
                    names.insert(name, (class.host_type(), class.origin()));
                }
            }
        }
    }

    Ok(names
        .into_iter()
        .map(|(name, (host_type, _))| (name, host_type.to_string()))
        .collect())
}

fn resolve_types(
    classes: &[Class],
    functions: &Functions,
    aliases: &BTreeMap<String, String>,
) -> Result<()> {
    let check = |type_name: &str, origin: &Origin| -> Result<()> {
        let element = element_type_name(type_name);
        if element == DEF_TYPE || aliases.contains_key(element) {
            Ok(())
        } else {
            Err(Error::UnresolvedType {
                origin: origin.clone(),
                type_name: type_name.to_string(),
            })
        }
    };
    let check_all = |type_names: &[String], origin: &Origin| -> Result<()> {
        type_names.iter().try_for_each(|t| check(t, origin))
    };

    for class in classes {
        for constructor in class.constructors() {
            check_all(constructor.parameters(), constructor.origin())?;
        }
        for method in class.methods() {
            check(method.return_type(), method.origin())?;
            check_all(method.parameters(), method.origin())?;
        }
        for field in class.fields() {
            check(field.type_name(), field.origin())?;
        }
    }
    for method in functions.imported.values() {
        check(method.return_type(), method.origin())?;
        check_all(method.parameters(), method.origin())?;
    }
    for binding in functions.class_bindings.values() {
        check(binding.return_type(), binding.origin())?;
        check_all(binding.parameters(), binding.origin())?;
    }
    for binding in functions.instance_bindings.values() {
        check(binding.return_type(), binding.origin())?;
        check_all(binding.parameters(), binding.origin())?;
    }
    Ok(())
}

/// A binding target needs exactly one public constructor and one public
/// method named like the binding, whose arities add up to the binding's.
fn check_binding_shape(resolver: &dyn HostResolver, binding: &ClassBinding) -> Result<()> {
    let Some(shape) = resolver.binding_shape(binding.target_type()) else {
        return Ok(());
    };
    let unsupported = |message: String| Error::UnsupportedBindingShape {
        origin: binding.origin().clone(),
        host_type: binding.target_type().to_string(),
        message,
    };

    let constructor_arity = match shape.constructors.as_slice() {
        [arity] => *arity,
        other => {
            return Err(unsupported(format!(
                "expected exactly one public constructor, found {}",
                other.len()
            )));
        }
    };
    let (method, method_arity) = match shape.methods.as_slice() {
        [(name, arity)] => (name, *arity),
        other => {
            return Err(unsupported(format!(
                "expected exactly one public method, found {}",
                other.len()
            )));
        }
    };
    if method != binding.method_name() {
        return Err(unsupported(format!(
            "public method is `{method}`, not `{}`",
            binding.method_name()
        )));
    }
    if constructor_arity + method_arity != binding.arity() {
        return Err(unsupported(format!(
            "expected {} parameters ({constructor_arity} for the constructor, \
             {method_arity} for the method), found {}",
            constructor_arity + method_arity,
            binding.arity()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{HostType, StaticResolver};
    use crate::{AnnotationRegistry, NameOnlyResolver};

    fn declarations(sources: &[&str]) -> Vec<Declaration> {
        let registry = AnnotationRegistry::base();
        sources
            .iter()
            .enumerate()
            .flat_map(|(i, text)| {
                crate::parse(&format!("source{i}.txt"), text, &registry).unwrap()
            })
            .collect()
    }

    fn merge_sources(sources: &[&str]) -> Result<CapabilitySet> {
        merge(Arc::new(NameOnlyResolver), declarations(sources))
    }

    #[test]
    fn merges_members_across_sources() {
        let set = merge_sources(&[
            "class int {\n}\nclass my.Example {\n  ()\n  int a()\n}",
            "class my.Example {\n  (int)\n  int b(int)\n  int value\n}",
        ])
        .unwrap();
        let example = set.class("Example").unwrap();
        assert_eq!(example.constructors().len(), 2);
        assert_eq!(example.methods().len(), 2);
        assert_eq!(example.fields().len(), 1);
        assert_eq!(example.origin().source(), "source0.txt");
    }

    #[test]
    fn identical_redeclarations_collapse() {
        let set = merge_sources(&[
            "class int {\n}\nclass my.Example {\n  ()\n  (int)\n}",
            "class my.Example {\n  ()\n  (int)\n}",
        ])
        .unwrap();
        let example = set.class("my.Example").unwrap();
        let arities: Vec<_> = example.constructors().iter().map(Constructor::arity).collect();
        assert_eq!(arities, vec![0, 1]);
        assert_eq!(example.constructor(1).unwrap().origin().source(), "source0.txt");
    }

    #[test]
    fn constructor_arity_collision() {
        let err = merge_sources(&[
            "class int {\n}\nclass long {\n}\nclass my.Example {\n  (int)\n}",
            "class my.Example {\n  (long)\n}",
        ])
        .unwrap_err();
        let Error::OverloadConflict { origin, existing, owner, .. } = err else {
            panic!("expected an overload conflict, got {err:?}");
        };
        assert_eq!(owner, "my.Example");
        assert_eq!(origin.source(), "source1.txt");
        assert_eq!(existing.source(), "source0.txt");
    }

    #[test]
    fn overloads_must_share_return_type() {
        let err = merge_sources(&["class int {\n}\nclass float {\n}\n\
             class my.Example {\n  int add(int)\n  float add(int, int)\n}"])
        .unwrap_err();
        assert!(matches!(err, Error::OverloadConflict { .. }));
    }

    #[test]
    fn field_type_collision() {
        let err = merge_sources(&[
            "class int {\n}\nclass long {\n}\nclass my.Example {\n  int value\n}",
            "class my.Example {\n  long value\n}",
        ])
        .unwrap_err();
        assert!(matches!(err, Error::OverloadConflict { .. }));
    }

    #[test]
    fn conflicting_no_import_markers() {
        let err = merge_sources(&[
            "class my.Example @no_import {\n}",
            "class my.Example {\n}",
        ])
        .unwrap_err();
        assert!(matches!(err, Error::NameClash { ref name, .. } if name == "my.Example"));
    }

    #[test]
    fn conflicting_class_annotations() {
        let err = merge_sources(&[
            "class my.Example @deprecated[message=\"a\"] {\n}",
            "class my.Example @deprecated[message=\"b\"] {\n}",
        ])
        .unwrap_err();
        assert!(matches!(err, Error::AnnotationConflict { .. }));
    }

    #[test]
    fn short_name_clash_between_host_types() {
        let err = merge_sources(&["class a.Thing {\n}\nclass b.Thing {\n}"]).unwrap_err();
        let Error::NameClash { name, origin, existing, .. } = err else {
            panic!("expected a name clash, got {err:?}");
        };
        assert_eq!(name, "Thing");
        assert_eq!(origin.line(), 3);
        assert_eq!(existing.line(), 1);
    }

    #[test]
    fn no_import_avoids_short_name_clash() {
        let set = merge_sources(&["class a.Thing {\n}\nclass b.Thing @no_import {\n}"]).unwrap();
        assert_eq!(set.host_type_of("Thing"), Some("a.Thing"));
        assert_eq!(set.host_type_of("b.Thing"), Some("b.Thing"));
    }

    #[test]
    fn def_cannot_be_declared() {
        assert!(matches!(
            merge_sources(&["class def {\n}"]),
            Err(Error::NameClash { .. })
        ));
    }

    #[test]
    fn short_name_cannot_shadow_def() {
        let err = merge_sources(&["class my.def {\n}\nclass my.Example {\n  def f(def)\n}\n"])
            .unwrap_err();
        let Error::NameClash { name, origin, .. } = err else {
            panic!("expected a name clash, got {err:?}");
        };
        assert_eq!(name, "def");
        assert_eq!(origin.line(), 1);
    }

    #[test]
    fn nested_def_is_importable_only_by_its_full_name() {
        let set = merge_sources(&["class my.def @no_import {\n}\n"]).unwrap();
        assert_eq!(set.host_type_of("my.def"), Some("my.def"));
        assert_eq!(set.host_type_of("def"), Some("def"));
        assert!(set.class("def").is_none());
    }

    #[test]
    fn constructed_declarations_need_names() {
        let origin = Origin::synthetic("host");
        let unnamed = Class::new(
            origin.clone(),
            "",
            Vec::new(),
            Vec::new(),
            Vec::new(),
            Annotations::new(),
        );
        let err = merge(Arc::new(NameOnlyResolver), vec![Declaration::Class(unnamed)]).unwrap_err();
        assert!(matches!(err, Error::Syntax { origin: ref at, .. } if *at == origin));

        let method = Method::new(
            origin.clone(),
            "my.Example",
            " ",
            "int",
            Vec::new(),
            Annotations::new(),
        );
        let example = Class::new(
            origin.clone(),
            "my.Example",
            Vec::new(),
            vec![method],
            Vec::new(),
            Annotations::new(),
        );
        let err = merge(Arc::new(NameOnlyResolver), vec![Declaration::Class(example)]).unwrap_err();
        let Error::Syntax { message, .. } = err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert_eq!(message, "missing method name");
    }

    #[test]
    fn types_resolve_across_sources_in_any_order() {
        let set = merge_sources(&[
            "class my.Example {\n  Other make(def[])\n}",
            "class my.Other {\n}",
        ])
        .unwrap();
        assert_eq!(set.classes().len(), 2);
    }

    #[test]
    fn unresolved_parameter_type() {
        let err = merge_sources(&["class int {\n}\nclass my.Example {\n  int f(int, Missing)\n}"])
            .unwrap_err();
        let Error::UnresolvedType { origin, type_name } = err else {
            panic!("expected an unresolved type, got {err:?}");
        };
        assert_eq!(type_name, "Missing");
        assert_eq!(origin.line(), 4);
    }

    #[test]
    fn imported_function_and_binding_share_namespace() {
        let err = merge_sources(&["class int {\n}\nstatic_import {\n\
             int f(int) from_class my.Util\n  int f(int) bound_to my.Counter\n}"])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::OverloadConflict { ref owner, .. } if owner == "static imports"
        ));
    }

    #[test]
    fn binding_shape_is_checked_when_resolver_can_see_it() {
        let resolver = StaticResolver::new()
            .with_type(HostType::new("int"))
            .with_type(
                HostType::new("my.Counter")
                    .constructor(&[])
                    .constructor(&["int"])
                    .method("count", &["int"]),
            );
        let source = "class int {\n}\nstatic_import {\n  int count(int) bound_to my.Counter\n}";
        let err = merge(Arc::new(resolver), declarations(&[source])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBindingShape { .. }));
    }

    #[test]
    fn binding_shape_arity_must_add_up() {
        let resolver = StaticResolver::new()
            .with_type(HostType::new("int"))
            .with_type(
                HostType::new("my.Counter")
                    .constructor(&["int"])
                    .method("count", &["int"]),
            );
        let source = "class int {\n}\nstatic_import {\n  int count(int) bound_to my.Counter\n}";
        let err = merge(Arc::new(resolver.clone()), declarations(&[source])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedBindingShape { .. }));

        let source =
            "class int {\n}\nstatic_import {\n  int count(int, int) bound_to my.Counter\n}";
        assert!(merge(Arc::new(resolver), declarations(&[source])).is_ok());
    }

    #[test]
    fn members_are_canonically_ordered() {
        let set = merge_sources(&["class int {\n}\nclass my.Example {\n  (int, int)\n  ()\n\
             int z()\n  int a(int)\n  int a()\n  int y\n  int b\n}"])
        .unwrap();
        let example = set.class("Example").unwrap();
        let constructors: Vec<_> = example.constructors().iter().map(Constructor::arity).collect();
        assert_eq!(constructors, vec![0, 2]);
        let methods: Vec<_> = example
            .methods()
            .iter()
            .map(|m| (m.name(), m.arity()))
            .collect();
        assert_eq!(methods, vec![("a", 0), ("a", 1), ("z", 0)]);
        let fields: Vec<_> = example.fields().iter().map(Field::name).collect();
        assert_eq!(fields, vec!["b", "y"]);
    }
}
