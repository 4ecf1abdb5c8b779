//! Host symbol resolution seam.
//!
//! The allowlist only ever deals in names. Whether a declared type or member
//! really exists on the host is answered by a [`HostResolver`] injected by
//! the embedding application.

use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An invocable or inspectable handle produced by a resolver.
pub type HostHandle = Arc<dyn Any + Send + Sync>;

/// A host symbol named by an allowlist declaration.
///
/// Parameter lists hold host type names (script aliases already resolved).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSymbol<'a> {
    Type {
        host_type: &'a str,
    },
    Constructor {
        host_type: &'a str,
        parameters: &'a [String],
    },
    /// A method of `host_type`. When `declaring_type` differs, the method is a
    /// free function of `declaring_type` taking the receiver as its first argument.
    Method {
        host_type: &'a str,
        declaring_type: &'a str,
        name: &'a str,
        parameters: &'a [String],
    },
    Field {
        host_type: &'a str,
        name: &'a str,
    },
}

impl fmt::Display for HostSymbol<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostSymbol::Type { host_type } => write!(f, "{host_type}"),
            HostSymbol::Constructor {
                host_type,
                parameters,
            } => write!(f, "{host_type}({})", parameters.join(", ")),
            HostSymbol::Method {
                host_type,
                declaring_type,
                name,
                parameters,
            } if host_type == declaring_type => {
                write!(f, "{host_type}.{name}({})", parameters.join(", "))
            }
            HostSymbol::Method {
                host_type,
                declaring_type,
                name,
                parameters,
            } => write!(
                f,
                "{declaring_type}.{name}({host_type}{}{})",
                if parameters.is_empty() { "" } else { ", " },
                parameters.join(", ")
            ),
            HostSymbol::Field { host_type, name } => write!(f, "{host_type}.{name}"),
        }
    }
}

/// Public surface of a class binding target, as seen by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BindingShape {
    /// Arity of every public constructor.
    pub constructors: Vec<usize>,
    /// Name and arity of every public, non-inherited method.
    pub methods: Vec<(String, usize)>,
}

/// Resolves declared names against the host.
pub trait HostResolver: Send + Sync {
    /// Resolve one symbol, or explain why it does not exist.
    fn resolve(&self, symbol: &HostSymbol<'_>) -> Result<HostHandle, String>;

    /// Describe the public surface of a class binding target.
    ///
    /// `None` means the resolver cannot inspect the type; the binding shape
    /// is then left to the consuming compiler.
    fn binding_shape(&self, host_type: &str) -> Option<BindingShape> {
        let _ = host_type;
        None
    }
}

/// Accepts every name. Used when the host checks symbols itself later on.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOnlyResolver;

impl HostResolver for NameOnlyResolver {
    fn resolve(&self, symbol: &HostSymbol<'_>) -> Result<HostHandle, String> {
        Ok(Arc::new(symbol.to_string()))
    }
}

/// Description of one host type for [`StaticResolver`].
#[derive(Debug, Clone, Default)]
pub struct HostType {
    name: String,
    constructors: Vec<Vec<String>>,
    methods: Vec<(String, Vec<String>)>,
    fields: Vec<String>,
}

impl HostType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn constructor(mut self, parameters: &[&str]) -> Self {
        self.constructors.push(owned(parameters));
        self
    }

    pub fn method(mut self, name: impl Into<String>, parameters: &[&str]) -> Self {
        self.methods.push((name.into(), owned(parameters)));
        self
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }
}

fn owned(parameters: &[&str]) -> Vec<String> {
    parameters.iter().map(|p| p.to_string()).collect()
}

/// Table-driven resolver over a fixed set of host type descriptions.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    types: HashMap<String, HostType>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, host_type: HostType) -> Self {
        self.types.insert(host_type.name.clone(), host_type);
        self
    }

    fn host_type(&self, name: &str) -> Result<&HostType, String> {
        self.types
            .get(name)
            .ok_or_else(|| format!("host type `{name}` does not exist"))
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, symbol: &HostSymbol<'_>) -> Result<HostHandle, String> {
        let found = match *symbol {
            HostSymbol::Type { host_type } => {
                self.host_type(host_type)?;
                true
            }
            HostSymbol::Constructor {
                host_type,
                parameters,
            } => self
                .host_type(host_type)?
                .constructors
                .iter()
                .any(|c| c.as_slice() == parameters),
            HostSymbol::Method {
                host_type,
                declaring_type,
                name,
                parameters,
            } => {
                let declaring = self.host_type(declaring_type)?;
                // Augmented methods take the receiver as their first argument.
                let expected: Vec<String> = if declaring_type == host_type {
                    parameters.to_vec()
                } else {
                    std::iter::once(host_type.to_string())
                        .chain(parameters.iter().cloned())
                        .collect()
                };
                declaring
                    .methods
                    .iter()
                    .any(|(n, p)| n == name && *p == expected)
            }
            HostSymbol::Field { host_type, name } => self
                .host_type(host_type)?
                .fields
                .iter()
                .any(|f| f == name),
        };

        if found {
            Ok(Arc::new(symbol.to_string()))
        } else {
            Err("no matching host member".to_string())
        }
    }

    fn binding_shape(&self, host_type: &str) -> Option<BindingShape> {
        let described = self.types.get(host_type)?;
        Some(BindingShape {
            constructors: described.constructors.iter().map(Vec::len).collect(),
            methods: described
                .methods
                .iter()
                .map(|(name, parameters)| (name.clone(), parameters.len()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        owned(items)
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with_type(HostType::new("int"))
            .with_type(
                HostType::new("my.Example")
                    .constructor(&[])
                    .constructor(&["int"])
                    .method("add", &["int"])
                    .field("value"),
            )
            .with_type(HostType::new("my.Util").method("twice", &["my.Example", "int"]))
    }

    #[test]
    fn resolves_declared_members() {
        let resolver = resolver();
        let params = strings(&["int"]);
        assert!(resolver.resolve(&HostSymbol::Type { host_type: "int" }).is_ok());
        assert!(resolver
            .resolve(&HostSymbol::Constructor {
                host_type: "my.Example",
                parameters: &params,
            })
            .is_ok());
        assert!(resolver
            .resolve(&HostSymbol::Field {
                host_type: "my.Example",
                name: "value",
            })
            .is_ok());
    }

    #[test]
    fn augmented_methods_take_receiver_first() {
        let resolver = resolver();
        let params = strings(&["int"]);
        let symbol = HostSymbol::Method {
            host_type: "my.Example",
            declaring_type: "my.Util",
            name: "twice",
            parameters: &params,
        };
        assert!(resolver.resolve(&symbol).is_ok());
        assert_eq!(symbol.to_string(), "my.Util.twice(my.Example, int)");
    }

    #[test]
    fn missing_members_fail() {
        let resolver = resolver();
        let params = strings(&["int", "int"]);
        assert!(resolver
            .resolve(&HostSymbol::Method {
                host_type: "my.Example",
                declaring_type: "my.Example",
                name: "add",
                parameters: &params,
            })
            .is_err());
        assert!(resolver.resolve(&HostSymbol::Type { host_type: "nope" }).is_err());
    }

    #[test]
    fn binding_shape_reports_arity() {
        let shape = resolver().binding_shape("my.Example").unwrap();
        assert_eq!(shape.constructors, vec![0, 1]);
        assert_eq!(shape.methods, vec![("add".to_string(), 1)]);
        assert!(NameOnlyResolver.binding_shape("my.Example").is_none());
    }
}
