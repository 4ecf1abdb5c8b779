//! Single-pass parser turning one source into raw declarations.
//!
//! A source is a sequence of blocks:
//!
//! ```text
//! # comment
//! class my.pkg.Example @no_import {
//!   ()                                 # constructor
//!   (int, def)
//!   int add(int, def)                  # method
//!   int some.other.Util.sub(int)       # augmented method
//!   def value @deprecated[message="use getValue"]   # field
//! }
//!
//! static_import {
//!   double max(double, double) from_class host.lang.Math
//!   int count(int, int) bound_to my.pkg.Counter
//! }
//! ```
//!
//! Only grammar shape is checked here. Whether the referenced types exist,
//! and whether overloads collide, is decided once every source is merged.

use crate::lexer::{Token, TokenKind, tokenize};
use crate::{
    AnnotationRegistry, Annotations, Class, ClassBinding, Constructor, Declaration, Error, Field,
    Method, Origin, Result,
};

const CLASS: &str = "class";
const STATIC_IMPORT: &str = "static_import";
const FROM_CLASS: &str = "from_class";
const BOUND_TO: &str = "bound_to";

/// Parse one source into its declarations, in source order.
pub fn parse(
    source: &str,
    text: &str,
    annotations: &AnnotationRegistry,
) -> Result<Vec<Declaration>> {
    let tokens = tokenize(source, text)?;
    let last_line = text.lines().count().max(1);
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        last_line,
        annotations,
    };
    let declarations = parser.parse_source()?;
    tracing::trace!(source, declarations = declarations.len(), "parsed source");
    Ok(declarations)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    last_line: usize,
    annotations: &'a AnnotationRegistry,
}

impl<'a> Parser<'a> {
    fn parse_source(&mut self) -> Result<Vec<Declaration>> {
        let mut declarations = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Ident(CLASS) => {
                    declarations.push(Declaration::Class(self.parse_class()?));
                }
                TokenKind::Ident(STATIC_IMPORT) => self.parse_static_import(&mut declarations)?,
                other => {
                    return Err(self.error_at(
                        token.line,
                        format!(
                            "expected `{CLASS}` or `{STATIC_IMPORT}`, found {}",
                            other.describe()
                        ),
                    ));
                }
            }
        }
        Ok(declarations)
    }

    fn parse_class(&mut self) -> Result<Class> {
        let start = self.bump()?;
        let origin = self.origin(start.line);
        let host_type = self.expect_ident("a class name")?;
        if host_type.ends_with('.') || host_type.starts_with('.') {
            return Err(self.error_at(start.line, format!("invalid class name `{host_type}`")));
        }
        let annotations = self.parse_annotations()?;
        self.expect(TokenKind::LBrace, "`{` to open the class body")?;

        let mut constructors = Vec::new();
        let mut methods = Vec::new();
        let mut fields = Vec::new();

        loop {
            let token = self.peek_or_eof("`}` to close the class body")?;
            match token.kind {
                TokenKind::RBrace => {
                    self.bump()?;
                    break;
                }
                TokenKind::LParen => {
                    let origin = self.origin(token.line);
                    let parameters = self.parse_parameters()?;
                    let annotations = self.parse_annotations()?;
                    constructors.push(Constructor::new(origin, parameters, annotations));
                }
                TokenKind::Ident(_) => {
                    let origin = self.origin(token.line);
                    let type_name = self.parse_type()?;
                    let name_token = self.bump()?;
                    let TokenKind::Ident(name) = name_token.kind else {
                        return Err(self.unexpected(name_token, "a member name"));
                    };

                    if self.at_on_line(TokenKind::LParen, name_token.line) {
                        // <ret> <owner>.<name>(...) or <ret> <name>(...)
                        let (declaring_type, name) = match name.rsplit_once('.') {
                            Some((owner, method)) => (owner.to_string(), method),
                            None => (host_type.to_string(), name),
                        };
                        methods.push(self.parse_method_tail(
                            origin,
                            declaring_type,
                            name,
                            type_name,
                        )?);
                    } else if let Some(method) = self.peek_augmented_name(name_token.line) {
                        // <ret> <owner> <name>(...)
                        self.bump()?;
                        methods.push(self.parse_method_tail(
                            origin,
                            name.to_string(),
                            method,
                            type_name,
                        )?);
                    } else {
                        if name.contains('.') {
                            return Err(self.error_at(
                                name_token.line,
                                format!("invalid field name `{name}`"),
                            ));
                        }
                        let annotations = self.parse_annotations()?;
                        fields.push(Field::new(origin, type_name, name, annotations));
                    }
                }
                _ => {
                    return Err(self.unexpected(token, "a constructor, method, field, or `}`"));
                }
            }
        }

        Ok(Class::new(
            origin,
            host_type,
            constructors,
            methods,
            fields,
            annotations,
        ))
    }

    fn parse_method_tail(
        &mut self,
        origin: Origin,
        declaring_type: String,
        name: &str,
        return_type: String,
    ) -> Result<Method> {
        if declaring_type.is_empty() || name.is_empty() {
            return Err(Error::syntax(origin, "invalid method name"));
        }
        let parameters = self.parse_parameters()?;
        let annotations = self.parse_annotations()?;
        Ok(Method::new(
            origin,
            declaring_type,
            name,
            return_type,
            parameters,
            annotations,
        ))
    }

    fn parse_static_import(&mut self, declarations: &mut Vec<Declaration>) -> Result<()> {
        self.bump()?;
        self.expect(TokenKind::LBrace, "`{` to open the static_import body")?;

        loop {
            let token = self.peek_or_eof("`}` to close the static_import body")?;
            if token.kind == TokenKind::RBrace {
                self.bump()?;
                return Ok(());
            }

            let origin = self.origin(token.line);
            let return_type = self.parse_type()?;
            let name = self.expect_ident("a function name")?;
            if name.contains('.') {
                return Err(Error::syntax(origin, format!("invalid function name `{name}`")));
            }
            let parameters = self.parse_parameters()?;
            let qualifier = self.expect_ident("`from_class` or `bound_to`")?;
            let target = self.expect_ident("a host type name")?;
            let annotations = self.parse_annotations()?;

            let declaration = match qualifier {
                FROM_CLASS => Declaration::ImportedMethod(Method::new(
                    origin,
                    target,
                    name,
                    return_type,
                    parameters,
                    annotations,
                )),
                BOUND_TO => Declaration::ClassBinding(ClassBinding::new(
                    origin,
                    target,
                    name,
                    return_type,
                    parameters,
                    annotations,
                )),
                other => {
                    return Err(Error::syntax(
                        origin,
                        format!("expected `{FROM_CLASS}` or `{BOUND_TO}`, found `{other}`"),
                    ));
                }
            };
            declarations.push(declaration);
        }
    }

    /// `( type, type, ... )`
    fn parse_parameters(&mut self) -> Result<Vec<String>> {
        self.expect(TokenKind::LParen, "`(`")?;
        let mut parameters = Vec::new();
        if self.at(TokenKind::RParen) {
            self.bump()?;
            return Ok(parameters);
        }
        loop {
            parameters.push(self.parse_type()?);
            let token = self.bump()?;
            match token.kind {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(parameters),
                _ => return Err(self.unexpected(token, "`,` or `)`")),
            }
        }
    }

    /// A type name with optional `[]` suffixes.
    fn parse_type(&mut self) -> Result<String> {
        let mut name = self.expect_ident("a type name")?.to_string();
        while self.at(TokenKind::LBracket) {
            self.bump()?;
            self.expect(TokenKind::RBracket, "`]`")?;
            name.push_str("[]");
        }
        Ok(name)
    }

    /// Zero or more `@name` / `@name[key="value", ...]`.
    fn parse_annotations(&mut self) -> Result<Annotations> {
        let mut annotations = Annotations::new();
        while let Some(token) = self.peek() {
            let TokenKind::Annotation(name) = token.kind else {
                break;
            };
            self.bump()?;
            let origin = self.origin(token.line);

            let mut arguments = Vec::new();
            if self.at(TokenKind::LBracket) {
                self.bump()?;
                loop {
                    let key = self.expect_ident("an annotation argument name")?;
                    self.expect(TokenKind::Equals, "`=`")?;
                    let value_token = self.bump()?;
                    let TokenKind::Str(value) = value_token.kind else {
                        return Err(self.unexpected(value_token, "a quoted argument value"));
                    };
                    arguments.push((key.to_string(), value.to_string()));
                    let token = self.bump()?;
                    match token.kind {
                        TokenKind::Comma => continue,
                        TokenKind::RBracket => break,
                        _ => return Err(self.unexpected(token, "`,` or `]`")),
                    }
                }
            }

            let annotation = match self.annotations.parse(name, &arguments) {
                None => {
                    return Err(Error::UnknownAnnotation {
                        origin,
                        name: name.to_string(),
                    });
                }
                Some(Err(message)) => {
                    return Err(Error::InvalidAnnotation {
                        origin,
                        name: name.to_string(),
                        message,
                    });
                }
                Some(Ok(annotation)) => annotation,
            };
            if annotations.insert(name.to_string(), annotation).is_some() {
                return Err(Error::syntax(origin, format!("duplicate annotation @{name}")));
            }
        }
        Ok(annotations)
    }

    /// `<owner> <name>(` continuing on `line`, for the space-separated augmented form.
    fn peek_augmented_name(&self, line: usize) -> Option<&'a str> {
        let next = self.tokens.get(self.pos)?;
        let after = self.tokens.get(self.pos + 1)?;
        match (next.kind, after.kind) {
            (TokenKind::Ident(name), TokenKind::LParen)
                if next.line == line && after.line == line && !name.contains('.') =>
            {
                Some(name)
            }
            _ => None,
        }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_or_eof(&self, expected: &str) -> Result<Token<'a>> {
        self.peek().ok_or_else(|| self.eof(expected))
    }

    fn at(&self, kind: TokenKind<'_>) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn at_on_line(&self, kind: TokenKind<'_>, line: usize) -> bool {
        self.peek().is_some_and(|t| t.kind == kind && t.line == line)
    }

    fn bump(&mut self) -> Result<Token<'a>> {
        let token = self.peek().ok_or_else(|| self.eof("more input"))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind<'_>, expected: &str) -> Result<Token<'a>> {
        let token = self.bump()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(token, expected))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<&'a str> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            _ => Err(self.unexpected(token, expected)),
        }
    }

    fn origin(&self, line: usize) -> Origin {
        Origin::new(self.source, line)
    }

    fn error_at(&self, line: usize, message: impl Into<String>) -> Error {
        Error::syntax(self.origin(line), message)
    }

    fn unexpected(&self, token: Token<'_>, expected: &str) -> Error {
        self.error_at(
            token.line,
            format!("expected {expected}, found {}", token.kind.describe()),
        )
    }

    fn eof(&self, expected: &str) -> Error {
        self.error_at(
            self.last_line,
            format!("expected {expected}, found end of source"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Annotation;

    fn parse_base(text: &str) -> Result<Vec<Declaration>> {
        parse("test.txt", text, &AnnotationRegistry::base())
    }

    fn single_class(text: &str) -> Class {
        let mut declarations = parse_base(text).unwrap();
        assert_eq!(declarations.len(), 1);
        match declarations.remove(0) {
            Declaration::Class(class) => class,
            other => panic!("expected a class, got {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_all_member_kinds() {
        let class = single_class(
            r#"
# complex types
class my.package.Example @no_import {
  # constructors
  ()
  (int)
  (def, def)

  Example add(int, def)
  void example() @deprecated[message="use example2 instead"]
  Example some.other.Class.sub(Example, int, def)

  int value0
  def[] value2
}
"#,
        );
        assert_eq!(class.host_type(), "my.package.Example");
        assert!(!class.is_importable());
        assert_eq!(class.constructors().len(), 3);
        assert_eq!(class.methods().len(), 3);
        assert_eq!(class.fields().len(), 2);
        assert_eq!(class.origin().line(), 3);

        let sub = class.method("sub", 3).unwrap();
        assert_eq!(sub.declaring_type(), "some.other.Class");
        assert!(sub.is_augmented_for(class.host_type()));

        let example = class.method("example", 0).unwrap();
        assert_eq!(example.declaring_type(), "my.package.Example");
        assert_eq!(
            example.annotations().get("deprecated"),
            Some(&Annotation::Deprecated {
                message: "use example2 instead".into()
            })
        );
        assert_eq!(class.field("value2").unwrap().type_name(), "def[]");
    }

    #[test]
    fn space_separated_augmented_method() {
        let class = single_class("class my.Example {\n  int some.other.Class sub(int)\n}\n");
        let sub = class.method("sub", 1).unwrap();
        assert_eq!(sub.declaring_type(), "some.other.Class");
    }

    #[test]
    fn single_line_class_body() {
        let class = single_class("class my.Example @no_import { () (int) int add(int) }");
        assert_eq!(class.constructors().len(), 2);
        assert_eq!(class.method("add", 1).unwrap().return_type(), "int");
    }

    #[test]
    fn field_followed_by_constructor_on_next_line() {
        let class = single_class("class my.Example {\n  int value\n  (int)\n}");
        assert_eq!(class.fields().len(), 1);
        assert_eq!(class.constructors().len(), 1);
        assert!(class.methods().is_empty());
    }

    #[test]
    fn parses_static_import_block() {
        let declarations = parse_base(
            "static_import {\n  double max(double, double) from_class host.lang.Math\n  int count(int, int) bound_to my.Counter @nondeterministic\n}\n",
        )
        .unwrap();
        assert_eq!(declarations.len(), 2);
        let Declaration::ImportedMethod(max) = &declarations[0] else {
            panic!("expected an imported method");
        };
        assert_eq!(max.declaring_type(), "host.lang.Math");
        assert_eq!(max.arity(), 2);
        let Declaration::ClassBinding(count) = &declarations[1] else {
            panic!("expected a class binding");
        };
        assert_eq!(count.target_type(), "my.Counter");
        assert_eq!(count.origin().line(), 3);
        assert!(count.annotations().contains_key("nondeterministic"));
    }

    #[test]
    fn unknown_static_import_qualifier() {
        let err = parse_base("static_import {\n  int f() from my.Util\n}").unwrap_err();
        assert!(matches!(err, Error::Syntax { ref origin, .. } if origin.line() == 2));
    }

    #[test]
    fn unknown_annotation_is_reported() {
        let err = parse_base("class a.B @sealed {\n}").unwrap_err();
        assert!(matches!(err, Error::UnknownAnnotation { ref name, .. } if name == "sealed"));
    }

    #[test]
    fn invalid_annotation_arguments_are_reported() {
        let err = parse_base("class a.B {\n  void f() @deprecated\n}").unwrap_err();
        assert!(matches!(err, Error::InvalidAnnotation { ref origin, .. } if origin.line() == 2));
    }

    #[test]
    fn duplicate_annotation_is_a_syntax_error() {
        let err = parse_base("class a.B @no_import @no_import {\n}").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        let err = parse_base("class a.B {\n  int f(int\n}").unwrap_err();
        let Error::Syntax { origin, message } = err else {
            panic!("expected a syntax error");
        };
        assert_eq!(origin.source(), "test.txt");
        assert_eq!(origin.line(), 3);
        assert!(message.contains("`,` or `)`"), "{message}");
    }

    #[test]
    fn missing_closing_brace_fails_at_end_of_source() {
        let err = parse_base("class a.B {\n  int f()\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { ref origin, .. } if origin.line() == 2));
    }

    #[test]
    fn top_level_garbage_fails() {
        assert!(matches!(
            parse_base("interface a.B {\n}"),
            Err(Error::Syntax { .. })
        ));
    }

    #[test]
    fn unresolved_types_are_not_a_parse_concern() {
        let class = single_class("class a.B {\n  Nowhere f(Elsewhere)\n}");
        assert_eq!(class.method("f", 1).unwrap().return_type(), "Nowhere");
    }
}
