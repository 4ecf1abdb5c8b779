//! Tokenizer for the declaration grammar.

use crate::{Error, Origin, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind<'a> {
    /// A name: keyword, type name, qualified name, member name, or argument key.
    Ident(&'a str),
    /// `@name`, without the `@`.
    Annotation(&'a str),
    /// A double-quoted string, without the quotes.
    Str(&'a str),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Equals,
}

impl TokenKind<'_> {
    pub(crate) fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("`{name}`"),
            TokenKind::Annotation(name) => format!("`@{name}`"),
            TokenKind::Str(value) => format!("\"{value}\""),
            TokenKind::LParen => "`(`".to_string(),
            TokenKind::RParen => "`)`".to_string(),
            TokenKind::LBrace => "`{`".to_string(),
            TokenKind::RBrace => "`}`".to_string(),
            TokenKind::LBracket => "`[`".to_string(),
            TokenKind::RBracket => "`]`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Equals => "`=`".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub line: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '.'
}

/// Split one source into tokens. `#` starts a comment running to end of line.
pub(crate) fn tokenize<'a>(source: &str, text: &'a str) -> Result<Vec<Token<'a>>> {
    let mut tokens = Vec::new();

    for (index, line_text) in text.lines().enumerate() {
        let line = index + 1;
        let mut chars = line_text.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            let kind = match c {
                '#' => break,
                c if c.is_whitespace() => {
                    chars.next();
                    continue;
                }
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                '=' => TokenKind::Equals,
                '"' => {
                    chars.next();
                    let body_start = start + 1;
                    let mut end = None;
                    for (i, ch) in chars.by_ref() {
                        if ch == '"' {
                            end = Some(i);
                            break;
                        }
                    }
                    let Some(end) = end else {
                        return Err(Error::syntax(
                            Origin::new(source, line),
                            "unterminated string literal",
                        ));
                    };
                    tokens.push(Token {
                        kind: TokenKind::Str(&line_text[body_start..end]),
                        line,
                    });
                    continue;
                }
                '@' => {
                    chars.next();
                    let name_start = start + 1;
                    let mut end = name_start;
                    while let Some(&(i, ch)) = chars.peek() {
                        if ch.is_alphanumeric() || ch == '_' {
                            end = i + ch.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    if end == name_start {
                        return Err(Error::syntax(
                            Origin::new(source, line),
                            "expected an annotation name after `@`",
                        ));
                    }
                    tokens.push(Token {
                        kind: TokenKind::Annotation(&line_text[name_start..end]),
                        line,
                    });
                    continue;
                }
                c if is_name_char(c) => {
                    let mut end = start;
                    while let Some(&(i, ch)) = chars.peek() {
                        if is_name_char(ch) {
                            end = i + ch.len_utf8();
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    tokens.push(Token {
                        kind: TokenKind::Ident(&line_text[start..end]),
                        line,
                    });
                    continue;
                }
                other => {
                    return Err(Error::syntax(
                        Origin::new(source, line),
                        format!("unexpected character `{other}`"),
                    ));
                }
            };
            chars.next();
            tokens.push(Token { kind, line });
        }
    }

    Ok(tokens)
}
