//! Reader for the KeyValues text format steamcmd prints for `app_info_print`.
//!
//! Only the subset app info actually uses is supported:
//! - nested `"key" { ... }` trees with ordered children
//! - quoted scalars (with `\"`, `\\`, `\n`, `\t` escapes) and bare words
//! - `//` line comments
//! - `[$WIN32]`-style platform conditionals, which are skipped
//!
//! A document is exactly one root property. Anything after it is ignored,
//! which matches how the tool output is framed once the log chatter around
//! the body has been cut away.
//!
//! # Examples
//!
//! ```
//! use appinfo_cache::vdf;
//!
//! let root = vdf::parse(r#""440" { "common" { "type" "Game" } }"#).unwrap();
//! assert_eq!(root.key, "440");
//! assert_eq!(
//!     root.value.get_path(&["common", "type"]).and_then(|v| v.as_str()),
//!     Some("Game")
//! );
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use thiserror::Error;

/// A node value: either a scalar leaf or an ordered list of child properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Tree(Vec<Property>),
}

/// A key and its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub key: String,
    pub value: Value,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("no key/value body found in tool output")]
    MissingBody,
}

impl Value {
    /// Look up a direct child by key (ASCII case-insensitive, first match wins)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Tree(children) => find(children, key),
            Value::Scalar(_) => None,
        }
    }

    /// Walk a chain of keys
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Tree(_) => None,
        }
    }

    /// Child properties; empty for a scalar
    pub fn children(&self) -> &[Property] {
        match self {
            Value::Tree(children) => children,
            Value::Scalar(_) => &[],
        }
    }
}

pub(crate) fn find<'a>(children: &'a [Property], key: &str) -> Option<&'a Value> {
    children
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(key))
        .map(|p| &p.value)
}

/// Parse a single root property
pub fn parse(text: &str) -> Result<Property, ParseError> {
    Parser { text, pos: 0 }.root()
}

#[derive(Debug, PartialEq)]
enum Token {
    Str(String),
    Open,
    Close,
    Eof,
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let consumed = &self.text[..self.pos];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rsplit('\n')
            .next()
            .map_or(0, |l| l.chars().count())
            + 1;
        ParseError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            let rest = self.rest();
            if rest.starts_with("//") {
                self.pos += rest.find('\n').unwrap_or(rest.len());
            } else if rest.starts_with("[$") || rest.starts_with("[!$") {
                match rest.find(']') {
                    Some(end) => self.pos += end + 1,
                    None => return Err(self.error("unterminated conditional")),
                }
            } else if let Some(c) = self.peek().filter(|c| c.is_whitespace() || *c == '\u{feff}') {
                self.pos += c.len_utf8();
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            None => Ok(Token::Eof),
            Some('{') => {
                self.bump();
                Ok(Token::Open)
            }
            Some('}') => {
                self.bump();
                Ok(Token::Close)
            }
            Some('"') => {
                self.bump();
                self.quoted().map(Token::Str)
            }
            Some(_) => Ok(Token::Str(self.bare())),
        }
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    // Unknown escapes are kept verbatim
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(self.error("unterminated string")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | '"'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_string()
    }

    fn root(&mut self) -> Result<Property, ParseError> {
        match self.next_token()? {
            Token::Str(key) => {
                let value = self.value()?;
                Ok(Property { key, value })
            }
            Token::Eof => Err(self.error("empty document")),
            Token::Open | Token::Close => Err(self.error("expected a key")),
        }
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        match self.next_token()? {
            Token::Str(s) => Ok(Value::Scalar(s)),
            Token::Open => self.children().map(Value::Tree),
            Token::Close => Err(self.error("expected a value, found '}'")),
            Token::Eof => Err(self.error("unexpected end of input, expected a value")),
        }
    }

    fn children(&mut self) -> Result<Vec<Property>, ParseError> {
        let mut children = Vec::new();
        loop {
            match self.next_token()? {
                Token::Close => return Ok(children),
                Token::Str(key) => {
                    let value = self.value()?;
                    children.push(Property { key, value });
                }
                Token::Open => return Err(self.error("expected a key, found '{'")),
                Token::Eof => return Err(self.error("unexpected end of input, missing '}'")),
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_property(f: &mut fmt::Formatter<'_>, property: &Property, depth: usize) -> fmt::Result {
    let indent = "\t".repeat(depth);
    f.write_str(&indent)?;
    write_quoted(f, &property.key)?;
    match &property.value {
        Value::Scalar(s) => {
            f.write_str("\t\t")?;
            write_quoted(f, s)?;
            f.write_str("\n")
        }
        Value::Tree(children) => {
            writeln!(f)?;
            writeln!(f, "{indent}{{")?;
            for child in children {
                write_property(f, child, depth + 1)?;
            }
            writeln!(f, "{indent}}}")
        }
    }
}

/// Writes the property back out as KeyValues text
impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_property(f, self, 0)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Scalar(s) => serializer.serialize_str(s),
            Value::Tree(children) => serialize_children(children, serializer),
        }
    }
}

/// Ordered JSON object; duplicate keys are emitted as they appear
pub(crate) fn serialize_children<S: Serializer>(
    children: &[Property],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(children.len()))?;
    for child in children {
        map.serialize_entry(&child.key, &child.value)?;
    }
    map.end()
}
