//! LDAP-style filter expressions.
//!
//! Used for environment filters on requirements and units, and for
//! property-based requirement matching:
//!
//! ```text
//! (&(os=linux)(|(arch=x86_64)(arch=aarch64))(!(headless=true)))
//! ```
//!
//! Supported items: `=`, `~=` (case and whitespace insensitive), `>=`, `<=`,
//! presence `(key=*)` and substrings `(key=pre*mid*suf)`. A backslash
//! escapes the next character. Attribute names match case-insensitively.
//! Values are coerced to the property's type before comparing, so
//! `(version>=1.10)` compares versions, not strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Properties, PropertyValue, SchemaError, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Equal,
    Approx,
    GreaterEq,
    LessEq,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::Approx => "~=",
            Self::GreaterEq => ">=",
            Self::LessEq => "<=",
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            Self::Equal | Self::Approx => ord == Ordering::Equal,
            Self::GreaterEq => ord != Ordering::Less,
            Self::LessEq => ord != Ordering::Greater,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
    Compare { key: String, op: Op, value: String },
    Present { key: String },
    Substring { key: String, parts: Vec<String> },
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter(Node);

impl Filter {
    /// Parse a filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidFilter`] with the byte offset where
    /// parsing stopped.
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        let mut parser = Parser { input, pos: 0 };
        let node = parser.filter()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("trailing characters after filter"));
        }
        Ok(Self(node))
    }

    /// Evaluate the filter against a property set.
    pub fn matches(&self, properties: &Properties) -> bool {
        self.0.eval(properties)
    }
}

impl Node {
    fn eval(&self, props: &Properties) -> bool {
        match self {
            Self::And(nodes) => nodes.iter().all(|n| n.eval(props)),
            Self::Or(nodes) => nodes.iter().any(|n| n.eval(props)),
            Self::Not(node) => !node.eval(props),
            Self::Present { key } => lookup(props, key).is_some(),
            Self::Compare { key, op, value } => {
                lookup(props, key).is_some_and(|p| compare(p, *op, value))
            }
            Self::Substring { key, parts } => {
                lookup(props, key).is_some_and(|p| substring(p, parts))
            }
        }
    }
}

fn lookup<'p>(props: &'p Properties, key: &str) -> Option<&'p PropertyValue> {
    props.get(key).or_else(|| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn compare(prop: &PropertyValue, op: Op, value: &str) -> bool {
    match prop {
        PropertyValue::List(items) => items.iter().any(|item| compare(item, op, value)),
        PropertyValue::String(s) => match op {
            Op::Approx => approx(s) == approx(value),
            _ => op.accepts(s.as_str().cmp(value)),
        },
        PropertyValue::Version(v) => {
            Version::parse(value.trim()).is_ok_and(|other| op.accepts(v.cmp(&other)))
        }
        PropertyValue::Integer(i) => value
            .trim()
            .parse::<i64>()
            .is_ok_and(|other| op.accepts(i.cmp(&other))),
        PropertyValue::Boolean(b) => {
            matches!(op, Op::Equal | Op::Approx)
                && value
                    .trim()
                    .eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
    }
}

fn approx(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn substring(prop: &PropertyValue, parts: &[String]) -> bool {
    match prop {
        PropertyValue::List(items) => items.iter().any(|item| substring(item, parts)),
        other => wildcard(parts, &other.to_string()),
    }
}

/// `parts` always has at least two entries: prefix, middles..., suffix.
fn wildcard(parts: &[String], text: &str) -> bool {
    let Some((first, rest)) = parts.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return text == first;
    };
    let Some(mut remaining) = text.strip_prefix(first.as_str()) else {
        return false;
    };
    for part in middle {
        match remaining.find(part.as_str()) {
            Some(at) => remaining = &remaining[at + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(last.as_str())
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &'static str) -> SchemaError {
        SchemaError::InvalidFilter {
            input: self.input.to_string(),
            offset: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, want: char, reason: &'static str) -> Result<(), SchemaError> {
        if self.peek() == Some(want) {
            self.bump();
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    fn filter(&mut self) -> Result<Node, SchemaError> {
        self.skip_ws();
        self.expect('(', "expected '('")?;
        self.skip_ws();
        let node = match self.peek() {
            Some('&') => {
                self.bump();
                Node::And(self.list()?)
            }
            Some('|') => {
                self.bump();
                Node::Or(self.list()?)
            }
            Some('!') => {
                self.bump();
                Node::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of input")),
        };
        self.skip_ws();
        self.expect(')', "expected ')'")?;
        Ok(node)
    }

    fn list(&mut self) -> Result<Vec<Node>, SchemaError> {
        let mut nodes = Vec::new();
        self.skip_ws();
        while self.peek() == Some('(') {
            nodes.push(self.filter()?);
            self.skip_ws();
        }
        if nodes.is_empty() {
            return Err(self.error("empty operand list"));
        }
        Ok(nodes)
    }

    fn item(&mut self) -> Result<Node, SchemaError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.bump();
        }
        let key = self.input[start..self.pos].trim().to_string();
        if key.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.bump() {
            Some('=') => Op::Equal,
            Some('~') => {
                self.expect('=', "expected '=' after '~'")?;
                Op::Approx
            }
            Some('>') => {
                self.expect('=', "expected '=' after '>'")?;
                Op::GreaterEq
            }
            Some('<') => {
                self.expect('=', "expected '=' after '<'")?;
                Op::LessEq
            }
            _ => return Err(self.error("expected comparison operator")),
        };

        let parts = self.value()?;
        Ok(match op {
            Op::Equal if parts.len() == 2 && parts.iter().all(String::is_empty) => {
                Node::Present { key }
            }
            Op::Equal if parts.len() > 1 => Node::Substring { key, parts },
            _ => Node::Compare {
                key,
                op,
                value: parts.join("*"),
            },
        })
    }

    /// Reads up to the closing `)`, splitting on unescaped `*`.
    fn value(&mut self) -> Result<Vec<String>, SchemaError> {
        let mut parts = Vec::new();
        let mut current = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped '(' in value")),
                Some('*') => {
                    self.bump();
                    parts.push(std::mem::take(&mut current));
                }
                Some('\\') => {
                    self.bump();
                    let escaped = self.bump().ok_or_else(|| self.error("dangling escape"))?;
                    current.push(escaped);
                }
                Some(c) => {
                    self.bump();
                    current.push(c);
                }
            }
        }
        parts.push(current);
        Ok(parts)
    }
}

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if matches!(c, '\\' | '(' | ')' | '*') {
                f.write_str("\\")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(nodes) | Self::Or(nodes) => {
                f.write_str(if matches!(self, Self::And(_)) { "(&" } else { "(|" })?;
                for node in nodes {
                    write!(f, "{node}")?;
                }
                f.write_str(")")
            }
            Self::Not(node) => write!(f, "(!{node})"),
            Self::Compare { key, op, value } => {
                write!(f, "({key}{}{})", op.symbol(), Escaped(value))
            }
            Self::Present { key } => write!(f, "({key}=*)"),
            Self::Substring { key, parts } => {
                write!(f, "({key}=")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str("*")?;
                    }
                    write!(f, "{}", Escaped(part))?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Filter {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
