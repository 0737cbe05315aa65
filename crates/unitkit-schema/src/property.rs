//! Typed property values carried by capabilities and environments.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Version;

/// Property bag keyed by name.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    /// Free text.
    String(String),
    /// A version, compared with version ordering in filters.
    Version(Version),
    /// A signed integer, compared numerically in filters.
    Integer(i64),
    /// A boolean flag.
    Boolean(bool),
    /// Several values; a filter item matches if any element matches.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    /// The text, for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The version, for version values.
    pub fn as_version(&self) -> Option<&Version> {
        match self {
            Self::Version(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Version(v) => write!(f, "{v}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Version> for PropertyValue {
    fn from(v: Version) -> Self {
        Self::Version(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
