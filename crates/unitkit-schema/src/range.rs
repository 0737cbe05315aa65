//! Version intervals.
//!
//! Text forms:
//! - `[1.0,2.0)` / `(1.0,2.0]`: interval with explicit inclusivity
//! - `1.0`: at least `1.0`, i.e. `[1.0,MAX]`
//! - `*` or empty: [`VersionRange::EMPTY`], which admits every version

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{SchemaError, Version};

static LOWEST: Version = Version::MIN;
static HIGHEST: Version = Version::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Span {
    Any,
    Interval {
        lower: Version,
        lower_inclusive: bool,
        upper: Version,
        upper_inclusive: bool,
    },
}

/// A closed, open or half-open interval over [`Version`].
///
/// [`VersionRange::EMPTY`] is a distinguished value: an explicitly built
/// `[MIN,MAX]` interval admits the same versions but is not equal to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange(Span);

impl VersionRange {
    /// The unconstrained range. Includes every version.
    pub const EMPTY: Self = Self(Span::Any);

    /// Build an interval.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvertedRange`] if `lower > upper`, or if the
    /// bounds are equal and either side is exclusive.
    pub fn new(
        lower: Version,
        lower_inclusive: bool,
        upper: Version,
        upper_inclusive: bool,
    ) -> Result<Self, SchemaError> {
        let admits_nothing = match lower.cmp(&upper) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => !(lower_inclusive && upper_inclusive),
            std::cmp::Ordering::Less => false,
        };
        if admits_nothing {
            return Err(SchemaError::InvertedRange {
                lower: lower.to_string(),
                upper: upper.to_string(),
            });
        }

        Ok(Self(Span::Interval {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
        }))
    }

    /// `[v,v]`
    pub fn exact(v: Version) -> Self {
        Self(Span::Interval {
            lower: v.clone(),
            lower_inclusive: true,
            upper: v,
            upper_inclusive: true,
        })
    }

    /// `[v,MAX]`
    pub fn at_least(v: Version) -> Self {
        Self(Span::Interval {
            lower: v,
            lower_inclusive: true,
            upper: Version::MAX,
            upper_inclusive: true,
        })
    }

    /// `[MIN,v)`: everything strictly older than `v`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvertedRange`] if `v` is the minimum version.
    pub fn below(v: Version) -> Result<Self, SchemaError> {
        Self::new(Version::MIN, true, v, false)
    }

    /// Parse the text form described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidRange`] for malformed brackets or a
    /// missing comma, [`SchemaError::InvalidVersion`] for a bad bound, and
    /// [`SchemaError::InvertedRange`] for an interval admitting nothing.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::EMPTY);
        }

        let lower_inclusive = match s.as_bytes()[0] {
            b'[' => true,
            b'(' => false,
            _ => return Ok(Self::at_least(Version::parse(s)?)),
        };

        let invalid = |reason: &str| SchemaError::InvalidRange {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let upper_inclusive = if s.ends_with(']') {
            true
        } else if s.ends_with(')') {
            false
        } else {
            return Err(invalid("missing closing bracket"));
        };

        let body = &s[1..s.len() - 1];
        let (lower, upper) = body
            .split_once(',')
            .ok_or_else(|| invalid("expected two comma-separated bounds"))?;

        Self::new(
            Version::parse(lower.trim())?,
            lower_inclusive,
            Version::parse(upper.trim())?,
            upper_inclusive,
        )
    }

    /// Whether this is the canonical [`VersionRange::EMPTY`] value.
    pub fn is_empty_range(&self) -> bool {
        matches!(self.0, Span::Any)
    }

    /// Lower bound. [`Version::MIN`] for the empty range.
    pub fn lower(&self) -> &Version {
        match &self.0 {
            Span::Any => &LOWEST,
            Span::Interval { lower, .. } => lower,
        }
    }

    /// Whether the lower bound itself is included.
    pub fn lower_inclusive(&self) -> bool {
        match &self.0 {
            Span::Any => true,
            Span::Interval {
                lower_inclusive, ..
            } => *lower_inclusive,
        }
    }

    /// Upper bound. [`Version::MAX`] for the empty range.
    pub fn upper(&self) -> &Version {
        match &self.0 {
            Span::Any => &HIGHEST,
            Span::Interval { upper, .. } => upper,
        }
    }

    /// Whether the upper bound itself is included.
    pub fn upper_inclusive(&self) -> bool {
        match &self.0 {
            Span::Any => true,
            Span::Interval {
                upper_inclusive, ..
            } => *upper_inclusive,
        }
    }

    /// Inclusion test.
    pub fn includes(&self, v: &Version) -> bool {
        match &self.0 {
            Span::Any => true,
            Span::Interval {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => {
                let above = if *lower_inclusive { v >= lower } else { v > lower };
                let below = if *upper_inclusive { v <= upper } else { v < upper };
                above && below
            }
        }
    }

    /// The versions admitted by both ranges, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.is_empty_range() {
            return Some(other.clone());
        }
        if other.is_empty_range() {
            return Some(self.clone());
        }

        let (lower, lower_inclusive) = match self.lower().cmp(other.lower()) {
            std::cmp::Ordering::Greater => (self.lower(), self.lower_inclusive()),
            std::cmp::Ordering::Less => (other.lower(), other.lower_inclusive()),
            std::cmp::Ordering::Equal => (
                self.lower(),
                self.lower_inclusive() && other.lower_inclusive(),
            ),
        };
        let (upper, upper_inclusive) = match self.upper().cmp(other.upper()) {
            std::cmp::Ordering::Less => (self.upper(), self.upper_inclusive()),
            std::cmp::Ordering::Greater => (other.upper(), other.upper_inclusive()),
            std::cmp::Ordering::Equal => (
                self.upper(),
                self.upper_inclusive() && other.upper_inclusive(),
            ),
        };

        Self::new(lower.clone(), lower_inclusive, upper.clone(), upper_inclusive).ok()
    }
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Span::Any => f.write_str("*"),
            Span::Interval {
                lower,
                lower_inclusive: true,
                upper,
                upper_inclusive: true,
            } if upper.is_max() => write!(f, "{lower}"),
            Span::Interval {
                lower,
                lower_inclusive,
                upper,
                upper_inclusive,
            } => write!(
                f,
                "{}{lower},{upper}{}",
                if *lower_inclusive { '[' } else { '(' },
                if *upper_inclusive { ']' } else { ')' },
            ),
        }
    }
}

impl FromStr for VersionRange {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
