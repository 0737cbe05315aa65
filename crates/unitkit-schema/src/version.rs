//! Totally ordered unit versions.
//!
//! Numeric versions (`1`, `1.2`, `1.2-rc`, `1.2.3`, `1.2.3-rc.1`,
//! `1.2.3.qualifier`) are normalised to semver and compared with semver rules. Anything else is
//! kept as a raw string that sorts after every numeric version. Two sentinels
//! bracket the whole space.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SchemaError;

/// Ordering follows variant order: `Min < Parsed < Raw < Max`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Repr {
    Min,
    Parsed(semver::Version),
    Raw(String),
    Max,
}

/// A version value with a strict total order.
///
/// # Example
///
/// ```
/// use unitkit_schema::Version;
///
/// let a: Version = "1.2".parse().unwrap();
/// let b: Version = "1.10.0".parse().unwrap();
/// assert!(a < b);
/// assert!(Version::EMPTY < a);
/// assert!(b < Version::MAX);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(Repr);

impl Version {
    /// Lowest possible version.
    pub const MIN: Self = Self(Repr::Min);

    /// Highest possible version.
    pub const MAX: Self = Self(Repr::Max);

    /// The unspecified version. Identical to [`Version::MIN`].
    pub const EMPTY: Self = Self::MIN;

    /// Build a numeric version from its three components.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Repr::Parsed(semver::Version::new(major, minor, patch)))
    }

    /// Parse a version string.
    ///
    /// The empty string and `MIN` yield [`Version::EMPTY`], `MAX` yields
    /// [`Version::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidVersion`] if the text contains
    /// whitespace, one of the range delimiters `[]() ,`, or the `*`
    /// wildcard.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        match s {
            "" | "MIN" => return Ok(Self::MIN),
            "MAX" => return Ok(Self::MAX),
            _ => {}
        }

        if s
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ',' | '*'))
        {
            return Err(SchemaError::InvalidVersion(s.to_string()));
        }

        if let Ok(v) = semver::Version::parse(s) {
            return Ok(Self(Repr::Parsed(v)));
        }

        Ok(Self(
            parse_dotted(s).map_or_else(|| Repr::Raw(s.to_string()), Repr::Parsed),
        ))
    }

    /// Whether this is the unspecified (minimum) version.
    pub fn is_empty(&self) -> bool {
        matches!(self.0, Repr::Min)
    }

    /// Whether this is the maximum sentinel.
    pub fn is_max(&self) -> bool {
        matches!(self.0, Repr::Max)
    }

    /// The semver form, for numeric versions.
    pub fn as_semver(&self) -> Option<&semver::Version> {
        match &self.0 {
            Repr::Parsed(v) => Some(v),
            _ => None,
        }
    }
}

/// Dotted numeric versions with fewer than three components, optionally
/// followed by a `-pre` or `+build` suffix, or with a fourth `.qualifier`
/// segment carried as build metadata.
fn parse_dotted(s: &str) -> Option<semver::Version> {
    let (core, suffix) = s.split_at(s.find(['-', '+']).unwrap_or(s.len()));
    let mut parts = core.splitn(4, '.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;

    let mut version = semver::Version::new(major, minor, patch);
    if let Some(qualifier) = parts.next() {
        // A qualifier may itself contain `-`, so it takes the rest of the text.
        version.build = semver::BuildMetadata::new(&format!("{qualifier}{suffix}")).ok()?;
        return Some(version);
    }

    let (pre, build) = match suffix.split_once('+') {
        Some((pre, build)) => (pre, Some(build)),
        None => (suffix, None),
    };
    if let Some(pre) = pre.strip_prefix('-') {
        if pre.is_empty() {
            return None;
        }
        version.pre = semver::Prerelease::new(pre).ok()?;
    }
    if let Some(build) = build {
        if build.is_empty() {
            return None;
        }
        version.build = semver::BuildMetadata::new(build).ok()?;
    }
    Some(version)
}

impl Default for Version {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Min => f.write_str("MIN"),
            Repr::Parsed(v) => write!(f, "{v}"),
            Repr::Raw(s) => f.write_str(s),
            Repr::Max => f.write_str("MAX"),
        }
    }
}

impl FromStr for Version {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<semver::Version> for Version {
    fn from(v: semver::Version) -> Self {
        Self(Repr::Parsed(v))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_short_forms_normalise() {
        assert_eq!(v("1"), Version::new(1, 0, 0));
        assert_eq!(v("1.2"), Version::new(1, 2, 0));
        assert_eq!(v("1.2.3"), Version::new(1, 2, 3));
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.2.3") < v("1.2.4"));
        assert!(v("1.9") < v("1.10"));
        assert!(v("0.10.4") < v("0.11.5"));
        assert!(v("2.0.0-rc.1") < v("2.0.0"));
    }

    #[test]
    fn test_qualifier_segment() {
        let q = v("1.0.0.v20240101");
        assert_eq!(q.as_semver().unwrap().build.as_str(), "v20240101");
        assert!(v("1.0.0") < q);
        assert!(q < v("1.0.1"));
    }

    #[test]
    fn test_sentinels_bracket_everything() {
        for s in ["0", "0.0.0", "999.0.0", "weird-thing"] {
            assert!(Version::MIN < v(s), "MIN < {s}");
            assert!(v(s) < Version::MAX, "{s} < MAX");
        }
    }

    #[test]
    fn test_empty_is_minimum() {
        assert_eq!(v(""), Version::EMPTY);
        assert!(Version::EMPTY.is_empty());
        assert_eq!(Version::EMPTY.cmp(&Version::MIN), std::cmp::Ordering::Equal);
        assert_eq!(Version::default(), Version::EMPTY);
    }

    #[test]
    fn test_raw_versions_sort_after_numeric() {
        assert!(v("99.0.0") < v("nightly"));
        assert!(v("alpha") < v("beta"));
    }

    #[test]
    fn test_rejects_delimiters() {
        assert!(Version::parse("1.0 ").is_err());
        assert!(Version::parse("[1.0").is_err());
        assert!(Version::parse("1,0").is_err());
        assert!(Version::parse("*").is_err());
        assert!(Version::parse("1.*").is_err());
    }

    #[test]
    fn test_short_forms_with_prerelease() {
        assert!(v("1.2-rc") < v("2.0"));
        assert!(v("1.2-rc") < v("1.2"));
        assert!(v("1.1.9") < v("1.2-rc"));
        assert!(v("1.2-rc") < v("99.0.0"));
        assert_eq!(v("1-beta"), v("1.0.0-beta"));
        assert_eq!(v("1.2-rc.1+b7"), v("1.2.0-rc.1+b7"));
        assert_eq!(v("1.2+b7").as_semver().unwrap().build.as_str(), "b7");
        assert!(crate::VersionRange::parse("[1.0,2.0)").unwrap().includes(&v("1.2-rc")));
    }

    #[test]
    fn test_qualifier_keeps_hyphens() {
        let q = v("1.0.0.v2024-01");
        assert_eq!(q.as_semver().unwrap().build.as_str(), "v2024-01");
    }

    #[test]
    fn test_dangling_suffix_stays_raw() {
        assert!(v("1.2-").as_semver().is_none());
        assert!(v("1.2+").as_semver().is_none());
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["MIN", "MAX", "1.2.3", "1.2.3-rc.1", "snapshot"] {
            assert_eq!(v(s).to_string(), s);
            assert_eq!(v(&v(s).to_string()), v(s));
        }
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("1.4.0")).unwrap();
        assert_eq!(json, "\"1.4.0\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.4.0"));
    }
}
