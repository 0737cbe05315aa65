//! License and copyright text attached to units.

use std::hash::{Hash, Hasher};

use crate::CoreError;

/// A license a unit is distributed under.
///
/// Two licenses are the same license when their bodies agree after
/// whitespace normalisation, regardless of location. The identity is a
/// BLAKE3 digest of the normalised body.
#[derive(Debug, Clone)]
pub struct License {
    body: String,
    location: Option<String>,
    digest: String,
}

impl License {
    /// Create a license from its full text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyBody`] if `body` is empty or whitespace.
    pub fn new(body: impl Into<String>, location: Option<String>) -> Result<Self, CoreError> {
        let body = body.into();
        let normalized = body.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(CoreError::EmptyBody("license"));
        }
        let digest = blake3::hash(normalized.as_bytes()).to_hex().to_string();
        Ok(Self {
            body,
            location,
            digest,
        })
    }

    /// Full license text as supplied.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Where the license text can be found.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Hex digest identifying the license (64 chars).
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl PartialEq for License {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for License {}

impl Hash for License {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
    }
}

/// Copyright notice for a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Copyright {
    body: String,
    location: Option<String>,
}

impl Copyright {
    /// Create a copyright notice.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyBody`] if `body` is empty or whitespace.
    pub fn new(body: impl Into<String>, location: Option<String>) -> Result<Self, CoreError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(CoreError::EmptyBody("copyright"));
        }
        Ok(Self { body, location })
    }

    /// Notice text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Where the notice can be found.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}
