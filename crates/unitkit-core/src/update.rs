//! Update descriptors: which older units a unit supersedes.

use std::fmt;

use serde::{Deserialize, Serialize};
use unitkit_schema::{MatchExpression, Version, VersionRange};

use crate::{CoreError, NAMESPACE_UNIT_ID, Unit};

/// How urgently an update should be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Regular update.
    #[default]
    Normal,
    /// Security or otherwise critical fix.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => f.write_str("normal"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Declares that the carrying unit updates any unit matched by one of its
/// targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpdateDescriptor {
    targets: Vec<MatchExpression>,
    severity: Severity,
    description: Option<String>,
    location: Option<String>,
}

impl UpdateDescriptor {
    /// Create a descriptor over arbitrary identity expressions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUpdateTarget`] if a target is not in
    /// [`NAMESPACE_UNIT_ID`].
    pub fn new(targets: Vec<MatchExpression>, severity: Severity) -> Result<Self, CoreError> {
        if let Some(bad) = targets.iter().find(|t| t.namespace() != NAMESPACE_UNIT_ID) {
            return Err(CoreError::InvalidUpdateTarget {
                expected: NAMESPACE_UNIT_ID,
                found: bad.namespace().to_string(),
            });
        }
        Ok(Self {
            targets,
            severity,
            description: None,
            location: None,
        })
    }

    /// Target every version of `id` inside `range`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `id` is empty.
    pub fn for_range(
        id: impl Into<String>,
        range: VersionRange,
        severity: Severity,
    ) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::EmptyField("update target id"));
        }
        Self::new(
            vec![MatchExpression::VersionRange {
                namespace: NAMESPACE_UNIT_ID.to_string(),
                name: id,
                range,
            }],
            severity,
        )
    }

    /// Target every version of `id` strictly older than `version`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `id` is empty, or
    /// [`CoreError::Schema`] if `version` is the minimum version.
    pub fn for_older(
        id: impl Into<String>,
        version: Version,
        severity: Severity,
    ) -> Result<Self, CoreError> {
        Self::for_range(id, VersionRange::below(version)?, severity)
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a link to further information.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Expressions over the candidate's identity capability.
    pub fn targets(&self) -> &[MatchExpression] {
        &self.targets
    }

    /// Update urgency.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Link to further information.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Whether the carrying unit is an update of `candidate`.
    pub fn is_update_of(&self, candidate: &Unit) -> bool {
        self.targets
            .iter()
            .any(|t| t.matches(candidate.identity()))
    }
}
