//! Error types for schema construction.

use thiserror::Error;

/// Errors raised while constructing schema primitives.
///
/// Every variant is a caller error detected at construction time. Matching
/// never produces one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required identifier (namespace, name, key) was empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// The text could not be parsed as a version.
    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    /// The text could not be parsed as a version range.
    #[error("Invalid version range '{input}': {reason}")]
    InvalidRange {
        /// The offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A range whose lower bound lies above its upper bound, or an exclusive
    /// range with equal bounds. Such a range admits no version at all.
    #[error("Version range admits no version: lower {lower}, upper {upper}")]
    InvertedRange {
        /// Lower bound as written.
        lower: String,
        /// Upper bound as written.
        upper: String,
    },

    /// A capability property key that is managed by the capability itself.
    #[error("Reserved property key: {0}")]
    ReservedKey(String),

    /// `min` exceeds `max` on a requirement.
    #[error("Invalid cardinality: min {min} exceeds max {max}")]
    InvalidCardinality {
        /// Requested minimum.
        min: u32,
        /// Requested maximum.
        max: u32,
    },

    /// The text could not be parsed as a filter expression.
    #[error("Invalid filter '{input}' at offset {offset}: {reason}")]
    InvalidFilter {
        /// The offending input.
        input: String,
        /// Byte offset where parsing stopped.
        offset: usize,
        /// Why it was rejected.
        reason: &'static str,
    },
}
