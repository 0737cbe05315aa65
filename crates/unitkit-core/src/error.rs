//! Construction-time errors for units and their parts.

use thiserror::Error;
use unitkit_schema::SchemaError;

/// Errors that can occur while building units, descriptors and views.
///
/// All of these are caller errors raised before a value escapes into the
/// shared, read-only world.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A schema primitive (version, range, capability, requirement) was
    /// invalid.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A required identifier was empty.
    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    /// A property list naming the same key twice.
    #[error("Duplicate property key '{0}'")]
    DuplicateProperty(String),

    /// A license or copyright was given no text.
    #[error("Empty {0} body")]
    EmptyBody(&'static str),

    /// A requirement change whose two sides cannot describe the same need.
    #[error("Incompatible requirement change: {0}")]
    IncompatibleChange(String),

    /// A fragment host requirement outside the unit id namespace.
    #[error("Fragment host requirement must use namespace '{expected}', got '{found}'")]
    InvalidHost {
        /// The namespace host requirements must use.
        expected: &'static str,
        /// The namespace that was supplied.
        found: String,
    },

    /// An update target outside the unit id namespace.
    #[error("Update target must use namespace '{expected}', got '{found}'")]
    InvalidUpdateTarget {
        /// The namespace update targets must use.
        expected: &'static str,
        /// The namespace that was supplied.
        found: String,
    },

    /// A configuration value with no property equivalent.
    #[error("Unsupported value for '{0}'")]
    UnsupportedValue(String),

    /// The configuration text was not valid TOML for the target type.
    #[cfg(feature = "config")]
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
}
