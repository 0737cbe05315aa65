//! Factory configuration.

use serde::{Deserialize, Serialize};

use crate::touchpoint::DEFAULT_TOUCHPOINT_CACHE_CAPACITY;

#[cfg(feature = "config")]
use crate::CoreError;

/// Tunables for [`UnitFactory`](crate::UnitFactory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// How many touchpoint types the rotating cache keeps. `0` disables it.
    pub touchpoint_cache_capacity: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            touchpoint_cache_capacity: DEFAULT_TOUCHPOINT_CACHE_CAPACITY,
        }
    }
}

impl FactoryConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the TOML is invalid or a key has the
    /// wrong type.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        assert_eq!(FactoryConfig::from_toml_str("").unwrap(), FactoryConfig::default());
    }

    #[test]
    fn test_parse_capacity() {
        let config = FactoryConfig::from_toml_str("touchpoint_cache_capacity = 3").unwrap();
        assert_eq!(config.touchpoint_cache_capacity, 3);
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(matches!(
            FactoryConfig::from_toml_str("touchpoint_cache_capacity = \"many\""),
            Err(CoreError::Config(_))
        ));
    }
}
