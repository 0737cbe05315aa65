//! The execution environment requirement and unit filters are checked
//! against.

use std::ops::Deref;

use unitkit_schema::{Properties, PropertyValue};

#[cfg(feature = "config")]
use crate::CoreError;

/// Property set describing the target an installation runs on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment(Properties);

impl Environment {
    /// An empty environment. Only unfiltered requirements apply.
    pub fn new() -> Self {
        Self::default()
    }

    /// The host this process runs on: `os`, `arch` and `family`.
    ///
    /// # Example
    ///
    /// ```
    /// use unitkit_core::Environment;
    ///
    /// let env = Environment::current();
    /// assert!(env.get("os").is_some());
    /// ```
    pub fn current() -> Self {
        Self::new()
            .with("os", std::env::consts::OS)
            .with("arch", std::env::consts::ARCH)
            .with("family", std::env::consts::FAMILY)
    }

    /// Add or replace a property.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// The underlying property set.
    pub fn properties(&self) -> &Properties {
        &self.0
    }

    /// Load an environment from a flat TOML table.
    ///
    /// Strings, integers, booleans and arrays of those map onto the
    /// matching [`PropertyValue`] variants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for invalid TOML and
    /// [`CoreError::UnsupportedValue`] for floats, datetimes and tables.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        let table: toml::Table = toml::from_str(s)?;
        let mut env = Self::new();
        for (key, value) in table {
            let converted = convert(&key, value)?;
            env.0.insert(key, converted);
        }
        Ok(env)
    }
}

#[cfg(feature = "config")]
fn convert(key: &str, value: toml::Value) -> Result<PropertyValue, CoreError> {
    match value {
        toml::Value::String(s) => Ok(PropertyValue::String(s)),
        toml::Value::Integer(i) => Ok(PropertyValue::Integer(i)),
        toml::Value::Boolean(b) => Ok(PropertyValue::Boolean(b)),
        toml::Value::Array(items) => items
            .into_iter()
            .map(|item| convert(key, item))
            .collect::<Result<Vec<_>, _>>()
            .map(PropertyValue::List),
        _ => Err(CoreError::UnsupportedValue(key.to_string())),
    }
}

impl Deref for Environment {
    type Target = Properties;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Properties> for Environment {
    fn from(properties: Properties) -> Self {
        Self(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_describes_host() {
        let env = Environment::current();
        assert_eq!(
            env.get("os"),
            Some(&PropertyValue::String(std::env::consts::OS.to_string()))
        );
        assert!(env.get("arch").is_some());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml() {
        let env = Environment::from_toml_str(
            r#"
            os = "linux"
            cores = 8
            headless = true
            features = ["gtk", "wayland"]
            "#,
        )
        .unwrap();
        assert_eq!(env.get("os"), Some(&PropertyValue::from("linux")));
        assert_eq!(env.get("cores"), Some(&PropertyValue::Integer(8)));
        assert_eq!(env.get("headless"), Some(&PropertyValue::Boolean(true)));
        assert_eq!(
            env.get("features"),
            Some(&PropertyValue::List(vec!["gtk".into(), "wayland".into()]))
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_toml_rejects_floats() {
        assert!(matches!(
            Environment::from_toml_str("ratio = 1.5"),
            Err(CoreError::UnsupportedValue(key)) if key == "ratio"
        ));
    }
}
