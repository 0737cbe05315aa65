//! Capabilities a unit offers to others.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{Properties, PropertyValue, SchemaError, Version};

/// Reserved property key holding a capability's version.
pub const VERSION_KEY: &str = "version";

/// A named, namespaced, versioned fact a unit offers.
///
/// The name is stored in the property map under the namespace itself as key,
/// the version under [`VERSION_KEY`]. Equality and hashing cover the
/// namespace and the full property map, so two capabilities that differ only
/// in an extra attribute are distinct.
#[derive(Debug, Clone)]
pub struct ProvidedCapability {
    namespace: String,
    name: String,
    version: Version,
    properties: Properties,
}

impl ProvidedCapability {
    /// Create a capability with no extra attributes.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyField`] if `namespace` or `name` is empty,
    /// and [`SchemaError::ReservedKey`] if `namespace` is [`VERSION_KEY`].
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: Version,
    ) -> Result<Self, SchemaError> {
        let namespace = namespace.into();
        let name = name.into();
        if namespace.is_empty() {
            return Err(SchemaError::EmptyField("namespace"));
        }
        if name.is_empty() {
            return Err(SchemaError::EmptyField("name"));
        }
        if namespace == VERSION_KEY {
            return Err(SchemaError::ReservedKey(namespace));
        }

        let mut properties = Properties::new();
        properties.insert(namespace.clone(), PropertyValue::String(name.clone()));
        properties.insert(VERSION_KEY.to_string(), PropertyValue::Version(version.clone()));

        Ok(Self {
            namespace,
            name,
            version,
            properties,
        })
    }

    /// Add an extra attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ReservedKey`] if `key` is the namespace or
    /// [`VERSION_KEY`], and [`SchemaError::EmptyField`] if it is empty.
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<Self, SchemaError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SchemaError::EmptyField("property key"));
        }
        if key == self.namespace || key == VERSION_KEY {
            return Err(SchemaError::ReservedKey(key));
        }
        self.properties.insert(key, value.into());
        Ok(self)
    }

    /// Namespace the capability lives in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Name within the namespace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offered version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// All attributes, including the reserved name and version entries.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

impl PartialEq for ProvidedCapability {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.properties == other.properties
    }
}

impl Eq for ProvidedCapability {}

impl Hash for ProvidedCapability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.properties.hash(state);
    }
}

impl fmt::Display for ProvidedCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.version)
    }
}
