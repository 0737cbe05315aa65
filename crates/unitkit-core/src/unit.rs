//! The immutable installable unit.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use unitkit_schema::{Filter, ProvidedCapability, Requirement, Version};

use crate::{
    Copyright, CoreError, Environment, License, Patch, TouchpointData, TouchpointType,
    UpdateDescriptor,
};

/// Namespace of the self-capability every non-fragment unit provides.
pub const NAMESPACE_UNIT_ID: &str = "unit.id";

/// Namespace of the marker capability every fragment provides.
pub const NAMESPACE_UNIT_FRAGMENT: &str = "unit.fragment";

/// Insertion-ordered string properties. Setting an existing key replaces
/// its value in place.
///
/// Serialized as a list of `[key, value]` pairs; a list repeating a key is
/// rejected on the way back in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnitProperties(Vec<(String, String)>);

impl UnitProperties {
    /// Empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, keeping the key's original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    /// Value under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<(String, String)>> for UnitProperties {
    type Error = CoreError;

    fn try_from(entries: Vec<(String, String)>) -> Result<Self, Self::Error> {
        let mut properties = Self::new();
        for (key, value) in entries {
            if properties.get(&key).is_some() {
                return Err(CoreError::DuplicateProperty(key));
            }
            properties.0.push((key, value));
        }
        Ok(properties)
    }
}

impl Serialize for UnitProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnitProperties {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<(String, String)>::deserialize(deserializer)?;
        Self::try_from(entries).map_err(serde::de::Error::custom)
    }
}

/// Wire shape of [`ArtifactKey`], validated through [`ArtifactKey::new`].
#[derive(Deserialize)]
struct ArtifactKeyFields {
    classifier: String,
    id: String,
    version: Version,
}

impl TryFrom<ArtifactKeyFields> for ArtifactKey {
    type Error = CoreError;

    fn try_from(fields: ArtifactKeyFields) -> Result<Self, Self::Error> {
        Self::new(fields.classifier, fields.id, fields.version)
    }
}

/// Identifies a downloadable artifact belonging to a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "ArtifactKeyFields")]
pub struct ArtifactKey {
    classifier: String,
    id: String,
    version: Version,
}

impl ArtifactKey {
    /// Create an artifact key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `classifier` or `id` is empty.
    pub fn new(
        classifier: impl Into<String>,
        id: impl Into<String>,
        version: Version,
    ) -> Result<Self, CoreError> {
        let classifier = classifier.into();
        let id = id.into();
        if classifier.is_empty() {
            return Err(CoreError::EmptyField("artifact classifier"));
        }
        if id.is_empty() {
            return Err(CoreError::EmptyField("artifact id"));
        }
        Ok(Self {
            classifier,
            id,
            version,
        })
    }

    /// Artifact kind, e.g. `binary` or `source`.
    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    /// Artifact identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Artifact version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.classifier, self.id, self.version)
    }
}

/// What sort of unit this is, with the data only that sort carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    /// Installed on its own.
    Plain,
    /// Attaches to and augments a host.
    Fragment {
        /// Requirement over [`NAMESPACE_UNIT_ID`] selecting the host.
        host: Requirement,
    },
    /// Rewrites another unit's requirements.
    Patch(Patch),
}

/// An installable unit.
///
/// Built with [`UnitDescription`](crate::UnitDescription) and never mutated
/// afterwards. Equality, hashing and ordering consider only `(id, version)`;
/// the resolver treats two records with the same identity as the same unit.
#[derive(Debug, Clone)]
pub struct Unit {
    pub(crate) id: String,
    pub(crate) version: Version,
    pub(crate) identity: ProvidedCapability,
    pub(crate) singleton: bool,
    pub(crate) properties: UnitProperties,
    pub(crate) artifacts: Vec<ArtifactKey>,
    pub(crate) provided_capabilities: Vec<ProvidedCapability>,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) meta_requirements: Vec<Requirement>,
    pub(crate) touchpoint_type: Option<Arc<TouchpointType>>,
    pub(crate) touchpoint_data: Vec<TouchpointData>,
    pub(crate) filter: Option<Filter>,
    pub(crate) update_descriptor: Option<UpdateDescriptor>,
    pub(crate) licenses: Vec<License>,
    pub(crate) copyright: Option<Copyright>,
    pub(crate) kind: UnitKind,
}

impl Unit {
    /// Unit identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unit version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// `(NAMESPACE_UNIT_ID, id, version)`. Non-fragments also list it among
    /// their provided capabilities.
    pub fn identity(&self) -> &ProvidedCapability {
        &self.identity
    }

    /// Whether at most one version of this id may be installed.
    pub fn singleton(&self) -> bool {
        self.singleton
    }

    /// String properties in insertion order.
    pub fn properties(&self) -> &UnitProperties {
        &self.properties
    }

    /// Single property lookup.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Artifacts to fetch for this unit.
    pub fn artifacts(&self) -> &[ArtifactKey] {
        &self.artifacts
    }

    /// Offered capabilities, including the implicit identity or fragment
    /// marker.
    pub fn provided_capabilities(&self) -> &[ProvidedCapability] {
        &self.provided_capabilities
    }

    /// Declared needs.
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Needs of the installation machinery rather than of the unit itself.
    pub fn meta_requirements(&self) -> &[Requirement] {
        &self.meta_requirements
    }

    /// Engine that interprets [`touchpoint_data`](Self::touchpoint_data).
    pub fn touchpoint_type(&self) -> Option<&TouchpointType> {
        self.touchpoint_type.as_deref()
    }

    /// Opaque installation instructions.
    pub fn touchpoint_data(&self) -> &[TouchpointData] {
        &self.touchpoint_data
    }

    /// Environment filter restricting where the unit is applicable.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Which older units this one replaces.
    pub fn update_descriptor(&self) -> Option<&UpdateDescriptor> {
        self.update_descriptor.as_ref()
    }

    /// Licenses the unit is distributed under.
    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }

    /// Copyright notice.
    pub fn copyright(&self) -> Option<&Copyright> {
        self.copyright.as_ref()
    }

    /// Plain, fragment or patch.
    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    /// Whether this unit is a fragment.
    pub fn is_fragment(&self) -> bool {
        matches!(self.kind, UnitKind::Fragment { .. })
    }

    /// Whether this unit is a patch.
    pub fn is_patch(&self) -> bool {
        matches!(self.kind, UnitKind::Patch(_))
    }

    /// The host requirement, for fragments.
    pub fn host_requirement(&self) -> Option<&Requirement> {
        match &self.kind {
            UnitKind::Fragment { host } => Some(host),
            _ => None,
        }
    }

    /// The patch payload, for patches.
    pub fn patch(&self) -> Option<&Patch> {
        match &self.kind {
            UnitKind::Patch(patch) => Some(patch),
            _ => None,
        }
    }

    /// Whether the unit's own filter admits `environment`.
    pub fn is_applicable(&self, environment: &Environment) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(environment))
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.version == other.version
    }
}

impl Eq for Unit {}

impl Hash for Unit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.version.hash(state);
    }
}

impl PartialOrd for Unit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Unit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}
