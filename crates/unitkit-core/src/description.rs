//! The single-use builder that produces [`Unit`]s.

use std::sync::Arc;

use unitkit_schema::{Filter, ProvidedCapability, Requirement, Version};

use crate::{
    ArtifactKey, Copyright, CoreError, License, NAMESPACE_UNIT_FRAGMENT, NAMESPACE_UNIT_ID,
    Patch, TouchpointData, TouchpointType, Unit, UnitKind, UnitProperties, UpdateDescriptor,
};

/// Accumulates everything a [`Unit`] carries, then validates it once in
/// [`finish`](Self::finish).
///
/// Every method takes the description by value, so a finished description
/// cannot be touched again.
///
/// ```
/// use unitkit_core::UnitDescription;
/// use unitkit_schema::Version;
///
/// let unit = UnitDescription::new("org.example.tool", Version::new(1, 2, 0))
///     .singleton(true)
///     .property("name", "Example tool")
///     .finish()
///     .unwrap();
/// assert_eq!(unit.id(), "org.example.tool");
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct UnitDescription {
    id: String,
    version: Version,
    singleton: bool,
    properties: UnitProperties,
    artifacts: Vec<ArtifactKey>,
    provided_capabilities: Vec<ProvidedCapability>,
    requirements: Vec<Requirement>,
    meta_requirements: Vec<Requirement>,
    touchpoint_type: Option<Arc<TouchpointType>>,
    touchpoint_data: Vec<TouchpointData>,
    filter: Option<Filter>,
    update_descriptor: Option<UpdateDescriptor>,
    licenses: Vec<License>,
    copyright: Option<Copyright>,
    kind: Option<UnitKind>,
}

impl UnitDescription {
    /// Start describing the unit `id` at `version`.
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
            ..Self::default()
        }
    }

    /// Replace the id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the version.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Mark whether only one version of this id may be installed.
    pub fn singleton(mut self, singleton: bool) -> Self {
        self.singleton = singleton;
        self
    }

    /// Set a string property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Append artifacts.
    pub fn add_artifacts(mut self, artifacts: impl IntoIterator<Item = ArtifactKey>) -> Self {
        self.artifacts.extend(artifacts);
        self
    }

    /// Append provided capabilities.
    pub fn add_provided_capabilities(
        mut self,
        capabilities: impl IntoIterator<Item = ProvidedCapability>,
    ) -> Self {
        self.provided_capabilities.extend(capabilities);
        self
    }

    /// Replace the provided capabilities.
    pub fn set_provided_capabilities(
        mut self,
        capabilities: impl IntoIterator<Item = ProvidedCapability>,
    ) -> Self {
        self.provided_capabilities = capabilities.into_iter().collect();
        self
    }

    /// Append requirements.
    pub fn add_requirements(mut self, requirements: impl IntoIterator<Item = Requirement>) -> Self {
        self.requirements.extend(requirements);
        self
    }

    /// Replace the requirements.
    pub fn set_requirements(mut self, requirements: impl IntoIterator<Item = Requirement>) -> Self {
        self.requirements = requirements.into_iter().collect();
        self
    }

    /// Append meta requirements.
    pub fn add_meta_requirements(
        mut self,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Self {
        self.meta_requirements.extend(requirements);
        self
    }

    /// Set the engine interpreting this unit's touchpoint data.
    pub fn touchpoint_type(mut self, touchpoint_type: Arc<TouchpointType>) -> Self {
        self.touchpoint_type = Some(touchpoint_type);
        self
    }

    /// Merge `data` into the accumulated touchpoint data.
    ///
    /// Instructions under a key already present are appended textually (see
    /// [`TouchpointData::merge`]).
    pub fn add_touchpoint_data(mut self, data: TouchpointData) -> Self {
        match self.touchpoint_data.last_mut() {
            Some(existing) => existing.merge_in(&data),
            None => self.touchpoint_data.push(data),
        }
        self
    }

    /// Restrict the environments the unit applies to.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Declare which older units this one updates.
    pub fn update_descriptor(mut self, descriptor: UpdateDescriptor) -> Self {
        self.update_descriptor = Some(descriptor);
        self
    }

    /// Append licenses.
    pub fn add_licenses(mut self, licenses: impl IntoIterator<Item = License>) -> Self {
        self.licenses.extend(licenses);
        self
    }

    /// Set the copyright notice.
    pub fn copyright(mut self, copyright: Copyright) -> Self {
        self.copyright = Some(copyright);
        self
    }

    /// Make this unit a fragment of whatever `host` selects.
    pub fn fragment(mut self, host: Requirement) -> Self {
        self.kind = Some(UnitKind::Fragment { host });
        self
    }

    /// Make this unit a patch.
    pub fn patch(mut self, patch: Patch) -> Self {
        self.kind = Some(UnitKind::Patch(patch));
        self
    }

    /// Validate and produce the immutable unit.
    ///
    /// Non-fragments gain their `(NAMESPACE_UNIT_ID, id, version)`
    /// capability and fragments the `NAMESPACE_UNIT_FRAGMENT` marker, unless
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if the id is empty and
    /// [`CoreError::InvalidHost`] if a fragment's host requirement is outside
    /// [`NAMESPACE_UNIT_ID`].
    pub fn finish(self) -> Result<Unit, CoreError> {
        if self.id.is_empty() {
            return Err(CoreError::EmptyField("unit id"));
        }
        let kind = self.kind.unwrap_or(UnitKind::Plain);
        match &kind {
            UnitKind::Fragment { host } if host.namespace() != NAMESPACE_UNIT_ID => {
                return Err(CoreError::InvalidHost {
                    expected: NAMESPACE_UNIT_ID,
                    found: host.namespace().to_string(),
                });
            }
            _ => {}
        }

        let identity = ProvidedCapability::new(NAMESPACE_UNIT_ID, &self.id, self.version.clone())?;
        let implicit = match kind {
            UnitKind::Fragment { .. } => {
                ProvidedCapability::new(NAMESPACE_UNIT_FRAGMENT, &self.id, self.version.clone())?
            }
            _ => identity.clone(),
        };
        let mut provided_capabilities = self.provided_capabilities;
        if !provided_capabilities.contains(&implicit) {
            provided_capabilities.insert(0, implicit);
        }

        let unit = Unit {
            id: self.id,
            version: self.version,
            identity,
            singleton: self.singleton,
            properties: self.properties,
            artifacts: self.artifacts,
            provided_capabilities,
            requirements: self.requirements,
            meta_requirements: self.meta_requirements,
            touchpoint_type: self.touchpoint_type,
            touchpoint_data: self.touchpoint_data,
            filter: self.filter,
            update_descriptor: self.update_descriptor,
            licenses: self.licenses,
            copyright: self.copyright,
            kind,
        };
        tracing::debug!(
            unit = %unit,
            capabilities = unit.provided_capabilities.len(),
            requirements = unit.requirements.len(),
            fragment = unit.is_fragment(),
            patch = unit.is_patch(),
            "finished unit"
        );
        Ok(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TouchpointInstruction, UnitFactory};
    use unitkit_schema::{SchemaError, VersionRange};

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(matches!(
            UnitDescription::new("", v("1.0.0")).finish(),
            Err(CoreError::EmptyField("unit id"))
        ));
    }

    #[test]
    fn test_plain_unit_provides_identity_first() {
        let unit = UnitDescription::new("a", v("1.0.0"))
            .add_provided_capabilities([
                ProvidedCapability::new("java.package", "org.a", v("1.0.0")).unwrap(),
            ])
            .finish()
            .unwrap();
        assert_eq!(unit.provided_capabilities().len(), 2);
        assert_eq!(&unit.provided_capabilities()[0], unit.identity());
        assert!(!unit.is_fragment());
    }

    #[test]
    fn test_identity_not_duplicated() {
        let identity = ProvidedCapability::new(NAMESPACE_UNIT_ID, "a", v("1.0.0")).unwrap();
        let unit = UnitDescription::new("a", v("1.0.0"))
            .add_provided_capabilities([identity])
            .finish()
            .unwrap();
        assert_eq!(unit.provided_capabilities().len(), 1);
    }

    #[test]
    fn test_fragment_always_has_marker() {
        let host = UnitFactory::host_requirement("h", VersionRange::EMPTY).unwrap();
        let unit = UnitDescription::new("f", v("1.0.0"))
            .fragment(host)
            .finish()
            .unwrap();
        let namespaces: Vec<_> = unit
            .provided_capabilities()
            .iter()
            .map(ProvidedCapability::namespace)
            .collect();
        assert_eq!(namespaces, vec![NAMESPACE_UNIT_FRAGMENT]);
        assert!(unit.is_fragment());
        assert!(unit.host_requirement().is_some());
    }

    #[test]
    fn test_fragment_host_must_use_unit_namespace() {
        let host = Requirement::range("java.package", "h", VersionRange::EMPTY).unwrap();
        assert!(matches!(
            UnitDescription::new("f", v("1.0.0")).fragment(host).finish(),
            Err(CoreError::InvalidHost { found, .. }) if found == "java.package"
        ));
    }

    #[test]
    fn test_touchpoint_data_accumulates() {
        let data = |body: &str| {
            TouchpointData::new().with_instruction("configure", TouchpointInstruction::new(body))
        };
        let unit = UnitDescription::new("a", v("1.0.0"))
            .add_touchpoint_data(data("a"))
            .add_touchpoint_data(data("b"))
            .finish()
            .unwrap();
        assert_eq!(unit.touchpoint_data().len(), 1);
        assert_eq!(
            unit.touchpoint_data()[0]
                .instruction("configure")
                .and_then(TouchpointInstruction::body),
            Some("a;b")
        );
    }

    #[test]
    fn test_set_replaces() {
        let req = |n: &str| Requirement::range("java.package", n, VersionRange::EMPTY).unwrap();
        let unit = UnitDescription::new("a", v("1.0.0"))
            .add_requirements([req("x"), req("y")])
            .set_requirements([req("z")])
            .finish()
            .unwrap();
        assert_eq!(unit.requirements(), &[req("z")]);
    }

    #[test]
    fn test_set_provided_capabilities_replaces_but_keeps_identity() {
        let cap = |n: &str| ProvidedCapability::new("java.package", n, v("1.0.0")).unwrap();
        let unit = UnitDescription::new("a", v("1.0.0"))
            .add_provided_capabilities([cap("x"), cap("y")])
            .set_provided_capabilities([cap("z")])
            .finish()
            .unwrap();
        assert_eq!(
            unit.provided_capabilities(),
            &[unit.identity().clone(), cap("z")]
        );
    }

    #[test]
    fn test_patch_kind() {
        let unit = UnitDescription::new("p", v("1.0.0"))
            .patch(Patch::default())
            .finish()
            .unwrap();
        assert!(unit.is_patch());
        assert!(unit.patch().is_some_and(|p| p.scope().is_empty()));
        assert_eq!(unit.provided_capabilities(), &[unit.identity().clone()]);
    }

    #[test]
    fn test_schema_errors_propagate() {
        let err = ProvidedCapability::new("", "x", Version::EMPTY).unwrap_err();
        assert_eq!(err, SchemaError::EmptyField("namespace"));
        assert!(matches!(CoreError::from(err), CoreError::Schema(_)));
    }
}
