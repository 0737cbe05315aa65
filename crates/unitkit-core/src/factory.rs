//! Entry point for building units.

use std::sync::Arc;

use unitkit_schema::{Requirement, Version, VersionRange};

use crate::touchpoint::{DEFAULT_TOUCHPOINT_CACHE_CAPACITY, TouchpointTypeCache};
use crate::{
    CoreError, FactoryConfig, NAMESPACE_UNIT_ID, Severity, TouchpointType, UnitDescription,
    UpdateDescriptor,
};

/// Creates unit descriptions and the shared values units point at.
///
/// A factory is `Sync`; one instance can serve every thread loading
/// metadata.
#[derive(Debug)]
pub struct UnitFactory {
    touchpoint_types: TouchpointTypeCache,
}

impl Default for UnitFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitFactory {
    /// A factory with the default cache size.
    pub fn new() -> Self {
        Self {
            touchpoint_types: TouchpointTypeCache::new(DEFAULT_TOUCHPOINT_CACHE_CAPACITY),
        }
    }

    /// A factory tuned by `config`.
    pub fn with_config(config: &FactoryConfig) -> Self {
        tracing::debug!(
            touchpoint_cache_capacity = config.touchpoint_cache_capacity,
            "creating unit factory"
        );
        Self {
            touchpoint_types: TouchpointTypeCache::new(config.touchpoint_cache_capacity),
        }
    }

    /// Start describing a unit.
    #[allow(clippy::unused_self)] // Keeps construction routed through the factory
    pub fn description(&self, id: impl Into<String>, version: Version) -> UnitDescription {
        UnitDescription::new(id, version)
    }

    /// The touchpoint type `(id, version)`, shared with earlier callers while
    /// it stays in the cache.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `id` is empty.
    pub fn touchpoint_type(
        &self,
        id: &str,
        version: &Version,
    ) -> Result<Arc<TouchpointType>, CoreError> {
        self.touchpoint_types.get_or_insert(id, version)
    }

    /// A requirement on the unit `id` within `range`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] if `id` is empty.
    pub fn unit_requirement(id: &str, range: VersionRange) -> Result<Requirement, CoreError> {
        Ok(Requirement::range(NAMESPACE_UNIT_ID, id, range)?)
    }

    /// An optional host requirement for a fragment of `host_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] if `host_id` is empty.
    pub fn host_requirement(host_id: &str, range: VersionRange) -> Result<Requirement, CoreError> {
        Ok(Requirement::range(NAMESPACE_UNIT_ID, host_id, range)?.optional())
    }

    /// An update descriptor replacing every version of `id` older than
    /// `version`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyField`] if `id` is empty or
    /// [`CoreError::Schema`] if `version` is the minimum version.
    pub fn update_descriptor_for(
        id: &str,
        version: Version,
        severity: Severity,
    ) -> Result<UpdateDescriptor, CoreError> {
        UpdateDescriptor::for_older(id, version, severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InstallableView, NAMESPACE_UNIT_FRAGMENT};

    #[test]
    fn test_touchpoint_types_are_shared() {
        let factory = UnitFactory::new();
        let v = Version::new(1, 0, 0);
        let a = factory.touchpoint_type("native", &v).unwrap();
        let b = factory.touchpoint_type("native", &v).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_disabled_cache_still_builds() {
        let factory = UnitFactory::with_config(&FactoryConfig {
            touchpoint_cache_capacity: 0,
        });
        let v = Version::new(1, 0, 0);
        let a = factory.touchpoint_type("native", &v).unwrap();
        let b = factory.touchpoint_type("native", &v).unwrap();
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_concurrent_lookups_agree() {
        let factory = UnitFactory::with_config(&FactoryConfig {
            touchpoint_cache_capacity: 2,
        });
        let ids = ["a", "b", "c", "d"];
        std::thread::scope(|s| {
            for t in 0..8 {
                let factory = &factory;
                s.spawn(move || {
                    for round in 0..50 {
                        let id = ids[(t + round) % ids.len()];
                        let v = Version::new(1, 0, 0);
                        let ty = factory.touchpoint_type(id, &v).unwrap();
                        assert_eq!(ty.id(), id);
                    }
                });
            }
        });
    }

    #[test]
    fn test_fragment_through_factory() {
        let factory = UnitFactory::new();
        let host = UnitFactory::host_requirement("h", VersionRange::EMPTY).unwrap();
        assert_eq!(host.min(), 0);

        let tp = factory.touchpoint_type("native", &Version::new(1, 0, 0)).unwrap();
        let unit = factory
            .description("f", Version::new(1, 0, 0))
            .fragment(host)
            .touchpoint_type(tp)
            .finish()
            .unwrap();
        assert!(
            unit.provided_capabilities()
                .iter()
                .any(|c| c.namespace() == NAMESPACE_UNIT_FRAGMENT)
        );
        assert_eq!(unit.touchpoint_type().map(TouchpointType::id), Some("native"));
        assert_eq!(InstallableView::id(&unit), "f");
    }

    #[test]
    fn test_unit_requirement_matches_identity() {
        let unit = UnitDescription::new("a", Version::new(1, 0, 0)).finish().unwrap();
        let req = UnitFactory::unit_requirement("a", VersionRange::at_least(Version::new(1, 0, 0)))
            .unwrap();
        assert!(req.is_satisfied_by(unit.identity()));
        assert!(UnitFactory::unit_requirement("", VersionRange::EMPTY).is_err());
    }

    #[test]
    fn test_update_descriptor_for() {
        let descriptor =
            UnitFactory::update_descriptor_for("a", Version::new(2, 0, 0), Severity::Normal)
                .unwrap();
        let old = UnitDescription::new("a", Version::new(1, 0, 0)).finish().unwrap();
        assert!(descriptor.is_update_of(&old));
    }
}
