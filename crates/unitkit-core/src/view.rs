//! Read-only traversal the planner consumes.
//!
//! The planner sees units only through [`InstallableView`] and the free
//! matching functions below. It never inspects match expression internals.

use unitkit_schema::{ProvidedCapability, Requirement, Satisfaction, Version};

use crate::{Environment, TouchpointData, Unit};

/// Anything that can be installed: a plain [`Unit`] or a
/// [`ResolvedUnit`](crate::ResolvedUnit) with fragments attached.
pub trait InstallableView {
    /// Unit identifier.
    fn id(&self) -> &str;

    /// Unit version.
    fn version(&self) -> &Version;

    /// Whether at most one version of this id may be installed.
    fn singleton(&self) -> bool;

    /// Every capability the view offers.
    fn provided_capabilities(&self) -> impl Iterator<Item = &ProvidedCapability>;

    /// Every requirement the view declares, in declaration order.
    fn requirements(&self) -> impl Iterator<Item = &Requirement>;

    /// Every meta requirement the view declares.
    fn meta_requirements(&self) -> impl Iterator<Item = &Requirement>;

    /// Every touchpoint data entry, in declaration order.
    fn touchpoint_data(&self) -> impl Iterator<Item = &TouchpointData>;

    /// Whether some provided capability matches `requirement`.
    fn satisfies(&self, requirement: &Requirement) -> bool {
        self.provided_capabilities()
            .any(|c| requirement.is_satisfied_by(c))
    }
}

impl InstallableView for Unit {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> &Version {
        &self.version
    }

    fn singleton(&self) -> bool {
        self.singleton
    }

    fn provided_capabilities(&self) -> impl Iterator<Item = &ProvidedCapability> {
        self.provided_capabilities.iter()
    }

    fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    fn meta_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.meta_requirements.iter()
    }

    fn touchpoint_data(&self) -> impl Iterator<Item = &TouchpointData> {
        self.touchpoint_data.iter()
    }
}

/// Whether `unit` offers a capability matching `requirement`.
pub fn is_match(unit: &impl InstallableView, requirement: &Requirement) -> bool {
    unit.satisfies(requirement)
}

/// The members of `universe` that could satisfy `requirement`.
pub fn candidates<'a, V: InstallableView + 'a>(
    universe: impl IntoIterator<Item = &'a V>,
    requirement: &'a Requirement,
) -> impl Iterator<Item = &'a V> {
    universe
        .into_iter()
        .filter(move |unit| unit.satisfies(requirement))
}

/// Whether `a` and `b` cannot be installed together: both are singletons
/// with the same id and different versions.
pub fn singleton_conflict(a: &impl InstallableView, b: &impl InstallableView) -> bool {
    a.singleton() && b.singleton() && a.id() == b.id() && a.version() != b.version()
}

/// Check every requirement of `unit` against the capabilities of `universe`
/// under `environment`.
///
/// Requirements whose filter rejects the environment come back as
/// [`Satisfaction::Inert`].
pub fn evaluate<'a, V: InstallableView>(
    unit: &'a impl InstallableView,
    environment: &Environment,
    universe: &'a [V],
) -> Vec<(&'a Requirement, Satisfaction)> {
    unit.requirements()
        .map(|requirement| {
            let outcome = requirement.check(
                environment,
                universe.iter().flat_map(|u| u.provided_capabilities()),
            );
            (requirement, outcome)
        })
        .collect()
}
