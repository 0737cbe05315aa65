//! Host units with their fragments attached.

use std::fmt;
use std::sync::Arc;

use unitkit_schema::{ProvidedCapability, Requirement, Version};

use crate::{InstallableView, NAMESPACE_UNIT_FRAGMENT, TouchpointData, Unit};

/// A unit viewed together with the fragments attached to it.
///
/// Nothing is copied: the unions below are computed on each call from the
/// shared units. Fragment capabilities are included, except for each
/// fragment's own fragment marker, so a resolved host never looks like a
/// fragment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    original: Arc<Unit>,
    fragments: Vec<Arc<Unit>>,
}

impl ResolvedUnit {
    /// Wrap `original` with `fragments`, in attachment order.
    pub fn new(original: Arc<Unit>, fragments: impl IntoIterator<Item = Arc<Unit>>) -> Self {
        Self {
            original,
            fragments: fragments.into_iter().collect(),
        }
    }

    /// Attach more fragments. A fragment that is itself resolved contributes
    /// its own fragments too, flattened after it.
    #[must_use]
    pub fn attach(mut self, fragments: impl IntoIterator<Item = ResolvedUnit>) -> Self {
        for fragment in fragments {
            self.fragments.push(fragment.original);
            self.fragments.extend(fragment.fragments);
        }
        self
    }

    /// The host as built.
    pub fn original(&self) -> &Arc<Unit> {
        &self.original
    }

    /// Attached fragments, flattened.
    pub fn fragments(&self) -> &[Arc<Unit>] {
        &self.fragments
    }

    fn members(&self) -> impl Iterator<Item = &Unit> {
        std::iter::once(&*self.original).chain(self.fragments.iter().map(Arc::as_ref))
    }
}

impl From<Arc<Unit>> for ResolvedUnit {
    fn from(unit: Arc<Unit>) -> Self {
        Self::new(unit, [])
    }
}

impl From<Unit> for ResolvedUnit {
    fn from(unit: Unit) -> Self {
        Self::from(Arc::new(unit))
    }
}

impl InstallableView for ResolvedUnit {
    fn id(&self) -> &str {
        self.original.id()
    }

    fn version(&self) -> &Version {
        self.original.version()
    }

    fn singleton(&self) -> bool {
        self.original.singleton()
    }

    fn provided_capabilities(&self) -> impl Iterator<Item = &ProvidedCapability> {
        let own = self.original.provided_capabilities.iter();
        let attached = self
            .fragments
            .iter()
            .flat_map(|f| f.provided_capabilities.iter())
            .filter(|c| c.namespace() != NAMESPACE_UNIT_FRAGMENT);
        own.chain(attached)
    }

    fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.members().flat_map(|u| u.requirements.iter())
    }

    fn meta_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.members().flat_map(|u| u.meta_requirements.iter())
    }

    fn touchpoint_data(&self) -> impl Iterator<Item = &TouchpointData> {
        self.members().flat_map(|u| u.touchpoint_data.iter())
    }
}

impl fmt::Display for ResolvedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)?;
        if !self.fragments.is_empty() {
            f.write_str(" +")?;
            for fragment in &self.fragments {
                write!(f, " [{fragment}]")?;
            }
        }
        Ok(())
    }
}

/// Attach to `host` every fragment in `candidates` whose host requirement
/// its identity satisfies.
///
/// Non-fragments among the candidates are ignored, as is the host itself.
pub fn attach_fragments<F>(host: Arc<Unit>, candidates: impl IntoIterator<Item = F>) -> ResolvedUnit
where
    F: Into<ResolvedUnit>,
{
    let identity = host.identity().clone();
    let selected: Vec<ResolvedUnit> = candidates
        .into_iter()
        .map(Into::into)
        .filter(|c: &ResolvedUnit| {
            !Arc::ptr_eq(&c.original, &host)
                && c.original
                    .host_requirement()
                    .is_some_and(|req| req.is_satisfied_by(&identity))
        })
        .collect();

    tracing::debug!(
        host = %host,
        fragments = selected.len(),
        "attaching fragments"
    );
    ResolvedUnit::from(host).attach(selected)
}
