//! Patches: conditional rewrites of another unit's requirements.

use unitkit_schema::{MatchExpression, Requirement};

use crate::{CoreError, InstallableView};

/// One rewrite rule.
///
/// With both sides present the matched requirement is replaced; with only
/// `apply_on` it is removed; with only `new_value` the value is added
/// unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementChange {
    apply_on: Option<Requirement>,
    new_value: Option<Requirement>,
}

impl RequirementChange {
    /// Create a change.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::IncompatibleChange`] if both sides are absent, or
    /// if both are present but differ in namespace, expression shape, or (for
    /// the version range shape) name.
    pub fn new(
        apply_on: Option<Requirement>,
        new_value: Option<Requirement>,
    ) -> Result<Self, CoreError> {
        match (&apply_on, &new_value) {
            (None, None) => {
                return Err(CoreError::IncompatibleChange(
                    "both sides are empty".to_string(),
                ));
            }
            (Some(from), Some(to)) => check_compatible(from, to)?,
            _ => {}
        }
        Ok(Self {
            apply_on,
            new_value,
        })
    }

    /// Pattern selecting the requirements to rewrite.
    pub fn apply_on(&self) -> Option<&Requirement> {
        self.apply_on.as_ref()
    }

    /// Replacement, or `None` to remove.
    pub fn new_value(&self) -> Option<&Requirement> {
        self.new_value.as_ref()
    }

    /// Whether this change rewrites `existing`.
    ///
    /// Version range patterns match a requirement with the same namespace
    /// and name whose range overlaps; other shapes must be equal.
    pub fn matches(&self, existing: &Requirement) -> bool {
        let Some(pattern) = &self.apply_on else {
            return false;
        };
        match (pattern.as_triplet(), existing.as_triplet()) {
            (Some((ns, name, range)), Some((other_ns, other_name, other_range))) => {
                ns == other_ns && name == other_name && range.intersect(other_range).is_some()
            }
            _ => pattern.expression() == existing.expression(),
        }
    }
}

fn check_compatible(from: &Requirement, to: &Requirement) -> Result<(), CoreError> {
    if from.namespace() != to.namespace() {
        return Err(CoreError::IncompatibleChange(format!(
            "namespace {} cannot become {}",
            from.namespace(),
            to.namespace()
        )));
    }
    match (from.expression(), to.expression()) {
        (
            MatchExpression::VersionRange { name: a, .. },
            MatchExpression::VersionRange { name: b, .. },
        ) if a != b => Err(CoreError::IncompatibleChange(format!(
            "name {a} cannot become {b}"
        ))),
        (MatchExpression::VersionRange { .. }, MatchExpression::VersionRange { .. })
        | (MatchExpression::Properties { .. }, MatchExpression::Properties { .. })
        | (MatchExpression::Generic { .. }, MatchExpression::Generic { .. }) => Ok(()),
        _ => Err(CoreError::IncompatibleChange(format!(
            "{from} and {to} have different shapes"
        ))),
    }
}

/// The payload of a patch unit.
///
/// The default patch has an empty scope and therefore applies to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    scope: Vec<Vec<Requirement>>,
    changes: Vec<RequirementChange>,
    lifecycle: Option<Requirement>,
}

impl Patch {
    /// Create a patch.
    ///
    /// `scope` is an OR of AND-groups over the target's capabilities.
    pub fn new(
        scope: Vec<Vec<Requirement>>,
        changes: Vec<RequirementChange>,
        lifecycle: Option<Requirement>,
    ) -> Self {
        Self {
            scope,
            changes,
            lifecycle,
        }
    }

    /// Applicability scope.
    pub fn scope(&self) -> &[Vec<Requirement>] {
        &self.scope
    }

    /// Rewrite rules, in application order.
    pub fn changes(&self) -> &[RequirementChange] {
        &self.changes
    }

    /// Requirement that must stay satisfiable for the patch to stay
    /// installed.
    pub fn lifecycle(&self) -> Option<&Requirement> {
        self.lifecycle.as_ref()
    }

    /// Whether some AND-group is fully satisfied by `target`'s capabilities.
    /// An empty group is trivially satisfied.
    pub fn applies_to(&self, target: &impl InstallableView) -> bool {
        self.scope
            .iter()
            .any(|group| group.iter().all(|r| target.satisfies(r)))
    }

    /// `target`'s requirements after rewriting, or `None` if the patch does
    /// not apply to it.
    ///
    /// Each existing requirement is rewritten by the first change matching
    /// it. Additions are appended after the rewritten list.
    pub fn apply(&self, target: &impl InstallableView) -> Option<Vec<Requirement>> {
        if !self.applies_to(target) {
            tracing::trace!(unit = target.id(), "patch scope does not match");
            return None;
        }

        let mut rewritten = Vec::new();
        let mut replaced = 0usize;
        for existing in target.requirements() {
            match self.changes.iter().find(|c| c.matches(existing)) {
                Some(change) => {
                    replaced += 1;
                    rewritten.extend(change.new_value.iter().cloned());
                }
                None => rewritten.push(existing.clone()),
            }
        }
        let added = self
            .changes
            .iter()
            .filter(|c| c.apply_on.is_none())
            .filter_map(|c| c.new_value.clone());
        rewritten.extend(added);

        tracing::debug!(
            unit = target.id(),
            version = %target.version(),
            replaced,
            total = rewritten.len(),
            "applied patch"
        );
        Some(rewritten)
    }

    /// Whether the lifecycle requirement is met by some unit in `context`.
    /// A patch without one is always live.
    pub fn lifecycle_satisfied<'a, V: InstallableView + 'a>(
        &self,
        context: impl IntoIterator<Item = &'a V>,
    ) -> bool {
        self.lifecycle
            .as_ref()
            .is_none_or(|lifecycle| context.into_iter().any(|unit| unit.satisfies(lifecycle)))
    }
}
