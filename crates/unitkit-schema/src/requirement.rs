//! Requirements and the match expressions they are built from.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{Filter, Properties, ProvidedCapability, SchemaError, VersionRange};

/// A caller-supplied predicate over provided capabilities.
///
/// Implementations are identified by [`id`](Self::id) plus
/// [`payload`](Self::payload); two generic expressions with the same pair
/// are considered equal.
pub trait CapabilityPredicate: fmt::Debug + Send + Sync {
    /// Stable identifier of the predicate kind.
    fn id(&self) -> &str;

    /// Canonical text of the predicate's parameters.
    fn payload(&self) -> &str;

    /// Evaluate against a capability already known to be in the right
    /// namespace.
    fn matches(&self, capability: &ProvidedCapability) -> bool;
}

/// What a requirement matches.
#[derive(Debug, Clone)]
pub enum MatchExpression {
    /// The compact `(namespace, name, range)` shape.
    VersionRange {
        /// Capability namespace.
        namespace: String,
        /// Capability name.
        name: String,
        /// Accepted versions.
        range: VersionRange,
    },
    /// A filter evaluated over the capability's properties.
    Properties {
        /// Capability namespace.
        namespace: String,
        /// Filter over the capability's property map.
        filter: Filter,
    },
    /// An opaque predicate.
    Generic {
        /// Capability namespace.
        namespace: String,
        /// The predicate to evaluate.
        predicate: Arc<dyn CapabilityPredicate>,
    },
}

impl MatchExpression {
    /// Namespace a matching capability must live in.
    pub fn namespace(&self) -> &str {
        match self {
            Self::VersionRange { namespace, .. }
            | Self::Properties { namespace, .. }
            | Self::Generic { namespace, .. } => namespace,
        }
    }

    /// Evaluate against a provided capability.
    pub fn matches(&self, capability: &ProvidedCapability) -> bool {
        if capability.namespace() != self.namespace() {
            return false;
        }
        match self {
            Self::VersionRange { name, range, .. } => {
                capability.name() == name && range.includes(capability.version())
            }
            Self::Properties { filter, .. } => filter.matches(capability.properties()),
            Self::Generic { predicate, .. } => predicate.matches(capability),
        }
    }

    /// The `(namespace, name, range)` triplet, when built from that shorthand.
    pub fn as_triplet(&self) -> Option<(&str, &str, &VersionRange)> {
        match self {
            Self::VersionRange {
                namespace,
                name,
                range,
            } => Some((namespace, name, range)),
            _ => None,
        }
    }
}

impl PartialEq for MatchExpression {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::VersionRange {
                    namespace: n1,
                    name: a,
                    range: r1,
                },
                Self::VersionRange {
                    namespace: n2,
                    name: b,
                    range: r2,
                },
            ) => n1 == n2 && a == b && r1 == r2,
            (
                Self::Properties {
                    namespace: n1,
                    filter: f1,
                },
                Self::Properties {
                    namespace: n2,
                    filter: f2,
                },
            ) => n1 == n2 && f1 == f2,
            (
                Self::Generic {
                    namespace: n1,
                    predicate: p1,
                },
                Self::Generic {
                    namespace: n2,
                    predicate: p2,
                },
            ) => n1 == n2 && p1.id() == p2.id() && p1.payload() == p2.payload(),
            _ => false,
        }
    }
}

impl Eq for MatchExpression {}

impl Hash for MatchExpression {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.namespace().hash(state);
        match self {
            Self::VersionRange { name, range, .. } => {
                name.hash(state);
                range.hash(state);
            }
            Self::Properties { filter, .. } => filter.hash(state),
            Self::Generic { predicate, .. } => {
                predicate.id().hash(state);
                predicate.payload().hash(state);
            }
        }
    }
}

impl fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionRange {
                namespace,
                name,
                range,
            } => write!(f, "{namespace}/{name} {range}"),
            Self::Properties { namespace, filter } => write!(f, "{namespace} {filter}"),
            Self::Generic {
                namespace,
                predicate,
            } => write!(f, "{namespace} <{}:{}>", predicate.id(), predicate.payload()),
        }
    }
}

/// Outcome of checking a requirement against a set of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfaction {
    /// The requirement's filter does not match the environment; it is
    /// neither satisfied nor violated.
    Inert,
    /// Cardinality bounds hold.
    Satisfied,
    /// Fewer matches than `min`.
    Missing,
    /// More matches than a finite `max`.
    TooMany,
    /// A `max = 0` requirement matched something.
    Excluded,
}

impl Satisfaction {
    /// Whether a resolver must reject the candidate set.
    pub fn is_violation(self) -> bool {
        matches!(self, Self::Missing | Self::TooMany | Self::Excluded)
    }
}

/// A cardinality- and filter-bounded need declared by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    expression: MatchExpression,
    filter: Option<Filter>,
    min: u32,
    max: u32,
    greedy: bool,
    description: Option<String>,
}

impl Requirement {
    /// `max` value meaning "any number of matches".
    pub const UNBOUNDED: u32 = u32::MAX;

    /// A mandatory, single-match, greedy requirement.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyField`] if the expression's namespace, or
    /// the name of a version-range expression, is empty.
    pub fn new(expression: MatchExpression) -> Result<Self, SchemaError> {
        if expression.namespace().is_empty() {
            return Err(SchemaError::EmptyField("namespace"));
        }
        if matches!(&expression, MatchExpression::VersionRange { name, .. } if name.is_empty()) {
            return Err(SchemaError::EmptyField("name"));
        }
        Ok(Self {
            expression,
            filter: None,
            min: 1,
            max: 1,
            greedy: true,
            description: None,
        })
    }

    /// Shorthand for the `(namespace, name, range)` shape.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::EmptyField`] if `namespace` or `name` is empty.
    pub fn range(
        namespace: impl Into<String>,
        name: impl Into<String>,
        range: VersionRange,
    ) -> Result<Self, SchemaError> {
        Self::new(MatchExpression::VersionRange {
            namespace: namespace.into(),
            name: name.into(),
            range,
        })
    }

    /// Set the cardinality bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidCardinality`] if `min > max`.
    pub fn with_cardinality(mut self, min: u32, max: u32) -> Result<Self, SchemaError> {
        if min > max {
            return Err(SchemaError::InvalidCardinality { min, max });
        }
        self.min = min;
        self.max = max;
        Ok(self)
    }

    /// Mark the requirement optional (`min = 0`).
    pub fn optional(mut self) -> Self {
        self.min = 0;
        self
    }

    /// Turn the requirement into an exclusion (`min = max = 0`).
    pub fn excluded(mut self) -> Self {
        self.min = 0;
        self.max = 0;
        self
    }

    /// Attach an environment filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the greedy flag.
    pub fn with_greedy(mut self, greedy: bool) -> Self {
        self.greedy = greedy;
        self
    }

    /// Attach a human-readable description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The match expression.
    pub fn expression(&self) -> &MatchExpression {
        &self.expression
    }

    /// Namespace of matching capabilities.
    pub fn namespace(&self) -> &str {
        self.expression.namespace()
    }

    /// Environment filter, if any.
    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Minimum number of matches.
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Maximum number of matches; [`Requirement::UNBOUNDED`] for no limit.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether the planner should eagerly pull in providers.
    pub fn greedy(&self) -> bool {
        self.greedy
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `min = 0`.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// `max = 0`: any match is a violation.
    pub fn is_negative(&self) -> bool {
        self.max == 0
    }

    /// Whether the requirement was built from the triplet shorthand.
    pub fn is_version_range(&self) -> bool {
        self.expression.as_triplet().is_some()
    }

    /// Reconstruct the `(namespace, name, range)` triplet.
    pub fn as_triplet(&self) -> Option<(&str, &str, &VersionRange)> {
        self.expression.as_triplet()
    }

    /// Whether `capability` matches this requirement's expression.
    pub fn is_satisfied_by(&self, capability: &ProvidedCapability) -> bool {
        self.expression.matches(capability)
    }

    /// Whether the environment filter admits `environment`. Unfiltered
    /// requirements always apply.
    pub fn is_applicable(&self, environment: &Properties) -> bool {
        self.filter.as_ref().is_none_or(|f| f.matches(environment))
    }

    /// Check cardinality against the capabilities available to satisfy it.
    pub fn check<'a>(
        &self,
        environment: &Properties,
        candidates: impl IntoIterator<Item = &'a ProvidedCapability>,
    ) -> Satisfaction {
        if !self.is_applicable(environment) {
            return Satisfaction::Inert;
        }

        let limit = usize::try_from(self.max).map_or(usize::MAX, |m| m.saturating_add(1));
        let count = candidates
            .into_iter()
            .filter(|c| self.is_satisfied_by(c))
            .take(limit)
            .count();

        if self.max == 0 {
            return if count == 0 {
                Satisfaction::Satisfied
            } else {
                Satisfaction::Excluded
            };
        }
        if count < usize::try_from(self.min).unwrap_or(usize::MAX) {
            return Satisfaction::Missing;
        }
        if self.max != Self::UNBOUNDED && count > usize::try_from(self.max).unwrap_or(usize::MAX) {
            return Satisfaction::TooMany;
        }
        Satisfaction::Satisfied
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)?;
        if self.min != 1 || self.max != 1 {
            if self.max == Self::UNBOUNDED {
                write!(f, " {{{},*}}", self.min)?;
            } else {
                write!(f, " {{{},{}}}", self.min, self.max)?;
            }
        }
        if let Some(filter) = &self.filter {
            write!(f, " if {filter}")?;
        }
        Ok(())
    }
}

/// Whether `provided` satisfies `requirement`'s match expression.
///
/// Namespaces must be equal; the requirement's environment filter is not
/// consulted here (see [`Requirement::is_applicable`]).
pub fn is_satisfied_by(provided: &ProvidedCapability, requirement: &Requirement) -> bool {
    requirement.is_satisfied_by(provided)
}
