//! Constraint primitives for installable units.
//!
//! Everything here is immutable once constructed and validated at
//! construction time:
//!
//! - [`Version`] / [`VersionRange`]: the ordering every match is built on
//! - [`Filter`]: LDAP-style predicates over [`Properties`]
//! - [`ProvidedCapability`]: a fact a unit offers
//! - [`Requirement`] / [`MatchExpression`]: a need a unit declares

pub mod capability;
pub mod error;
pub mod filter;
pub mod property;
pub mod range;
pub mod requirement;
pub mod version;

// Re-exports
pub use capability::{ProvidedCapability, VERSION_KEY};
pub use error::SchemaError;
pub use filter::Filter;
pub use property::{Properties, PropertyValue};
pub use range::VersionRange;
pub use requirement::{
    CapabilityPredicate, MatchExpression, Requirement, Satisfaction, is_satisfied_by,
};
pub use version::Version;
