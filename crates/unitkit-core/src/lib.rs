//! Installable units and the views a planner reads them through.
//!
//! Units are described with a [`UnitDescription`] (usually obtained from a
//! [`UnitFactory`]), finished into an immutable [`Unit`], and shared as
//! `Arc<Unit>`. On top of that:
//!
//! - [`attach_fragments`] builds a [`ResolvedUnit`] unioning a host with its
//!   fragments
//! - [`Patch`] rewrites a target's requirements when its scope matches
//! - [`UpdateDescriptor`] says which older units a unit replaces
//! - [`InstallableView`] plus [`is_match`] and [`candidates`] is all the
//!   planner needs
//!
//! The constraint primitives live in `unitkit_schema` and are re-exported
//! here for convenience.

pub mod config;
pub mod description;
pub mod environment;
pub mod error;
pub mod factory;
pub mod fragment;
pub mod license;
pub mod patch;
pub mod touchpoint;
pub mod unit;
pub mod update;
pub mod view;

// Re-exports
pub use config::FactoryConfig;
pub use description::UnitDescription;
pub use environment::Environment;
pub use error::CoreError;
pub use factory::UnitFactory;
pub use fragment::{ResolvedUnit, attach_fragments};
pub use license::{Copyright, License};
pub use patch::{Patch, RequirementChange};
pub use touchpoint::{
    DEFAULT_TOUCHPOINT_CACHE_CAPACITY, TouchpointData, TouchpointInstruction, TouchpointType,
};
pub use unit::{
    ArtifactKey, NAMESPACE_UNIT_FRAGMENT, NAMESPACE_UNIT_ID, Unit, UnitKind, UnitProperties,
};
pub use unitkit_schema::{
    Filter, MatchExpression, Properties, PropertyValue, ProvidedCapability, Requirement,
    Satisfaction, SchemaError, Version, VersionRange, is_satisfied_by,
};
pub use update::{Severity, UpdateDescriptor};
pub use view::{InstallableView, candidates, evaluate, is_match, singleton_conflict};
