//! Entity model: kinds, identity keys, variants and entity sets

mod entity;
mod entity_set;
mod identity;

pub use entity::{Entity, MaterializedView, Policy, QualifiedName, Routine, Trigger, View};
pub(crate) use entity_set::duplicate_identity;
pub use entity_set::{EntitySet, IntrospectionResult, Registry};
pub use identity::{EntityKind, IdentityKey, DEFAULT_SCHEMA};
