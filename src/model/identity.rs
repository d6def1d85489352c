//! Entity kinds and identity keys

use std::fmt;

/// Schema assumed for entities declared without one
pub const DEFAULT_SCHEMA: &str = "public";

/// The closed set of entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Function,
    Procedure,
    View,
    MaterializedView,
    Trigger,
    Policy,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Function,
        EntityKind::Procedure,
        EntityKind::View,
        EntityKind::MaterializedView,
        EntityKind::Trigger,
        EntityKind::Policy,
    ];

    /// Fixed ordering rank: creates run in ascending tier order, drops in descending.
    ///
    /// Views may call functions, materialized views may read views, and
    /// triggers and policies reference functions and tables.
    pub fn dependency_tier(self) -> u8 {
        match self {
            EntityKind::Function | EntityKind::Procedure => 0,
            EntityKind::View => 1,
            EntityKind::MaterializedView => 2,
            EntityKind::Trigger => 3,
            EntityKind::Policy => 4,
        }
    }

    /// Only routines are compared through the normalizer
    pub fn supports_semantic_compare(self) -> bool {
        matches!(self, EntityKind::Function | EntityKind::Procedure)
    }

    /// Kinds with a `CREATE OR REPLACE` form
    pub fn supports_atomic_replace(self) -> bool {
        matches!(
            self,
            EntityKind::Function | EntityKind::Procedure | EntityKind::View
        )
    }

    /// SQL keyword(s) naming the kind, as used in CREATE and DROP
    pub fn sql_keyword(self) -> &'static str {
        match self {
            EntityKind::Function => "FUNCTION",
            EntityKind::Procedure => "PROCEDURE",
            EntityKind::View => "VIEW",
            EntityKind::MaterializedView => "MATERIALIZED VIEW",
            EntityKind::Trigger => "TRIGGER",
            EntityKind::Policy => "POLICY",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Function => "function",
            EntityKind::Procedure => "procedure",
            EntityKind::View => "view",
            EntityKind::MaterializedView => "materialized view",
            EntityKind::Trigger => "trigger",
            EntityKind::Policy => "policy",
        };
        f.write_str(name)
    }
}

/// `(kind, schema-or-omitted, signature)`, unique within one entity set
///
/// Ordering is kind, then schema (omitted sorts first), then signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    pub kind: EntityKind,
    pub schema: Option<String>,
    pub signature: String,
}

impl IdentityKey {
    pub fn new(kind: EntityKind, schema: Option<String>, signature: impl Into<String>) -> Self {
        Self {
            kind,
            schema,
            signature: signature.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{} {}.{}", self.kind, schema, self.signature),
            None => write!(f, "{} {}", self.kind, self.signature),
        }
    }
}
