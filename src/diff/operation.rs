//! Reconciliation operations

use std::fmt;

use crate::model::Entity;

/// One step of a migration, renderable in both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Declared but absent from the database
    Create(Entity),
    /// Present on both sides with different definitions; `old` is the
    /// database's version so the downgrade can restore it
    Replace { old: Entity, new: Entity },
    /// Present in the database but no longer declared
    Drop(Entity),
}

impl Operation {
    /// The entity the operation leaves in place (or removes, for drops)
    pub fn entity(&self) -> &Entity {
        match self {
            Operation::Create(e) | Operation::Drop(e) => e,
            Operation::Replace { new, .. } => new,
        }
    }

    pub fn is_drop(&self) -> bool {
        matches!(self, Operation::Drop(_))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Replace { .. } => "replace",
            Operation::Drop(_) => "drop",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.action(), self.entity())
    }
}
