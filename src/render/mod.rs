//! Upgrade / downgrade SQL for operations

mod script;

use crate::config::DiffConfig;
use crate::diff::Operation;

pub use script::{embed_literal, render_script, MigrationScript, ScriptStep};

/// Statements that apply an operation and statements that revert it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedOperation {
    pub upgrade: Vec<String>,
    pub downgrade: Vec<String>,
}

impl RenderedOperation {
    pub fn upgrade_sql(&self) -> String {
        join_statements(&self.upgrade)
    }

    pub fn downgrade_sql(&self) -> String {
        join_statements(&self.downgrade)
    }
}

/// Render both directions of an operation.
///
/// Only drops in the upgrade direction honor `drop_cascade`; a downgrade that
/// removes something this migration created never cascades.
pub fn render(op: &Operation, config: &DiffConfig) -> RenderedOperation {
    let (upgrade, downgrade) = match op {
        Operation::Create(entity) => (
            vec![entity.render_create()],
            vec![entity.render_drop(false)],
        ),
        Operation::Drop(entity) => (
            vec![entity.render_drop(config.drop_cascade)],
            vec![entity.render_create()],
        ),
        Operation::Replace { old, new } => match (new.render_replace(), old.render_replace()) {
            (Some(up), Some(down)) => (vec![up], vec![down]),
            _ => (
                vec![old.render_drop(false), new.render_create()],
                vec![new.render_drop(false), old.render_create()],
            ),
        },
    };
    RenderedOperation { upgrade, downgrade }
}

/// Statements each terminated by `;` on its own line
pub(crate) fn join_statements(statements: &[String]) -> String {
    statements.iter().map(|s| format!("{s};\n")).collect()
}
