//! Migration script assembly

use super::{join_statements, render};
use crate::config::DiffConfig;
use crate::diff::Operation;

/// Statements rendered for one operation in one direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// e.g. `create function public.f(integer)`
    pub label: String,
    pub statements: Vec<String>,
}

/// Both directions of a migration.
///
/// Upgrade steps follow operation order; downgrade steps run in reverse so
/// each one undoes the upgrade step that came last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationScript {
    pub upgrade: Vec<ScriptStep>,
    pub downgrade: Vec<ScriptStep>,
}

pub fn render_script(operations: &[Operation], config: &DiffConfig) -> MigrationScript {
    let mut script = MigrationScript::default();
    for op in operations {
        let rendered = render(op, config);
        script.upgrade.push(ScriptStep {
            label: op.to_string(),
            statements: rendered.upgrade,
        });
        script.downgrade.push(ScriptStep {
            label: format!("{} {}", inverse_action(op), op.entity()),
            statements: rendered.downgrade,
        });
    }
    script.downgrade.reverse();
    script
}

fn inverse_action(op: &Operation) -> &'static str {
    match op {
        Operation::Create(_) => "drop",
        Operation::Replace { .. } => "restore",
        Operation::Drop(_) => "create",
    }
}

impl MigrationScript {
    pub fn is_empty(&self) -> bool {
        self.upgrade.is_empty()
    }

    pub fn upgrade_sql(&self) -> String {
        steps_sql(&self.upgrade)
    }

    pub fn downgrade_sql(&self) -> String {
        steps_sql(&self.downgrade)
    }

    /// Both directions with every statement embedded as a string literal
    /// passed to `execute(...)`, the form a migration file template consumes
    pub fn to_literals(&self, config: &DiffConfig) -> String {
        let multiline = config.render_definition_multiline;
        let mut out = String::new();
        for (title, steps) in [("upgrade", &self.upgrade), ("downgrade", &self.downgrade)] {
            out.push_str(&format!("// {title}\n"));
            for step in steps {
                out.push_str(&format!("// {}\n", step.label));
                for statement in &step.statements {
                    out.push_str(&format!("execute({});\n", embed_literal(statement, multiline)));
                }
            }
            out.push('\n');
        }
        out
    }
}

fn steps_sql(steps: &[ScriptStep]) -> String {
    steps
        .iter()
        .map(|step| format!("-- {}\n{}", step.label, join_statements(&step.statements)))
        .collect()
}

/// Embed SQL as a string literal.
///
/// Multi-line mode produces a raw `r#"..."#` block, with enough `#` marks to
/// survive any `"#` run inside the SQL; single-line mode an escaped literal.
pub fn embed_literal(sql: &str, multiline: bool) -> String {
    if !multiline {
        return format!("{sql:?}");
    }
    let mut hashes = 1;
    while sql.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"\n{sql}\n\"{fence}")
}
