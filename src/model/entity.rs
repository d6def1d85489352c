//! Entity variants and their CREATE / DROP renderings
//!
//! Names held by entities are resolved: unquoted identifiers already folded to
//! lower case, quoted identifiers verbatim without their quotes. Rendering
//! re-quotes whatever needs it.

use std::fmt;

use super::identity::{EntityKind, IdentityKey, DEFAULT_SCHEMA};
use crate::error::ParseError;
use crate::normalize::signature_identity;
use crate::parser::identifier_utils::{display_identifier, split_qualified_name};
use crate::util::{normalize_whitespace, strip_terminating_semicolon};

/// A possibly schema-qualified relation name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
        }
    }

    /// Parse `schema.name` as written in SQL, folding both parts
    pub fn parse(text: &str) -> Self {
        let (schema, name) = split_qualified_name(text);
        Self { schema, name }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", schema_prefix(&self.schema), display_identifier(&self.name))
    }
}

/// Function or procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    pub schema: Option<String>,
    /// `name(arguments)` exactly as declared, without schema
    pub signature: String,
    /// Everything after the signature: RETURNS, options and body
    pub definition: String,
}

impl Routine {
    pub fn new(
        schema: Option<String>,
        signature: impl Into<String>,
        definition: impl AsRef<str>,
    ) -> Self {
        Self {
            schema,
            signature: signature.into().trim().to_string(),
            definition: strip_terminating_semicolon(definition.as_ref()).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub schema: Option<String>,
    pub name: String,
    /// Explicit column list, without parentheses
    pub columns: Option<String>,
    /// The query after `AS`
    pub definition: String,
}

impl View {
    pub fn new(schema: Option<String>, name: impl Into<String>, definition: impl AsRef<str>) -> Self {
        Self {
            schema,
            name: name.into(),
            columns: None,
            definition: strip_terminating_semicolon(definition.as_ref()).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedView {
    pub schema: Option<String>,
    pub name: String,
    pub columns: Option<String>,
    /// The query after `AS`, without the `WITH [NO] DATA` suffix
    pub definition: String,
    pub with_data: bool,
}

impl MaterializedView {
    pub fn new(
        schema: Option<String>,
        name: impl Into<String>,
        definition: impl AsRef<str>,
        with_data: bool,
    ) -> Self {
        Self {
            schema,
            name: name.into(),
            columns: None,
            definition: strip_terminating_semicolon(definition.as_ref()).to_string(),
            with_data,
        }
    }
}

/// Trigger; its schema is the schema of the table it is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub name: String,
    pub table: QualifiedName,
    /// Timing and events, e.g. `AFTER INSERT OR UPDATE`
    pub events: String,
    /// Everything after the table: `FOR EACH ...`, `WHEN (...)`, `EXECUTE ...`
    pub definition: String,
    pub is_constraint: bool,
}

impl Trigger {
    pub fn new(
        name: impl Into<String>,
        table: QualifiedName,
        events: impl AsRef<str>,
        definition: impl AsRef<str>,
    ) -> Self {
        Self {
            name: name.into(),
            table,
            events: events.as_ref().trim().to_string(),
            definition: strip_terminating_semicolon(definition.as_ref()).to_string(),
            is_constraint: false,
        }
    }
}

/// Row-security policy; its schema is the schema of the table it applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub name: String,
    pub table: QualifiedName,
    /// `AS ...`, `FOR ...`, `TO ...`, `USING (...)`, `WITH CHECK (...)`; may be empty
    pub definition: String,
}

impl Policy {
    pub fn new(name: impl Into<String>, table: QualifiedName, definition: impl AsRef<str>) -> Self {
        Self {
            name: name.into(),
            table,
            definition: strip_terminating_semicolon(definition.as_ref()).to_string(),
        }
    }
}

/// A declared or introspected database entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Function(Routine),
    Procedure(Routine),
    View(View),
    MaterializedView(MaterializedView),
    Trigger(Trigger),
    Policy(Policy),
}

impl Entity {
    pub fn function(
        schema: Option<String>,
        signature: impl Into<String>,
        definition: impl AsRef<str>,
    ) -> Self {
        Entity::Function(Routine::new(schema, signature, definition))
    }

    pub fn procedure(
        schema: Option<String>,
        signature: impl Into<String>,
        definition: impl AsRef<str>,
    ) -> Self {
        Entity::Procedure(Routine::new(schema, signature, definition))
    }

    /// Build an entity from a complete CREATE statement
    pub fn from_sql(sql: &str) -> Result<Self, ParseError> {
        crate::parser::parse_entity(sql)
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Function(_) => EntityKind::Function,
            Entity::Procedure(_) => EntityKind::Procedure,
            Entity::View(_) => EntityKind::View,
            Entity::MaterializedView(_) => EntityKind::MaterializedView,
            Entity::Trigger(_) => EntityKind::Trigger,
            Entity::Policy(_) => EntityKind::Policy,
        }
    }

    /// Schema as declared, `None` when unqualified
    pub fn schema(&self) -> Option<&str> {
        match self {
            Entity::Function(r) | Entity::Procedure(r) => r.schema.as_deref(),
            Entity::View(v) => v.schema.as_deref(),
            Entity::MaterializedView(m) => m.schema.as_deref(),
            Entity::Trigger(t) => t.table.schema.as_deref(),
            Entity::Policy(p) => p.table.schema.as_deref(),
        }
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Entity::Procedure(_))
    }

    pub fn definition(&self) -> &str {
        match self {
            Entity::Function(r) | Entity::Procedure(r) => &r.definition,
            Entity::View(v) => &v.definition,
            Entity::MaterializedView(m) => &m.definition,
            Entity::Trigger(t) => &t.definition,
            Entity::Policy(p) => &p.definition,
        }
    }

    /// Signature part of the identity key
    ///
    /// Routines use `name(input types)` with synonyms canonicalized; triggers
    /// and policies use `name ON table` since their names are per table.
    pub fn identity_signature(&self) -> String {
        match self {
            Entity::Function(r) | Entity::Procedure(r) => signature_identity(&r.signature),
            Entity::View(v) => display_identifier(&v.name),
            Entity::MaterializedView(m) => display_identifier(&m.name),
            Entity::Trigger(t) => format!(
                "{} ON {}",
                display_identifier(&t.name),
                display_identifier(&t.table.name)
            ),
            Entity::Policy(p) => format!(
                "{} ON {}",
                display_identifier(&p.name),
                display_identifier(&p.table.name)
            ),
        }
    }

    /// Identity key with unqualified entities resolved to `public`
    pub fn identity(&self) -> IdentityKey {
        self.identity_with(false)
    }

    /// Identity key, omitting the schema entirely when `ignore_schema` is set
    pub fn identity_with(&self, ignore_schema: bool) -> IdentityKey {
        let schema = if ignore_schema {
            None
        } else {
            Some(self.schema().unwrap_or(DEFAULT_SCHEMA).to_string())
        };
        IdentityKey::new(self.kind(), schema, self.identity_signature())
    }

    pub fn dependency_tier(&self) -> u8 {
        self.kind().dependency_tier()
    }

    pub fn supports_semantic_compare(&self) -> bool {
        self.kind().supports_semantic_compare()
    }

    pub fn supports_atomic_replace(&self) -> bool {
        self.kind().supports_atomic_replace()
    }

    /// Copy of the entity with every schema qualifier removed
    pub fn without_schema(&self) -> Self {
        let mut entity = self.clone();
        match &mut entity {
            Entity::Function(r) | Entity::Procedure(r) => r.schema = None,
            Entity::View(v) => v.schema = None,
            Entity::MaterializedView(m) => m.schema = None,
            Entity::Trigger(t) => t.table.schema = None,
            Entity::Policy(p) => p.table.schema = None,
        }
        entity
    }

    pub fn render_create(&self) -> String {
        self.render_create_statement(false)
    }

    /// `CREATE OR REPLACE` form, for kinds that have one
    pub fn render_replace(&self) -> Option<String> {
        self.supports_atomic_replace()
            .then(|| self.render_create_statement(true))
    }

    fn render_create_statement(&self, or_replace: bool) -> String {
        let create = if or_replace {
            "CREATE OR REPLACE"
        } else {
            "CREATE"
        };
        let keyword = self.kind().sql_keyword();
        match self {
            Entity::Function(r) | Entity::Procedure(r) => format!(
                "{create} {keyword} {}{} {}",
                schema_prefix(&r.schema),
                r.signature,
                r.definition
            ),
            Entity::View(v) => format!(
                "{create} {keyword} {}{}{} AS {}",
                schema_prefix(&v.schema),
                display_identifier(&v.name),
                column_list(&v.columns),
                v.definition
            ),
            Entity::MaterializedView(m) => format!(
                "{create} {keyword} {}{}{} AS {} WITH {}DATA",
                schema_prefix(&m.schema),
                display_identifier(&m.name),
                column_list(&m.columns),
                m.definition,
                if m.with_data { "" } else { "NO " }
            ),
            Entity::Trigger(t) => format!(
                "{create} {}{keyword} {} {} ON {} {}",
                if t.is_constraint { "CONSTRAINT " } else { "" },
                display_identifier(&t.name),
                t.events,
                t.table,
                t.definition
            ),
            Entity::Policy(p) => {
                let mut sql = format!(
                    "{create} {keyword} {} ON {}",
                    display_identifier(&p.name),
                    p.table
                );
                if !p.definition.is_empty() {
                    sql.push(' ');
                    sql.push_str(&p.definition);
                }
                sql
            }
        }
    }

    pub fn render_drop(&self, cascade: bool) -> String {
        let keyword = self.kind().sql_keyword();
        let target = match self {
            Entity::Function(r) | Entity::Procedure(r) => format!(
                "{}{}",
                schema_prefix(&r.schema),
                signature_identity(&r.signature)
            ),
            Entity::View(v) => format!("{}{}", schema_prefix(&v.schema), display_identifier(&v.name)),
            Entity::MaterializedView(m) => {
                format!("{}{}", schema_prefix(&m.schema), display_identifier(&m.name))
            }
            Entity::Trigger(t) => format!("{} ON {}", display_identifier(&t.name), t.table),
            Entity::Policy(p) => format!("{} ON {}", display_identifier(&p.name), p.table),
        };
        let cascade = if cascade { " CASCADE" } else { "" };
        format!("DROP {keyword} {target}{cascade}")
    }

    /// Whitespace-normalized CREATE statement, the equality rule for kinds
    /// without a semantic comparator.
    ///
    /// Unqualified names are rendered in `public`, as they resolve for the
    /// identity key.
    pub fn verbatim_form(&self) -> String {
        normalize_whitespace(&self.with_default_schema().render_create())
    }

    fn with_default_schema(&self) -> Self {
        let mut entity = self.clone();
        let schema = match &mut entity {
            Entity::Function(r) | Entity::Procedure(r) => &mut r.schema,
            Entity::View(v) => &mut v.schema,
            Entity::MaterializedView(m) => &mut m.schema,
            Entity::Trigger(t) => &mut t.table.schema,
            Entity::Policy(p) => &mut p.table.schema,
        };
        schema.get_or_insert_with(|| DEFAULT_SCHEMA.to_string());
        entity
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

fn schema_prefix(schema: &Option<String>) -> String {
    schema
        .as_deref()
        .map(|s| format!("{}.", display_identifier(s)))
        .unwrap_or_default()
}

fn column_list(columns: &Option<String>) -> String {
    columns
        .as_deref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}
