//! CREATE statement recognition for every entity kind
//!
//! Functions and procedures are split with the token parser, since their
//! signatures may contain defaults with arbitrary quoting. The remaining kinds
//! have a regular enough head to be matched with patterns:
//!
//! ```sql
//! CREATE [OR REPLACE] VIEW name [(columns)] AS query
//! CREATE MATERIALIZED VIEW [IF NOT EXISTS] name [(columns)] AS query [WITH [NO] DATA]
//! CREATE [OR REPLACE] [CONSTRAINT] TRIGGER name events ON table rest
//! CREATE POLICY name ON table [rest]
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::identifier_utils::fold_identifier;
use super::token_parser_base::TokenParser;
use crate::error::ParseError;
use crate::model::{
    Entity, EntityKind, MaterializedView, Policy, QualifiedName, Routine, Trigger, View,
};
use crate::util::{normalize_whitespace, strip_terminating_semicolon};

/// One identifier, quoted or bare
const IDENT: &str = r#"(?:"(?:[^"]|"")+"|[A-Za-z_][\w$]*)"#;

static HEAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^\s*create\s+(?:or\s+replace\s+)?(?:constraint\s+)?(?P<kind>function|procedure|materialized\s+view|view|trigger|policy)\b",
    )
    .unwrap()
});

static VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create\s+(?:or\s+replace\s+)?view\s+(?P<name>{qname})\s*(?:\((?P<columns>[^)]*)\)\s*)?as\s+(?P<definition>.*)$",
        qname = qualified_name_pattern()
    ))
    .unwrap()
});

static MATERIALIZED_VIEW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create\s+materialized\s+view\s+(?:if\s+not\s+exists\s+)?(?P<name>{qname})\s*(?:\((?P<columns>[^)]*)\)\s*)?as\s+(?P<definition>.*?)(?:\s+with\s+(?P<no>no\s+)?data)?\s*$",
        qname = qualified_name_pattern()
    ))
    .unwrap()
});

static TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create\s+(?:or\s+replace\s+)?(?P<constraint>constraint\s+)?trigger\s+(?P<name>{IDENT})\s+(?P<events>.*?)\s+on\s+(?P<table>{qname})\s*(?P<definition>.*)$",
        qname = qualified_name_pattern()
    ))
    .unwrap()
});

static POLICY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)^\s*create\s+policy\s+(?P<name>{IDENT})\s+on\s+(?P<table>{qname})\s*(?P<definition>.*)$",
        qname = qualified_name_pattern()
    ))
    .unwrap()
});

fn qualified_name_pattern() -> String {
    format!(r"{IDENT}(?:\s*\.\s*{IDENT})?")
}

/// Entity kind created by a statement, if it is one we track
pub fn classify_statement(sql: &str) -> Option<EntityKind> {
    let caps = HEAD_RE.captures(sql)?;
    let kind = normalize_whitespace(&caps["kind"]).to_lowercase();
    match kind.as_str() {
        "function" => Some(EntityKind::Function),
        "procedure" => Some(EntityKind::Procedure),
        "view" => Some(EntityKind::View),
        "materialized view" => Some(EntityKind::MaterializedView),
        "trigger" => Some(EntityKind::Trigger),
        "policy" => Some(EntityKind::Policy),
        _ => None,
    }
}

/// Build an entity from one complete CREATE statement
pub fn parse_entity(sql: &str) -> Result<Entity, ParseError> {
    let sql = strip_leading_comments(sql)?;
    let sql = strip_terminating_semicolon(&sql);

    let kind = classify_statement(sql).ok_or_else(|| unrecognized(sql))?;
    match kind {
        EntityKind::Function => Ok(Entity::Function(parse_routine(sql)?)),
        EntityKind::Procedure => Ok(Entity::Procedure(parse_routine(sql)?)),
        EntityKind::View => {
            let caps = VIEW_RE.captures(sql).ok_or_else(|| unrecognized(sql))?;
            let name = QualifiedName::parse(&caps["name"]);
            let mut view = View::new(name.schema, name.name, &caps["definition"]);
            view.columns = columns(&caps);
            Ok(Entity::View(view))
        }
        EntityKind::MaterializedView => {
            let caps = MATERIALIZED_VIEW_RE
                .captures(sql)
                .ok_or_else(|| unrecognized(sql))?;
            let name = QualifiedName::parse(&caps["name"]);
            let with_data = caps.name("no").is_none();
            let mut view =
                MaterializedView::new(name.schema, name.name, &caps["definition"], with_data);
            view.columns = columns(&caps);
            Ok(Entity::MaterializedView(view))
        }
        EntityKind::Trigger => {
            let caps = TRIGGER_RE.captures(sql).ok_or_else(|| unrecognized(sql))?;
            let mut trigger = Trigger::new(
                fold_identifier(&caps["name"]),
                QualifiedName::parse(&caps["table"]),
                normalize_whitespace(&caps["events"]),
                &caps["definition"],
            );
            trigger.is_constraint = caps.name("constraint").is_some();
            Ok(Entity::Trigger(trigger))
        }
        EntityKind::Policy => {
            let caps = POLICY_RE.captures(sql).ok_or_else(|| unrecognized(sql))?;
            Ok(Entity::Policy(Policy::new(
                fold_identifier(&caps["name"]),
                QualifiedName::parse(&caps["table"]),
                &caps["definition"],
            )))
        }
    }
}

/// Split `CREATE ... name(args) rest` into schema, signature and definition
fn parse_routine(sql: &str) -> Result<Routine, ParseError> {
    let mut parser = TokenParser::new(sql)?;
    parser.skip_whitespace();
    parser.expect_word_ci("CREATE")?;
    parser.skip_whitespace();
    if parser.consume_word_ci("OR") {
        parser.skip_whitespace();
        parser.expect_word_ci("REPLACE")?;
        parser.skip_whitespace();
    }
    if !parser.consume_word_ci("FUNCTION") {
        parser.expect_word_ci("PROCEDURE")?;
    }
    parser.skip_whitespace();

    let (schema, _, name_pos) = parser.parse_qualified_name()?;
    parser.skip_whitespace();
    parser.skip_parenthesized()?;

    let signature = parser.tokens_to_string(name_pos, parser.pos());
    let definition = parser.tokens_to_string(parser.pos(), parser.len());
    if definition.trim().is_empty() {
        return Err(parser.error("expected routine definition"));
    }
    Ok(Routine::new(schema, signature, definition))
}

fn strip_leading_comments(sql: &str) -> Result<String, ParseError> {
    let mut parser = TokenParser::new(sql)?;
    parser.skip_whitespace();
    Ok(parser.tokens_to_string(parser.pos(), parser.len()))
}

fn columns(caps: &Captures<'_>) -> Option<String> {
    caps.name("columns")
        .map(|c| normalize_whitespace(c.as_str()))
        .filter(|c| !c.is_empty())
}

fn unrecognized(sql: &str) -> ParseError {
    let head: String = normalize_whitespace(sql).chars().take(60).collect();
    ParseError::new(format!("unrecognized CREATE statement: {head}"))
}
