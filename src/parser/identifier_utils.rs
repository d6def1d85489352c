//! Identifier handling utilities for PostgreSQL parsing.
//!
//! PostgreSQL folds unquoted identifiers to lower case and keeps quoted ones
//! verbatim. Every name that takes part in an identity key goes through
//! [`fold_identifier`] so `MyView`, `myview` and `"myview"` compare equal while
//! `"MyView"` stays distinct.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(fold_identifier("MyTable"), "mytable");
//! assert_eq!(fold_identifier("\"MyTable\""), "MyTable");
//! assert_eq!(split_qualified_name("public.users"), (Some("public".into()), "users".into()));
//! ```

use sqlparser::tokenizer::{Token, Word};

/// Fold a single identifier the way PostgreSQL resolves it.
///
/// Quoted identifiers lose their quotes (with `""` unescaped) and keep case;
/// unquoted identifiers are lower-cased.
pub fn fold_identifier(ident: &str) -> String {
    let trimmed = ident.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].replace("\"\"", "\"")
    } else {
        trimmed.to_lowercase()
    }
}

/// Fold a tokenizer word the same way as [`fold_identifier`].
pub fn fold_word(word: &Word) -> String {
    match word.quote_style {
        Some(_) => word.value.clone(),
        None => word.value.to_lowercase(),
    }
}

/// PostgreSQL keywords that cannot name a table, view or function unquoted:
/// the reserved ones plus those only allowed as function or type names.
const RESERVED_KEYWORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant", "group",
    "having", "ilike", "in", "initially", "inner", "intersect", "into", "is", "isnull",
    "join", "lateral", "leading", "left", "like", "limit", "localtime", "localtimestamp",
    "natural", "not", "notnull", "null", "offset", "on", "only", "or", "order", "outer",
    "overlaps", "placing", "primary", "references", "returning", "right", "select",
    "session_user", "similar", "some", "symmetric", "system_user", "table", "tablesample",
    "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic",
    "verbose", "when", "where", "window", "with",
];

/// Render a folded identifier so that it round-trips through the tokenizer.
///
/// Identifiers that are plain lower-case words are emitted bare; reserved
/// keywords and everything else are double quoted.
pub fn display_identifier(folded: &str) -> String {
    let plain = folded
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && folded
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
        && !RESERVED_KEYWORDS.contains(&folded);
    if plain {
        folded.to_string()
    } else {
        format!("\"{}\"", folded.replace('"', "\"\""))
    }
}

/// Split a possibly schema-qualified name into `(schema, name)`, folding both parts.
///
/// Dots inside double-quoted parts are not treated as separators.
pub fn split_qualified_name(name: &str) -> (Option<String>, String) {
    let mut in_quotes = false;
    let mut split_at = None;
    for (i, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => split_at = Some(i),
            _ => {}
        }
    }

    match split_at {
        Some(i) => (
            Some(fold_identifier(&name[..i])),
            fold_identifier(&name[i + 1..]),
        ),
        None => (None, fold_identifier(name)),
    }
}

/// Converts a tokenizer word back to SQL, preserving its quoting.
pub fn format_word(word: &Word) -> String {
    match word.quote_style {
        Some('"') => format!("\"{}\"", word.value.replace('"', "\"\"")),
        Some(q) => format!("{q}{}{q}", word.value),
        None => word.value.clone(),
    }
}

/// Converts a token back to SQL text that re-tokenizes to the same token.
///
/// String literals are re-escaped by doubling single quotes; dollar-quoted
/// strings keep their tag.
pub fn format_token_sql(token: &Token) -> String {
    match token {
        Token::Word(w) => format_word(w),
        Token::SingleQuotedString(s) => format!("'{}'", s.replace('\'', "''")),
        Token::EscapedStringLiteral(s) => format!("E'{}'", escape_string_constant(s)),
        Token::NationalStringLiteral(s) => format!("N'{}'", s.replace('\'', "''")),
        Token::DollarQuotedString(d) => match &d.tag {
            Some(tag) => format!("${tag}${}${tag}$", d.value),
            None => format!("$${}$$", d.value),
        },
        Token::Whitespace(ws) => ws.to_string(),
        Token::EOF => String::new(),
        other => other.to_string(),
    }
}

/// Backslash-escape an unescaped `E'...'` value so it reads back unchanged.
fn escape_string_constant(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out
}
