//! Canonical spelling of PostgreSQL type names
//!
//! `int`, `int4` and `integer` name the same type, as do `varchar` and
//! `character varying`. Both parameter lists and return types are rewritten to
//! the spelling `format_type()` reports in the catalog.

use sqlparser::tokenizer::Token;

use crate::parser::identifier_utils::{display_identifier, fold_word};
use crate::parser::routine_parser::split_top_level;

/// `pg_type` names that also appear in the synonym table
const CATALOG_NAMES: &[&str] = &[
    "int2", "int4", "int8", "bool", "float4", "float8", "varchar", "bpchar", "numeric",
    "timestamp", "timestamptz", "time", "timetz", "varbit",
];

/// Canonicalize a type given as significant tokens.
///
/// With `keep_modifiers = false`, type modifiers such as `(20)` are dropped;
/// PostgreSQL ignores them in routine signatures.
pub fn canonical_type(tokens: &[Token], keep_modifiers: bool) -> String {
    let (base, dims) = strip_array_suffix(tokens);

    let mut name_tokens = Vec::new();
    let mut modifiers: Option<Vec<Token>> = None;
    let mut depth = 0usize;
    for token in base {
        match token {
            Token::LParen => {
                depth += 1;
                if depth == 1 {
                    modifiers = Some(Vec::new());
                    continue;
                }
            }
            Token::RParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    continue;
                }
            }
            _ => {}
        }
        if depth > 0 {
            if let Some(m) = modifiers.as_mut() {
                m.push(token.clone());
            }
        } else {
            name_tokens.push(token);
        }
    }

    let (raw_name, quoted) = render_name(&name_tokens);
    let raw_name = raw_name
        .strip_prefix("pg_catalog.")
        .map(str::to_string)
        .unwrap_or(raw_name);

    let modifier_text: Option<Vec<String>> = modifiers.map(|m| {
        split_top_level(&m)
            .iter()
            .map(|part| part.iter().map(ToString::to_string).collect::<String>())
            .collect()
    });

    // quoted names only match catalog spellings: "char" is its own type
    let (name, modifier_text) = if quoted && !CATALOG_NAMES.contains(&raw_name.as_str()) {
        (raw_name, modifier_text)
    } else {
        canonical_name(&raw_name, modifier_text)
    };

    let mut out = match modifier_text {
        Some(mods) if keep_modifiers => {
            let mods = format!("({})", mods.join(","));
            match name.split_once(' ') {
                // `timestamp(3) with time zone`
                Some((head, tail)) if head == "timestamp" || head == "time" => {
                    format!("{head}{mods} {tail}")
                }
                _ => format!("{name}{mods}"),
            }
        }
        _ => name,
    };
    for _ in 0..dims {
        out.push_str("[]");
    }
    out
}

/// Remove trailing `[]`, `[n]` and `ARRAY` decorations, counting dimensions
fn strip_array_suffix(tokens: &[Token]) -> (&[Token], usize) {
    let mut end = tokens.len();
    let mut dims = 0;
    loop {
        if end >= 2 && tokens[end - 1] == Token::RBracket {
            if tokens[end - 2] == Token::LBracket {
                end -= 2;
            } else if end >= 3
                && matches!(tokens[end - 2], Token::Number(_, _))
                && tokens[end - 3] == Token::LBracket
            {
                end -= 3;
            } else {
                break;
            }
            dims += 1;
            continue;
        }
        if end >= 2
            && matches!(&tokens[end - 1], Token::Word(w) if w.quote_style.is_none() && w.value.eq_ignore_ascii_case("ARRAY"))
        {
            end -= 1;
            dims = dims.max(1);
            continue;
        }
        break;
    }
    (&tokens[..end], dims)
}

/// Join name tokens: words separated by spaces, `.` and `%` glued.
///
/// Also reports whether the final name part was quoted.
fn render_name(tokens: &[&Token]) -> (String, bool) {
    let mut out = String::new();
    let mut prev_word = false;
    let mut quoted = false;
    for token in tokens {
        match token {
            Token::Word(w) => {
                if prev_word {
                    out.push(' ');
                }
                match w.quote_style {
                    Some(_) => out.push_str(&display_identifier(&fold_word(w))),
                    None => out.push_str(&fold_word(w)),
                }
                quoted = w.quote_style.is_some();
                prev_word = true;
            }
            other => {
                out.push_str(&other.to_string());
                prev_word = false;
            }
        }
    }
    (out, quoted)
}

fn canonical_name(name: &str, modifiers: Option<Vec<String>>) -> (String, Option<Vec<String>>) {
    let canonical = match name {
        "int" | "int4" | "integer" => "integer",
        "int2" | "smallint" => "smallint",
        "int8" | "bigint" => "bigint",
        "bool" | "boolean" => "boolean",
        "float8" | "double precision" => "double precision",
        "float4" | "real" => "real",
        "float" => {
            // float(p): 1..=24 is real, otherwise double precision
            let precision = modifiers
                .as_ref()
                .and_then(|m| m.first())
                .and_then(|p| p.parse::<u32>().ok());
            let name = match precision {
                Some(p) if p <= 24 => "real",
                _ => "double precision",
            };
            return (name.to_string(), None);
        }
        "varchar" | "character varying" | "char varying" | "national character varying" => {
            "character varying"
        }
        "char" | "character" | "bpchar" | "nchar" | "national character" | "national char" => {
            "character"
        }
        "decimal" | "numeric" => "numeric",
        "timestamptz" | "timestamp with time zone" => "timestamp with time zone",
        "timestamp" | "timestamp without time zone" => "timestamp without time zone",
        "timetz" | "time with time zone" => "time with time zone",
        "time" | "time without time zone" => "time without time zone",
        "varbit" | "bit varying" => "bit varying",
        other => other,
    };
    (canonical.to_string(), modifiers)
}
