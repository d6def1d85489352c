//! Token-level canonical text for bodies and expressions

use sqlparser::tokenizer::Token;

use crate::parser::identifier_utils::{format_token_sql, format_word};

/// Join significant tokens with single spaces in canonical spelling.
///
/// Unquoted words are lower-cased; every string literal form (plain,
/// escaped, national, dollar-quoted with any tag) becomes a plain
/// single-quoted literal, so `$$x$$`, `$body$x$body$` and `'x'` agree.
pub fn canonical_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(canonical_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn canonical_token(token: &Token) -> Option<String> {
    let text = match token {
        Token::Whitespace(_) | Token::EOF => return None,
        Token::Word(w) if w.quote_style.is_none() => w.value.to_lowercase(),
        Token::Word(w) => format_word(w),
        Token::SingleQuotedString(s)
        | Token::EscapedStringLiteral(s)
        | Token::NationalStringLiteral(s) => quote_literal(s),
        Token::DollarQuotedString(d) => quote_literal(&d.value),
        other => format_token_sql(other),
    };
    Some(text)
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Canonical text of a body written in a language whose layout matters.
///
/// Only line endings and trailing whitespace are normalized.
pub fn canonical_layout(text: &str) -> String {
    text.replace("\r\n", "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}
