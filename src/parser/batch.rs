//! Statement splitting for SQL scripts

use sqlparser::tokenizer::Token;

use super::token_parser_base::{token_offsets, tokenize};
use crate::error::ParseError;

/// Split a script on top-level semicolons.
///
/// Semicolons inside string literals, dollar-quoted bodies and comments are
/// never separators; neither are those inside a `BEGIN ATOMIC ... END` body.
/// Leading comments are dropped, statements come back without their
/// terminating semicolon, and comment-only fragments are skipped. Statement
/// text is sliced from the script unchanged.
pub fn split_statements(sql: &str) -> Result<Vec<String>, ParseError> {
    let tokens = tokenize(sql)?;
    let offsets = token_offsets(sql, &tokens);
    let mut statements = Vec::new();
    let mut start: Option<usize> = None;
    let mut block_depth = 0usize;
    let mut prev_word: Option<String> = None;

    for (token, &offset) in tokens.iter().map(|t| &t.token).zip(&offsets) {
        match token {
            Token::SemiColon if block_depth == 0 => {
                if let Some(begin) = start.take() {
                    push_statement(&mut statements, &sql[begin..offset]);
                }
                prev_word = None;
                continue;
            }
            // leading comments and blank lines
            Token::Whitespace(_) | Token::EOF => continue,
            Token::Word(w) if w.quote_style.is_none() => {
                let upper = w.value.to_uppercase();
                match upper.as_str() {
                    "ATOMIC" if prev_word.as_deref() == Some("BEGIN") => block_depth += 1,
                    "CASE" if block_depth > 0 => block_depth += 1,
                    "END" if block_depth > 0 => block_depth -= 1,
                    _ => {}
                }
                prev_word = Some(upper);
            }
            _ => prev_word = None,
        }
        start.get_or_insert(offset);
    }
    if let Some(begin) = start {
        push_statement(&mut statements, &sql[begin..]);
    }

    Ok(statements)
}

fn push_statement(statements: &mut Vec<String>, text: &str) {
    let statement = text.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
}
