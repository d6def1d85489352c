//! PostgreSQL parsing
//!
//! Routine definitions are parsed through the [`RoutineGrammar`] capability so
//! the normalizer can run against an alternate backend (or a stub in tests).
//! Statement splitting and the `from_sql` constructors for the other entity
//! kinds live here as well.

mod batch;
pub mod identifier_utils;
pub mod routine_parser;
mod sql_files;
mod statement_parser;
pub mod token_parser_base;

use sqlparser::tokenizer::Token;

use crate::error::ParseError;

pub use batch::split_statements;
pub use routine_parser::{
    ParameterMode, ParsedRoutine, ReturnsClause, RoutineBody, RoutineOption, RoutineParameter,
    RoutineTokenParser,
};
pub use sql_files::{discover_sql_files, load_entities, parse_sql_file, read_file_with_encoding_fallback};
pub use statement_parser::{classify_statement, parse_entity};

/// Grammar capability used by the normalizer
pub trait RoutineGrammar: Send + Sync {
    /// Parse a complete `CREATE FUNCTION` / `CREATE PROCEDURE` statement
    fn parse_routine(&self, sql: &str) -> Result<ParsedRoutine, ParseError>;

    /// Significant tokens of a routine body (comments and whitespace removed)
    fn tokenize(&self, sql: &str) -> Result<Vec<Token>, ParseError>;
}

/// The built-in grammar, backed by the sqlparser PostgreSQL tokenizer
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

impl RoutineGrammar for PostgresGrammar {
    fn parse_routine(&self, sql: &str) -> Result<ParsedRoutine, ParseError> {
        RoutineTokenParser::new(sql)?.parse_create_routine()
    }

    fn tokenize(&self, sql: &str) -> Result<Vec<Token>, ParseError> {
        token_parser_base::significant_tokens(sql)
    }
}
