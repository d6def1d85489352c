//! Error types for pg-drift

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a comparison pass.
///
/// None of these are produced for a single unparseable routine body; that case
/// is a [`ParseError`] and is recovered inside the diff engine.
#[derive(Error, Debug)]
pub enum DriftError {
    #[error("Duplicate identity {key}: {first} conflicts with {second}")]
    DuplicateIdentity {
        key: String,
        first: String,
        second: String,
    },

    #[error("Introspection snapshot unavailable from {source_name}: {message}")]
    IntrospectionUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Failed to read SQL file: {path}")]
    SqlFileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse entity in {path}: {message}")]
    EntityParseError { path: PathBuf, message: String },
}

/// A definition the grammar could not handle.
///
/// Recoverable: the diff engine falls back to verbatim comparison for the one
/// entity pair that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<sqlparser::tokenizer::TokenizerError> for ParseError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        ParseError::new(err.to_string())
    }
}
