//! Loading declared entities from `.sql` files

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use rayon::prelude::*;
use tracing::debug;

use super::batch::split_statements;
use super::statement_parser::{classify_statement, parse_entity};
use crate::error::DriftError;
use crate::model::{Entity, EntitySet};

/// Minimum number of files to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Read a file as a string, trying UTF-8 first, then Windows-1252 as fallback
pub fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ));
            }
            decoded.into_owned()
        }
    };

    Ok(match content.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// `.sql` files under `path` in file-name order, or `path` itself if it is a file
pub fn discover_sql_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }
    walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "sql"))
        .collect()
}

/// Parse every tracked CREATE statement in one file.
///
/// Statements creating other objects (tables, indexes, grants, ...) are
/// skipped; a tracked statement that does not parse is an error.
pub fn parse_sql_file(path: &Path) -> Result<Vec<Entity>, DriftError> {
    let content =
        read_file_with_encoding_fallback(path).map_err(|e| DriftError::SqlFileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

    let statements = split_statements(&content).map_err(|e| DriftError::EntityParseError {
        path: path.to_path_buf(),
        message: e.message,
    })?;

    let mut entities = Vec::with_capacity(statements.len());
    for statement in statements {
        if classify_statement(&statement).is_none() {
            debug!(path = %path.display(), "skipping untracked statement");
            continue;
        }
        let entity = parse_entity(&statement).map_err(|e| DriftError::EntityParseError {
            path: path.to_path_buf(),
            message: e.message,
        })?;
        entities.push(entity);
    }
    Ok(entities)
}

/// Load a file or directory of `.sql` files into an entity set.
///
/// Files are parsed in parallel above a small threshold; registration always
/// happens in file order, so duplicate reporting is deterministic.
pub fn load_entities(path: &Path) -> Result<EntitySet, DriftError> {
    let files = discover_sql_files(path);
    debug!(count = files.len(), path = %path.display(), "loading sql files");

    let parsed: Vec<Result<Vec<Entity>, DriftError>> = if files.len() >= PARALLEL_THRESHOLD {
        files.par_iter().map(|file| parse_sql_file(file)).collect()
    } else {
        files.iter().map(|file| parse_sql_file(file)).collect()
    };

    let mut set = EntitySet::new();
    for result in parsed {
        for entity in result? {
            set.register(entity)?;
        }
    }
    Ok(set)
}
