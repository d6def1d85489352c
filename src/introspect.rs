//! Introspection boundary
//!
//! The catalog queries themselves live outside this crate. An [`Introspector`]
//! hands the diff engine one consistent snapshot of the database's entities;
//! any failure to produce it is fatal for the pass.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::DriftError;
use crate::model::IntrospectionResult;
use crate::parser::load_entities;

/// Source of the entities currently present in the database
pub trait Introspector {
    fn snapshot(&self) -> Result<IntrospectionResult, DriftError>;
}

/// Snapshot read from a catalog dump: a `.sql` file (or directory of them)
/// holding one CREATE statement per entity, e.g. `pg_dump --schema-only`
/// output or the result of `pg_get_functiondef` / `pg_get_viewdef` queries.
#[derive(Debug, Clone)]
pub struct SqlDumpIntrospector {
    path: PathBuf,
}

impl SqlDumpIntrospector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Introspector for SqlDumpIntrospector {
    fn snapshot(&self) -> Result<IntrospectionResult, DriftError> {
        let snapshot = load_entities(&self.path).map_err(|err| {
            DriftError::IntrospectionUnavailable {
                source_name: self.path.display().to_string(),
                message: err.to_string(),
            }
        })?;
        info!(entities = snapshot.len(), source = %self.path.display(), "loaded snapshot");
        Ok(snapshot)
    }
}

impl<F> Introspector for F
where
    F: Fn() -> Result<IntrospectionResult, DriftError>,
{
    fn snapshot(&self) -> Result<IntrospectionResult, DriftError> {
        self()
    }
}
