//! pg-drift: drift detection for PostgreSQL functions, procedures, views,
//! materialized views, triggers and policies
//!
//! Declared entities are compared against the entities present in a database
//! snapshot, and the differences come back as ordered create / replace / drop
//! operations with upgrade and downgrade SQL.

pub mod config;
pub mod diff;
pub mod error;
pub mod introspect;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod render;
pub mod util;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

pub use config::DiffConfig;
pub use diff::{diff, DegradedComparison, DiffEngine, DiffReport, FallbackReason, Operation};
pub use error::{DriftError, ParseError};
pub use introspect::{Introspector, SqlDumpIntrospector};
pub use model::{Entity, EntityKind, EntitySet, IdentityKey, IntrospectionResult, Registry};
pub use normalize::{NormalizedForm, Normalizer};
pub use parser::{load_entities, PostgresGrammar, RoutineGrammar};
pub use render::{render, render_script, MigrationScript, RenderedOperation};

/// Options for one autogenerate pass
#[derive(Debug, Clone)]
pub struct AutogenerateOptions {
    /// File or directory of `.sql` files holding the declared entities
    pub declared_path: PathBuf,
    /// Catalog dump describing what the database currently contains
    pub snapshot_path: PathBuf,
    pub config: DiffConfig,
}

/// Outcome of an autogenerate pass
#[derive(Debug, Clone)]
pub struct Autogenerated {
    pub script: MigrationScript,
    pub report: DiffReport,
}

/// Load both sides, diff them and render the migration script
pub fn autogenerate(options: &AutogenerateOptions) -> Result<Autogenerated> {
    // Step 1: Declared entities
    let registry = load_entities(&options.declared_path)?;
    if registry.is_empty() {
        warn!(path = %options.declared_path.display(), "no declared entities found");
    }
    debug!(entities = registry.len(), "loaded declared entities");

    // Step 2: Database snapshot
    let snapshot = SqlDumpIntrospector::new(&options.snapshot_path).snapshot()?;

    // Step 3: Diff
    let report = DiffEngine::new(options.config).diff(&registry, &snapshot)?;

    // Step 4: Render
    let script = render_script(&report.operations, &options.config);
    info!(
        steps = script.upgrade.len(),
        degraded = report.degraded.len(),
        "generated migration"
    );

    Ok(Autogenerated { script, report })
}
