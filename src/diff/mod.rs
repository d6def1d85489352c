//! Diff engine: declared entities against introspected entities
//!
//! Entities are matched by identity key within each kind. Matched pairs of
//! routines are compared by normalized form; every other kind, and any routine
//! pair the normalizer cannot parse, is compared by whitespace-normalized
//! CREATE text. The resulting operations are ordered so that creates and
//! replaces run first in ascending dependency tier, followed by drops in
//! descending tier; ties break on identity key.

mod operation;
mod report;

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::DiffConfig;
use crate::error::{DriftError, ParseError};
use crate::model::{duplicate_identity, Entity, EntityKind, EntitySet, IdentityKey};
use crate::normalize::{NormalizedForm, Normalizer};
use crate::parser::{PostgresGrammar, RoutineGrammar};

pub use operation::Operation;
pub use report::{DegradedComparison, DiffReport, FallbackReason};

/// Minimum number of entities to benefit from diffing kinds in parallel.
const PARALLEL_THRESHOLD: usize = 8;

type KindIndex = BTreeMap<IdentityKey, Entity>;

/// Operations and degraded comparisons for one entity kind
#[derive(Default)]
struct KindDiff {
    operations: Vec<(IdentityKey, Operation)>,
    degraded: Vec<DegradedComparison>,
}

pub struct DiffEngine<G = PostgresGrammar> {
    config: DiffConfig,
    normalizer: Normalizer<G>,
}

impl DiffEngine<PostgresGrammar> {
    pub fn new(config: DiffConfig) -> Self {
        Self::with_normalizer(config, Normalizer::new())
    }
}

impl<G: RoutineGrammar> DiffEngine<G> {
    pub fn with_normalizer(config: DiffConfig, normalizer: Normalizer<G>) -> Self {
        Self { config, normalizer }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the ordered operations that turn `remote` into `local`.
    ///
    /// Fails only on a duplicate identity key, which is detected before any
    /// comparison; normalizer failures degrade the affected pair instead.
    pub fn diff(&self, local: &EntitySet, remote: &EntitySet) -> Result<DiffReport, DriftError> {
        let local = self.index(local)?;
        let remote = self.index(remote)?;

        let empty = KindIndex::new();
        let total: usize = local.values().chain(remote.values()).map(BTreeMap::len).sum();
        let diff_kind = |kind: &EntityKind| {
            self.diff_kind(
                local.get(kind).unwrap_or(&empty),
                remote.get(kind).unwrap_or(&empty),
            )
        };
        let per_kind: Vec<KindDiff> = if total >= PARALLEL_THRESHOLD {
            EntityKind::ALL.par_iter().map(diff_kind).collect()
        } else {
            EntityKind::ALL.iter().map(diff_kind).collect()
        };

        let mut operations = Vec::new();
        let mut degraded = Vec::new();
        for kind_diff in per_kind {
            operations.extend(kind_diff.operations);
            degraded.extend(kind_diff.degraded);
        }
        degraded.sort_by(|a, b| a.key.cmp(&b.key));

        let operations = order_operations(operations);
        info!(
            operations = operations.len(),
            degraded = degraded.len(),
            "diff complete"
        );
        Ok(DiffReport {
            operations,
            degraded,
        })
    }

    /// Partition by kind and key; with `ignore_schema`, entities lose their
    /// schema here so keys and renderings are both unqualified.
    fn index(&self, set: &EntitySet) -> Result<BTreeMap<EntityKind, KindIndex>, DriftError> {
        let ignore_schema = self.config.ignore_schema;
        let mut index: BTreeMap<EntityKind, KindIndex> = BTreeMap::new();
        for entity in set {
            let entity = if ignore_schema {
                entity.without_schema()
            } else {
                entity.clone()
            };
            let key = entity.identity_with(ignore_schema);
            let by_key = index.entry(entity.kind()).or_default();
            if let Some(existing) = by_key.get(&key) {
                return Err(duplicate_identity(&key, existing, &entity));
            }
            by_key.insert(key, entity);
        }
        Ok(index)
    }

    fn diff_kind(&self, local: &KindIndex, remote: &KindIndex) -> KindDiff {
        let mut result = KindDiff::default();

        for (key, declared) in local {
            match remote.get(key) {
                Some(existing) => {
                    let (equal, fallback) = self.compare(key, declared, existing);
                    if let Some(reason) = fallback {
                        result.degraded.push(DegradedComparison {
                            key: key.clone(),
                            reason,
                        });
                    }
                    if !equal {
                        debug!(%key, "definition changed");
                        result.operations.push((
                            key.clone(),
                            Operation::Replace {
                                old: existing.clone(),
                                new: declared.clone(),
                            },
                        ));
                    }
                }
                None => {
                    debug!(%key, "declared entity missing from database");
                    result
                        .operations
                        .push((key.clone(), Operation::Create(declared.clone())));
                }
            }
        }

        for (key, existing) in remote {
            if !local.contains_key(key) {
                debug!(%key, "database entity no longer declared");
                result
                    .operations
                    .push((key.clone(), Operation::Drop(existing.clone())));
            }
        }

        result
    }

    /// Whether two entities with the same key are equal, and why the
    /// comparison was degraded if it was
    fn compare(
        &self,
        key: &IdentityKey,
        declared: &Entity,
        existing: &Entity,
    ) -> (bool, Option<FallbackReason>) {
        if !declared.supports_semantic_compare() {
            debug!(%key, "no semantic comparator, comparing verbatim text");
            return (
                declared.verbatim_form() == existing.verbatim_form(),
                Some(FallbackReason::UnsupportedVariant),
            );
        }

        match (self.normalize(declared), self.normalize(existing)) {
            (Ok(a), Ok(b)) => (a == b, None),
            (Err(err), _) | (_, Err(err)) => {
                warn!(%key, error = %err, "definition did not parse, comparing verbatim text");
                (
                    declared.verbatim_form() == existing.verbatim_form(),
                    Some(FallbackReason::ParseError(err)),
                )
            }
        }
    }

    fn normalize(&self, entity: &Entity) -> Result<NormalizedForm, ParseError> {
        match entity {
            Entity::Function(r) | Entity::Procedure(r) => {
                self.normalizer
                    .normalize(&r.definition, &r.signature, entity.is_procedure())
            }
            other => Err(ParseError::new(format!(
                "no normalizer for {}",
                other.kind()
            ))),
        }
    }
}

/// Creates and replaces by ascending tier, then drops by descending tier
fn order_operations(operations: Vec<(IdentityKey, Operation)>) -> Vec<Operation> {
    let (mut drops, mut forward): (Vec<_>, Vec<_>) =
        operations.into_iter().partition(|(_, op)| op.is_drop());

    forward.sort_by(|(a_key, a), (b_key, b)| {
        a.entity()
            .dependency_tier()
            .cmp(&b.entity().dependency_tier())
            .then_with(|| a_key.cmp(b_key))
    });
    drops.sort_by(|(a_key, a), (b_key, b)| {
        b.entity()
            .dependency_tier()
            .cmp(&a.entity().dependency_tier())
            .then_with(|| a_key.cmp(b_key))
    });

    forward.into_iter().chain(drops).map(|(_, op)| op).collect()
}

/// Diff with the built-in grammar, returning only the operations
pub fn diff(
    local: &EntitySet,
    remote: &EntitySet,
    config: DiffConfig,
) -> Result<Vec<Operation>, DriftError> {
    DiffEngine::new(config)
        .diff(local, remote)
        .map(DiffReport::into_operations)
}
