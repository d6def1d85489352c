//! Diff results and fidelity reporting

use std::fmt;

use super::operation::Operation;
use crate::error::ParseError;
use crate::model::IdentityKey;

/// Why a pair was compared by verbatim text instead of normalized form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The kind has no semantic comparator
    UnsupportedVariant,
    /// The normalizer rejected one side's definition
    ParseError(ParseError),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::UnsupportedVariant => f.write_str("no semantic comparator"),
            FallbackReason::ParseError(e) => write!(f, "parse error: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedComparison {
    pub key: IdentityKey,
    pub reason: FallbackReason,
}

/// Ordered operations plus every comparison made at reduced fidelity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffReport {
    pub operations: Vec<Operation>,
    pub degraded: Vec<DegradedComparison>,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    /// Comparisons that fell back because a definition did not parse
    pub fn parse_failures(&self) -> impl Iterator<Item = &DegradedComparison> {
        self.degraded
            .iter()
            .filter(|d| matches!(d.reason, FallbackReason::ParseError(_)))
    }
}
