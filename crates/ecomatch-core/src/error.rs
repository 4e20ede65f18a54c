//! Failure kinds and internal errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a query (or part of a catalog) did not produce a full answer.
///
/// Carried inside [`RecommendationResult`](crate::recommend::RecommendationResult)
/// and [`DataIssue`](crate::catalog::DataIssue); never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No candidate satisfied the request.
    NotFound,
    /// No product or category could be detected in the input.
    AmbiguousInput,
    /// The catalog could not be fetched and no snapshot is cached.
    SourceUnavailable,
    /// Expected fields were missing; defaults were substituted.
    PartialData,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::AmbiguousInput => "ambiguous_input",
            FailureKind::SourceUnavailable => "source_unavailable",
            FailureKind::PartialData => "partial_data",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while refreshing the catalog snapshot.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("catalog source '{source_name}' failed: {cause:#}")]
    Source {
        source_name: String,
        cause: anyhow::Error,
    },

    #[error("catalog source '{0}' returned no rows")]
    EmptyCatalog(String),

    #[error("refresh {generation} was superseded by refresh {published}")]
    Superseded { generation: u64, published: u64 },
}
