use std::io;

use thiserror::Error;

use crate::columns::ColumnRole;
use crate::differ::SnapshotRole;
use crate::types::{ColumnName, Keyword, SourceId};

/// Error type for snapshot loading, column resolution, and comparison failures.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("empty snapshot(s): {}", join_roles(.roles))]
    EmptySnapshot { roles: Vec<SnapshotRole> },
    #[error("could not resolve {role} column (keywords: {})", .keywords.join(", "))]
    ColumnNotFound {
        role: ColumnRole,
        keywords: Vec<Keyword>,
    },
    #[error("{role} snapshot is missing column '{column}'")]
    MissingColumn {
        role: SnapshotRole,
        column: ColumnName,
    },
    #[error("snapshot source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable { source_id: SourceId, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn join_roles(roles: &[SnapshotRole]) -> String {
    roles
        .iter()
        .map(|role| role.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
