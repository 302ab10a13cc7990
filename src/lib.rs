#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Keyword-based column detection.
pub mod columns;
/// Tracker configuration and snapshot discovery.
pub mod config;
/// Centralized constants used across detection, diffing, and loading.
pub mod constants;
/// Snapshot, record, and cell types.
pub mod data;
/// Three-snapshot change detection.
pub mod differ;
/// Reusable runners shared by the demo binaries.
pub mod example_apps;
/// CSV export of change tables.
pub mod export;
/// Per-category change counts.
pub mod metrics;
/// Snapshot loader interfaces and built-in loaders.
pub mod source;
/// Input transports used by loaders (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;

mod errors;

pub use columns::{ColumnKeywords, ColumnRole, ResolvedColumns, detect_column};
pub use config::{SnapshotLocation, SnapshotSpec, TrackerConfig};
pub use data::{CellValue, ColumnKey, RecordView, Snapshot};
pub use differ::{
    ChangeCategory, ChangeRecord, ChangeReport, ChangeSets, SnapshotDiffer, SnapshotLabels,
    SnapshotRole, SnapshotSeries,
};
pub use errors::TrackerError;
pub use export::{write_change_csv, write_change_csv_path};
pub use metrics::{CategoryShare, ChangeSummary, change_summary};
pub use source::{CsvFileSource, InMemorySource, SnapshotSource, load_series};
pub use types::{ChangeLabel, ColumnName, Keyword, ParcelId, SnapshotLabel, SourceId};
