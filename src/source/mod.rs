//! Snapshot loader interfaces.
//!
//! Ownership model:
//! - `SnapshotSource` is the differ-facing loader interface; it knows where a
//!   snapshot comes from and materializes it fully in memory.
//! - The differ never performs I/O; callers load a `SnapshotSeries` first via
//!   `load_series` and hand it to `SnapshotDiffer::diff`.

use std::io::Read;
use std::sync::Arc;

use tracing::debug;

use crate::constants::source::INLINE_SOURCE_PREFIX;
use crate::data::{CellValue, ColumnKey, Snapshot};
use crate::differ::{SnapshotRole, SnapshotSeries};
use crate::errors::TrackerError;
use crate::types::{SnapshotLabel, SourceId};

/// Source implementation modules.
pub mod sources;
pub use sources::csv_file::CsvFileSource;

/// Loader interface producing one fully materialized snapshot.
///
/// For a fixed backing dataset, `load` should return the same snapshot on
/// every call.
pub trait SnapshotSource: Send + Sync {
    /// Stable source identifier used in logs and errors.
    fn id(&self) -> &str;
    /// Human label of the snapshot (usually its year).
    fn label(&self) -> &str;
    /// Load the snapshot into memory.
    fn load(&self) -> Result<Snapshot, TrackerError>;
}

/// Load three sources in chronological order.
pub fn load_series(
    oldest: &dyn SnapshotSource,
    middle: &dyn SnapshotSource,
    newest: &dyn SnapshotSource,
) -> Result<SnapshotSeries, TrackerError> {
    let load = |role: SnapshotRole, source: &dyn SnapshotSource| {
        let snapshot = source.load()?;
        debug!(
            "[parcel:source] {role} <- '{}' label='{}' rows={}",
            source.id(),
            snapshot.label,
            snapshot.len()
        );
        Ok::<_, TrackerError>(snapshot)
    };
    Ok(SnapshotSeries::new(
        load(SnapshotRole::Oldest, oldest)?,
        load(SnapshotRole::Middle, middle)?,
        load(SnapshotRole::Newest, newest)?,
    ))
}

/// Parse CSV text into a snapshot.
///
/// Rows may be ragged; blank header cells become positional columns and are
/// never matched by keyword detection.
pub fn parse_csv<R: Read>(
    reader: R,
    source: impl Into<SourceId>,
    label: impl Into<SnapshotLabel>,
) -> Result<Snapshot, TrackerError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns: Vec<ColumnKey> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                ColumnKey::Positional(idx)
            } else {
                ColumnKey::Named(name.to_string())
            }
        })
        .collect();
    let mut snapshot = Snapshot::new(source, label, columns);
    for row in csv_reader.records() {
        let row = row?;
        snapshot.push_row(row.iter().map(CellValue::from_raw).collect());
    }
    Ok(snapshot)
}

/// Source backed by a snapshot already held in memory (embedded literal).
#[derive(Clone)]
pub struct InMemorySource {
    id: SourceId,
    snapshot: Arc<Snapshot>,
}

impl InMemorySource {
    /// Wrap a prebuilt snapshot.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            id: snapshot.source.clone(),
            snapshot: Arc::new(snapshot),
        }
    }

    /// Parse embedded CSV text once and serve it from memory.
    pub fn from_csv_str(label: impl Into<SnapshotLabel>, csv: &str) -> Result<Self, TrackerError> {
        let label = label.into();
        let id = format!("{INLINE_SOURCE_PREFIX}::{label}");
        let snapshot = parse_csv(csv.as_bytes(), id, label)?;
        Ok(Self::new(snapshot))
    }
}

impl SnapshotSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.snapshot.label
    }

    fn load(&self) -> Result<Snapshot, TrackerError> {
        Ok((*self.snapshot).clone())
    }
}
