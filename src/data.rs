use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use crate::types::{ColumnName, ParcelId, SnapshotLabel, SourceId};

static EMPTY_CELL: CellValue = CellValue::Empty;

/// Header key of a snapshot column.
///
/// Loaders that produce non-string headers (for example integer column
/// indices from a headerless sheet) use `Positional`; keyword detection skips
/// those columns instead of failing on them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKey {
    /// A textual column header.
    Named(ColumnName),
    /// A non-string header, identified only by position.
    Positional(usize),
}

impl ColumnKey {
    /// Header text, if this column has a textual name.
    pub fn name(&self) -> Option<&str> {
        match self {
            ColumnKey::Named(name) => Some(name.as_str()),
            ColumnKey::Positional(_) => None,
        }
    }
}

impl From<&str> for ColumnKey {
    fn from(value: &str) -> Self {
        ColumnKey::Named(value.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(value: String) -> Self {
        ColumnKey::Named(value)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Named(name) => f.write_str(name),
            ColumnKey::Positional(idx) => write!(f, "#{idx}"),
        }
    }
}

/// A single cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Raw text, kept verbatim so identifiers retain leading zeros.
    Text(String),
    /// A numeric value produced by a typed loader.
    Number(f64),
    /// Blank or missing cell.
    Empty,
}

impl CellValue {
    /// Build a cell from raw CSV text (trimmed; blank becomes `Empty`).
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    /// Textual key used for identifier set membership.
    ///
    /// Numbers render through `f64` display, so `Number(3.0)` and `Text("3")`
    /// produce the same key. Integral decimal text drops its zero fraction
    /// (`"130010010000.0"` keys as `"130010010000"`), matching a float-typed
    /// export of an integer column. Other text is kept verbatim, including
    /// leading zeros.
    pub fn as_key(&self) -> Option<ParcelId> {
        match self {
            CellValue::Text(text) => Some(integral_text(text).unwrap_or(text).to_string()),
            CellValue::Number(value) if value.is_finite() => Some(value.to_string()),
            CellValue::Number(_) | CellValue::Empty => None,
        }
    }

    /// Numeric interpretation of the cell, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(value) if value.is_finite() => Some(*value),
            CellValue::Text(text) => text.parse::<f64>().ok().filter(|value| value.is_finite()),
            CellValue::Number(_) | CellValue::Empty => None,
        }
    }
}

/// Integer part of `digits.000` text, or `None` for anything else.
fn integral_text(text: &str) -> Option<&str> {
    let (whole, fraction) = text.split_once('.')?;
    let digits = whole.strip_prefix('-').unwrap_or(whole);
    if digits.is_empty()
        || !digits.bytes().all(|byte| byte.is_ascii_digit())
        || !fraction.bytes().all(|byte| byte == b'0')
    {
        return None;
    }
    Some(whole)
}

/// One full tabular extract of parcel records at a fixed point in time.
///
/// Rows are stored positionally and aligned to `columns`; a short row reads as
/// `Empty` for its trailing columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Source that produced this snapshot.
    pub source: SourceId,
    /// Human label for this snapshot (usually its year).
    pub label: SnapshotLabel,
    /// When the underlying data was last modified, if the loader knows.
    pub observed_at: Option<DateTime<Utc>>,
    columns: Vec<ColumnKey>,
    #[serde(skip)]
    index: IndexMap<ColumnName, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl Snapshot {
    /// Create an empty snapshot with the given header.
    pub fn new(
        source: impl Into<SourceId>,
        label: impl Into<SnapshotLabel>,
        columns: Vec<ColumnKey>,
    ) -> Self {
        let mut index = IndexMap::new();
        for (pos, column) in columns.iter().enumerate() {
            if let Some(name) = column.name() {
                // Duplicate header names resolve to their first position.
                index.entry(name.to_string()).or_insert(pos);
            }
        }
        Self {
            source: source.into(),
            label: label.into(),
            observed_at: None,
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Set the observation timestamp.
    pub fn with_observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    /// Append a row of cells.
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    /// Builder form of `push_row` taking raw text cells.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows.push(
            cells
                .into_iter()
                .map(|cell| CellValue::from_raw(cell.as_ref()))
                .collect(),
        );
        self
    }

    /// Ordered header of this snapshot.
    pub fn columns(&self) -> &[ColumnKey] {
        &self.columns
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied().or_else(|| {
            // The index is skipped during serde round-trips; fall back to a scan.
            self.columns
                .iter()
                .position(|column| column.name() == Some(name))
        })
    }

    /// True when the snapshot has a column with this exact name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the snapshot has no records.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate records in row order.
    pub fn records(&self) -> impl Iterator<Item = RecordView<'_>> {
        self.rows.iter().map(move |cells| RecordView {
            snapshot: self,
            cells,
        })
    }
}

/// Borrowed view over one snapshot record.
#[derive(Clone, Copy, Debug)]
pub struct RecordView<'a> {
    snapshot: &'a Snapshot,
    cells: &'a [CellValue],
}

impl<'a> RecordView<'a> {
    /// Cell at a column position; missing trailing cells read as `Empty`.
    pub fn cell_at(&self, idx: usize) -> &'a CellValue {
        self.cells.get(idx).unwrap_or(&EMPTY_CELL)
    }

    /// Cell under a named column, if that column exists.
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.snapshot
            .column_index(column)
            .map(|idx| self.cell_at(idx))
    }
}
