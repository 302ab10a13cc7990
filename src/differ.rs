//! Three-snapshot change detection.
//!
//! Given oldest, middle and newest snapshots of the same parcel table, the
//! differ classifies identifiers into three pairwise disjoint categories:
//!
//! - `DisappearedAfterOldest`: `oldest - middle - newest`
//! - `DisappearedAfterMiddle`: `middle - newest`
//! - `ReappearedNewest`: `(oldest - middle) & newest`
//!
//! Identifiers present in all three snapshots never appear in the output.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::columns::{ColumnKeywords, ResolvedColumns};
use crate::constants::differ::{DEFAULT_MIDDLE_LABEL, DEFAULT_NEWEST_LABEL, DEFAULT_OLDEST_LABEL};
use crate::data::Snapshot;
use crate::errors::TrackerError;
use crate::metrics::{ChangeSummary, change_summary};
use crate::types::{ChangeLabel, ParcelId, SnapshotLabel};

/// Chronological position of a snapshot in a comparison.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotRole {
    /// Earliest snapshot.
    Oldest,
    /// Intermediate snapshot.
    Middle,
    /// Latest snapshot.
    Newest,
}

impl SnapshotRole {
    /// All roles in chronological order.
    pub const ALL: [SnapshotRole; 3] = [
        SnapshotRole::Oldest,
        SnapshotRole::Middle,
        SnapshotRole::Newest,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotRole::Oldest => "oldest",
            SnapshotRole::Middle => "middle",
            SnapshotRole::Newest => "newest",
        }
    }
}

impl fmt::Display for SnapshotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three snapshots in fixed chronological order.
#[derive(Clone, Debug)]
pub struct SnapshotSeries {
    /// Earliest snapshot.
    pub oldest: Snapshot,
    /// Intermediate snapshot.
    pub middle: Snapshot,
    /// Latest snapshot.
    pub newest: Snapshot,
}

impl SnapshotSeries {
    /// Bundle three snapshots, oldest first.
    pub fn new(oldest: Snapshot, middle: Snapshot, newest: Snapshot) -> Self {
        Self {
            oldest,
            middle,
            newest,
        }
    }

    /// Snapshot at a chronological position.
    pub fn get(&self, role: SnapshotRole) -> &Snapshot {
        match role {
            SnapshotRole::Oldest => &self.oldest,
            SnapshotRole::Middle => &self.middle,
            SnapshotRole::Newest => &self.newest,
        }
    }

    /// Human labels of the three snapshots.
    pub fn labels(&self) -> SnapshotLabels {
        SnapshotLabels {
            oldest: self.oldest.label.clone(),
            middle: self.middle.label.clone(),
            newest: self.newest.label.clone(),
        }
    }

    /// Roles whose snapshot has no records, in chronological order.
    pub fn empty_roles(&self) -> Vec<SnapshotRole> {
        SnapshotRole::ALL
            .into_iter()
            .filter(|role| self.get(*role).is_empty())
            .collect()
    }
}

/// Labels used to render change categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLabels {
    /// Label of the oldest snapshot.
    pub oldest: SnapshotLabel,
    /// Label of the middle snapshot.
    pub middle: SnapshotLabel,
    /// Label of the newest snapshot.
    pub newest: SnapshotLabel,
}

impl Default for SnapshotLabels {
    fn default() -> Self {
        Self {
            oldest: DEFAULT_OLDEST_LABEL.to_string(),
            middle: DEFAULT_MIDDLE_LABEL.to_string(),
            newest: DEFAULT_NEWEST_LABEL.to_string(),
        }
    }
}

/// Closed set of change categories.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    /// In oldest, absent from both middle and newest.
    DisappearedAfterOldest,
    /// In middle, absent from newest.
    DisappearedAfterMiddle,
    /// In oldest, absent from middle, present again in newest.
    ReappearedNewest,
}

impl ChangeCategory {
    /// All categories in output order.
    pub const ALL: [ChangeCategory; 3] = [
        ChangeCategory::DisappearedAfterOldest,
        ChangeCategory::DisappearedAfterMiddle,
        ChangeCategory::ReappearedNewest,
    ];

    /// Stable snake-case key.
    pub fn key(self) -> &'static str {
        match self {
            ChangeCategory::DisappearedAfterOldest => "disappeared_after_oldest",
            ChangeCategory::DisappearedAfterMiddle => "disappeared_after_middle",
            ChangeCategory::ReappearedNewest => "reappeared_newest",
        }
    }

    /// Snapshot whose rows supply coordinates for this category.
    pub fn origin(self) -> SnapshotRole {
        match self {
            ChangeCategory::DisappearedAfterOldest => SnapshotRole::Oldest,
            ChangeCategory::DisappearedAfterMiddle => SnapshotRole::Middle,
            ChangeCategory::ReappearedNewest => SnapshotRole::Newest,
        }
    }

    /// Human label, e.g. `Disappeared after 2020`.
    pub fn label(self, labels: &SnapshotLabels) -> ChangeLabel {
        match self {
            ChangeCategory::DisappearedAfterOldest => {
                format!("Disappeared after {}", labels.oldest)
            }
            ChangeCategory::DisappearedAfterMiddle => {
                format!("Disappeared after {}", labels.middle)
            }
            ChangeCategory::ReappearedNewest => format!("Reappeared in {}", labels.newest),
        }
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Identifier sets per change category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSets {
    /// `oldest - middle - newest`.
    pub disappeared_after_oldest: BTreeSet<ParcelId>,
    /// `middle - newest`.
    pub disappeared_after_middle: BTreeSet<ParcelId>,
    /// `(oldest - middle) & newest`.
    pub reappeared_newest: BTreeSet<ParcelId>,
}

impl ChangeSets {
    /// Classify identifiers from three chronological identifier sets.
    pub fn compute(
        oldest: &BTreeSet<ParcelId>,
        middle: &BTreeSet<ParcelId>,
        newest: &BTreeSet<ParcelId>,
    ) -> Self {
        let gone_from_middle: BTreeSet<ParcelId> = oldest.difference(middle).cloned().collect();
        Self {
            disappeared_after_oldest: gone_from_middle.difference(newest).cloned().collect(),
            disappeared_after_middle: middle.difference(newest).cloned().collect(),
            reappeared_newest: gone_from_middle.intersection(newest).cloned().collect(),
        }
    }

    /// Identifier set for a category.
    pub fn get(&self, category: ChangeCategory) -> &BTreeSet<ParcelId> {
        match category {
            ChangeCategory::DisappearedAfterOldest => &self.disappeared_after_oldest,
            ChangeCategory::DisappearedAfterMiddle => &self.disappeared_after_middle,
            ChangeCategory::ReappearedNewest => &self.reappeared_newest,
        }
    }

    /// Category an identifier belongs to, if any.
    pub fn category_of(&self, id: &str) -> Option<ChangeCategory> {
        ChangeCategory::ALL
            .into_iter()
            .find(|category| self.get(*category).contains(id))
    }
}

/// One output row classifying a single identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Parcel identifier.
    pub identifier: ParcelId,
    /// Latitude from the origin snapshot, when parsable.
    pub latitude: Option<f64>,
    /// Longitude from the origin snapshot, when parsable.
    pub longitude: Option<f64>,
    /// Change category.
    pub category: ChangeCategory,
    /// Human label for `category`.
    pub label: ChangeLabel,
}

/// Complete result of a comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Columns resolved on the oldest snapshot.
    pub columns: ResolvedColumns,
    /// Snapshot labels used to render change labels.
    pub labels: SnapshotLabels,
    /// Identifier sets per category.
    pub sets: ChangeSets,
    /// Concatenated change rows (oldest, middle, newest origin order).
    pub records: Vec<ChangeRecord>,
    /// Per-category counts.
    pub summary: ChangeSummary,
}

impl ChangeReport {
    /// Rows of one category.
    pub fn records_for(&self, category: ChangeCategory) -> impl Iterator<Item = &ChangeRecord> {
        self.records
            .iter()
            .filter(move |record| record.category == category)
    }
}

/// Snapshot differ configured with column keywords.
#[derive(Clone, Debug, Default)]
pub struct SnapshotDiffer {
    keywords: ColumnKeywords,
}

impl SnapshotDiffer {
    /// Create a differ with explicit keywords.
    pub fn new(keywords: ColumnKeywords) -> Self {
        Self { keywords }
    }

    /// Compare three snapshots.
    ///
    /// Columns are detected once on the oldest snapshot's header and required
    /// verbatim in the other two. All validation runs before any row is
    /// extracted, so an error never leaves a partial report.
    pub fn diff(&self, series: &SnapshotSeries) -> Result<ChangeReport, TrackerError> {
        let empty = series.empty_roles();
        if !empty.is_empty() {
            return Err(TrackerError::EmptySnapshot { roles: empty });
        }
        self.keywords.validate()?;

        let columns = ResolvedColumns::detect(series.oldest.columns(), &self.keywords)?;
        for role in SnapshotRole::ALL {
            columns.ensure_present(series.get(role), role)?;
        }
        info!(
            "[parcel:diff] columns resolved id='{}' lat='{}' lon='{}'",
            columns.identifier, columns.latitude, columns.longitude
        );

        let oldest = identifier_set(&series.oldest, SnapshotRole::Oldest, &columns.identifier);
        let middle = identifier_set(&series.middle, SnapshotRole::Middle, &columns.identifier);
        let newest = identifier_set(&series.newest, SnapshotRole::Newest, &columns.identifier);
        let sets = ChangeSets::compute(&oldest, &middle, &newest);

        let labels = series.labels();
        let mut records = Vec::new();
        for category in ChangeCategory::ALL {
            let snapshot = series.get(category.origin());
            let label = category.label(&labels);
            extract_records(snapshot, &columns, sets.get(category), category, &label, &mut records);
        }

        let summary = change_summary(&sets);
        info!(
            "[parcel:diff] {}: {} | {}: {} | {}: {}",
            ChangeCategory::DisappearedAfterOldest.label(&labels),
            summary.disappeared_after_oldest,
            ChangeCategory::DisappearedAfterMiddle.label(&labels),
            summary.disappeared_after_middle,
            ChangeCategory::ReappearedNewest.label(&labels),
            summary.reappeared_newest,
        );

        Ok(ChangeReport {
            columns,
            labels,
            sets,
            records,
            summary,
        })
    }
}

/// Collect the identifier set of a snapshot, skipping blank identifiers.
fn identifier_set(snapshot: &Snapshot, role: SnapshotRole, column: &str) -> BTreeSet<ParcelId> {
    let mut ids = BTreeSet::new();
    let mut blank = 0usize;
    for record in snapshot.records() {
        match record.get(column).and_then(|cell| cell.as_key()) {
            Some(id) => {
                ids.insert(id);
            }
            None => blank += 1,
        }
    }
    if blank > 0 {
        warn!(
            "[parcel:diff] {role} snapshot '{}' has {blank} row(s) with a blank identifier; skipped",
            snapshot.label
        );
    }
    debug!(
        "[parcel:diff] {role} snapshot '{}' rows={} unique_ids={}",
        snapshot.label,
        snapshot.len(),
        ids.len()
    );
    ids
}

/// Append one row per selected identifier, taking the first matching row of
/// `snapshot` in row order.
fn extract_records(
    snapshot: &Snapshot,
    columns: &ResolvedColumns,
    selected: &BTreeSet<ParcelId>,
    category: ChangeCategory,
    label: &str,
    out: &mut Vec<ChangeRecord>,
) {
    if selected.is_empty() {
        return;
    }
    let mut emitted: HashSet<ParcelId> = HashSet::with_capacity(selected.len());
    for record in snapshot.records() {
        let Some(id) = record.get(&columns.identifier).and_then(|cell| cell.as_key()) else {
            continue;
        };
        if !selected.contains(&id) || emitted.contains(&id) {
            continue;
        }
        out.push(ChangeRecord {
            latitude: record.get(&columns.latitude).and_then(|cell| cell.as_f64()),
            longitude: record.get(&columns.longitude).and_then(|cell| cell.as_f64()),
            category,
            label: label.to_string(),
            identifier: id.clone(),
        });
        emitted.insert(id);
        if emitted.len() == selected.len() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> BTreeSet<ParcelId> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn snapshot(label: &str, rows: &[(&str, &str, &str)]) -> Snapshot {
        let mut snapshot = Snapshot::new(
            format!("test::{label}"),
            label,
            vec!["TMK".into(), "Latitude".into(), "Longitude".into()],
        );
        for (id, lat, lon) in rows {
            snapshot = snapshot.with_row([*id, *lat, *lon]);
        }
        snapshot
    }

    #[test]
    fn gone_after_oldest_scenario() {
        let sets = ChangeSets::compute(&ids(&["A", "B", "C"]), &ids(&["A", "C"]), &ids(&["A", "C", "D"]));
        assert_eq!(sets.disappeared_after_oldest, ids(&["B"]));
        assert!(sets.disappeared_after_middle.is_empty());
        assert!(sets.reappeared_newest.is_empty());
    }

    #[test]
    fn reappeared_scenario() {
        let sets = ChangeSets::compute(&ids(&["A", "B"]), &ids(&["A"]), &ids(&["A", "B"]));
        assert!(sets.disappeared_after_oldest.is_empty());
        assert!(sets.disappeared_after_middle.is_empty());
        assert_eq!(sets.reappeared_newest, ids(&["B"]));
        assert_eq!(sets.category_of("B"), Some(ChangeCategory::ReappearedNewest));
        assert_eq!(sets.category_of("A"), None);
    }

    #[test]
    fn labels_follow_snapshot_labels() {
        let labels = SnapshotLabels {
            oldest: "2020".into(),
            middle: "2023".into(),
            newest: "2024".into(),
        };
        assert_eq!(
            ChangeCategory::DisappearedAfterOldest.label(&labels),
            "Disappeared after 2020"
        );
        assert_eq!(
            ChangeCategory::DisappearedAfterMiddle.label(&labels),
            "Disappeared after 2023"
        );
        assert_eq!(
            ChangeCategory::ReappearedNewest.label(&labels),
            "Reappeared in 2024"
        );
    }

    #[test]
    fn coordinates_come_from_origin_snapshot() {
        let series = SnapshotSeries::new(
            snapshot("2020", &[("A", "1.0", "-1.0"), ("B", "2.0", "-2.0")]),
            snapshot("2023", &[("A", "1.1", "-1.1"), ("C", "3.0", "-3.0")]),
            snapshot("2024", &[("A", "1.2", "-1.2"), ("B", "2.4", "-2.4")]),
        );
        let report = SnapshotDiffer::default().diff(&series).unwrap();

        let reappeared: Vec<_> = report
            .records_for(ChangeCategory::ReappearedNewest)
            .collect();
        assert_eq!(reappeared.len(), 1);
        assert_eq!(reappeared[0].identifier, "B");
        assert_eq!(reappeared[0].latitude, Some(2.4));
        assert_eq!(reappeared[0].longitude, Some(-2.4));
        assert_eq!(reappeared[0].label, "Reappeared in 2024");

        let gone_middle: Vec<_> = report
            .records_for(ChangeCategory::DisappearedAfterMiddle)
            .collect();
        assert_eq!(gone_middle.len(), 1);
        assert_eq!(gone_middle[0].identifier, "C");
        assert_eq!(gone_middle[0].latitude, Some(3.0));
    }

    #[test]
    fn duplicate_identifiers_emit_first_row_only() {
        let series = SnapshotSeries::new(
            snapshot("2020", &[("A", "1", "1"), ("B", "5", "5"), ("B", "6", "6")]),
            snapshot("2023", &[("A", "1", "1")]),
            snapshot("2024", &[("A", "1", "1")]),
        );
        let report = SnapshotDiffer::default().diff(&series).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].identifier, "B");
        assert_eq!(report.records[0].latitude, Some(5.0));
    }

    #[test]
    fn float_formatted_identifiers_match_integer_form() {
        let series = SnapshotSeries::new(
            snapshot("2020", &[("130010010000", "1", "1"), ("130010020000", "2", "2")]),
            snapshot("2023", &[("130010010000.0", "1", "1")]),
            snapshot("2024", &[("130010010000", "1", "1")]),
        );
        let report = SnapshotDiffer::default().diff(&series).unwrap();
        assert!(report.sets.disappeared_after_middle.is_empty());
        assert!(report.sets.reappeared_newest.is_empty());
        assert_eq!(report.sets.disappeared_after_oldest, ids(&["130010020000"]));
        assert_eq!(report.sets.category_of("130010010000"), None);
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn blank_identifiers_are_ignored_and_bad_coordinates_are_none() {
        let series = SnapshotSeries::new(
            snapshot("2020", &[("A", "1", "1"), ("", "9", "9"), ("B", "x", "")]),
            snapshot("2023", &[("A", "1", "1")]),
            snapshot("2024", &[("A", "1", "1")]),
        );
        let report = SnapshotDiffer::default().diff(&series).unwrap();
        assert_eq!(report.sets.disappeared_after_oldest, ids(&["B"]));
        assert_eq!(report.records[0].latitude, None);
        assert_eq!(report.records[0].longitude, None);
    }

    #[test]
    fn empty_snapshots_are_all_reported() {
        let series = SnapshotSeries::new(
            snapshot("2020", &[("A", "1", "1")]),
            snapshot("2023", &[]),
            snapshot("2024", &[]),
        );
        let err = SnapshotDiffer::default().diff(&series).unwrap_err();
        match err {
            TrackerError::EmptySnapshot { roles } => {
                assert_eq!(roles, vec![SnapshotRole::Middle, SnapshotRole::Newest]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn later_snapshot_missing_resolved_column_is_fatal() {
        let newest = Snapshot::new("test::2024", "2024", vec!["TMK".into(), "Latitude".into()])
            .with_row(["A", "1"]);
        let series = SnapshotSeries::new(
            snapshot("2020", &[("A", "1", "1")]),
            snapshot("2023", &[("A", "1", "1")]),
            newest,
        );
        let err = SnapshotDiffer::default().diff(&series).unwrap_err();
        match err {
            TrackerError::MissingColumn { role, column } => {
                assert_eq!(role, SnapshotRole::Newest);
                assert_eq!(column, "Longitude");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
