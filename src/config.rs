//! Tracker configuration: which snapshots to compare and how to find columns.
//!
//! A config enumerates the three snapshots with their retrieval method and can
//! be written by hand as JSON:
//!
//! ```json
//! {
//!   "oldest": { "label": "2020", "location": { "kind": "path", "path": "tmk_2020.csv" } },
//!   "middle": { "label": "2023", "location": { "kind": "path", "path": "tmk_2023.csv" } },
//!   "newest": { "label": "2024", "location": { "kind": "inline", "csv": "TMK,lat,lon\n..." } },
//!   "keywords": { "identifier": ["tmk"] }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::columns::ColumnKeywords;
use crate::constants::source::SNAPSHOT_COUNT;
use crate::differ::{ChangeReport, SnapshotDiffer, SnapshotRole, SnapshotSeries};
use crate::errors::TrackerError;
use crate::source::{CsvFileSource, InMemorySource, SnapshotSource, load_series};
use crate::transport::fs::{CsvDirectory, year_from_stem};
use crate::types::SnapshotLabel;

/// Where a snapshot is retrieved from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotLocation {
    /// Local CSV file.
    Path {
        /// File path; relative paths in a JSON config resolve against the
        /// config file's directory.
        path: PathBuf,
    },
    /// CSV text embedded in the configuration.
    Inline {
        /// Full CSV payload including the header row.
        csv: String,
    },
}

/// One labeled snapshot entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSpec {
    /// Human label, usually the snapshot year.
    pub label: SnapshotLabel,
    /// Retrieval method.
    pub location: SnapshotLocation,
}

impl SnapshotSpec {
    /// Spec for a local CSV file.
    pub fn path(label: impl Into<SnapshotLabel>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            location: SnapshotLocation::Path { path: path.into() },
        }
    }

    /// Spec for embedded CSV text.
    pub fn inline(label: impl Into<SnapshotLabel>, csv: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            location: SnapshotLocation::Inline { csv: csv.into() },
        }
    }

    /// Build the loader for this entry.
    pub fn source(&self) -> Result<Box<dyn SnapshotSource>, TrackerError> {
        let source: Box<dyn SnapshotSource> = match &self.location {
            SnapshotLocation::Path { path } => {
                Box::new(CsvFileSource::new(self.label.clone(), path.clone()))
            }
            SnapshotLocation::Inline { csv } => {
                Box::new(InMemorySource::from_csv_str(self.label.clone(), csv)?)
            }
        };
        Ok(source)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        if let SnapshotLocation::Path { path } = &mut self.location
            && path.is_relative()
        {
            *path = base.join(&*path);
        }
    }
}

/// Top-level tracker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Earliest snapshot.
    pub oldest: SnapshotSpec,
    /// Intermediate snapshot.
    pub middle: SnapshotSpec,
    /// Latest snapshot.
    pub newest: SnapshotSpec,
    /// Column detection keywords; omitted fields keep their defaults.
    #[serde(default)]
    pub keywords: ColumnKeywords,
}

impl TrackerConfig {
    /// Create a config from three chronological snapshot entries.
    pub fn new(oldest: SnapshotSpec, middle: SnapshotSpec, newest: SnapshotSpec) -> Self {
        Self {
            oldest,
            middle,
            newest,
            keywords: ColumnKeywords::default(),
        }
    }

    /// Override column keywords.
    pub fn with_keywords(mut self, keywords: ColumnKeywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// Parse a JSON config.
    pub fn from_json_str(raw: &str) -> Result<Self, TrackerError> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.keywords = config.keywords.normalized();
        config.keywords.validate()?;
        Ok(config)
    }

    /// Read a JSON config file; relative snapshot paths resolve against the
    /// file's directory.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| {
            TrackerError::Configuration(format!(
                "failed reading config {}: {err}",
                path.display()
            ))
        })?;
        let mut config = Self::from_json_str(&raw)?;
        if let Some(base) = path.parent() {
            config.oldest.resolve_relative_to(base);
            config.middle.resolve_relative_to(base);
            config.newest.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Discover year-tagged CSV files directly under `root`.
    ///
    /// Files are ordered by the four-digit year in their stem. With exactly
    /// three years they map to oldest/middle/newest; with more, the earliest,
    /// second-latest and latest are used. Two files with the same year are a
    /// configuration error.
    pub fn from_directory(root: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let root = root.as_ref();
        let mut dated: Vec<(u16, PathBuf)> = CsvDirectory::new(root)
            .with_max_depth(1)
            .discover()?
            .into_iter()
            .filter_map(|path| year_from_stem(&path).map(|year| (year, path)))
            .collect();
        dated.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        if let Some(pair) = dated.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(TrackerError::Configuration(format!(
                "multiple snapshots for year {} under {}",
                pair[0].0,
                root.display()
            )));
        }
        if dated.len() < SNAPSHOT_COUNT {
            return Err(TrackerError::Configuration(format!(
                "expected at least {SNAPSHOT_COUNT} year-tagged csv files under {}, found {}",
                root.display(),
                dated.len()
            )));
        }
        let last = dated.len() - 1;
        let pick = |idx: usize| {
            let (year, path) = &dated[idx];
            SnapshotSpec::path(year.to_string(), path.clone())
        };
        let config = Self::new(pick(0), pick(last - 1), pick(last));
        info!(
            "[parcel:config] discovered snapshots {} -> {} -> {} under {}",
            config.oldest.label,
            config.middle.label,
            config.newest.label,
            root.display()
        );
        Ok(config)
    }

    /// Entry for a chronological position.
    pub fn spec(&self, role: SnapshotRole) -> &SnapshotSpec {
        match role {
            SnapshotRole::Oldest => &self.oldest,
            SnapshotRole::Middle => &self.middle,
            SnapshotRole::Newest => &self.newest,
        }
    }

    /// Load all three snapshots.
    pub fn load_series(&self) -> Result<SnapshotSeries, TrackerError> {
        let oldest = self.oldest.source()?;
        let middle = self.middle.source()?;
        let newest = self.newest.source()?;
        load_series(oldest.as_ref(), middle.as_ref(), newest.as_ref())
    }

    /// Differ configured with this config's keywords.
    pub fn differ(&self) -> SnapshotDiffer {
        SnapshotDiffer::new(self.keywords.clone())
    }

    /// Load the snapshots and compare them.
    pub fn run(&self) -> Result<ChangeReport, TrackerError> {
        let series = self.load_series()?;
        self.differ().diff(&series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_config_uses_default_keywords_when_omitted() {
        let raw = r#"{
            "oldest": { "label": "2020", "location": { "kind": "path", "path": "/data/a.csv" } },
            "middle": { "label": "2023", "location": { "kind": "path", "path": "/data/b.csv" } },
            "newest": { "label": "2024", "location": { "kind": "inline", "csv": "TMK\n1\n" } }
        }"#;
        let config = TrackerConfig::from_json_str(raw).unwrap();
        assert_eq!(config.keywords, ColumnKeywords::default());
        assert_eq!(config.spec(SnapshotRole::Middle).label, "2023");
        assert_eq!(
            config.newest.location,
            SnapshotLocation::Inline {
                csv: "TMK\n1\n".to_string()
            }
        );
    }

    #[test]
    fn json_config_partial_keywords_keep_other_defaults() {
        let raw = r#"{
            "oldest": { "label": "a", "location": { "kind": "inline", "csv": "" } },
            "middle": { "label": "b", "location": { "kind": "inline", "csv": "" } },
            "newest": { "label": "c", "location": { "kind": "inline", "csv": "" } },
            "keywords": { "identifier": ["parcel"] }
        }"#;
        let config = TrackerConfig::from_json_str(raw).unwrap();
        assert_eq!(config.keywords.identifier, vec!["parcel"]);
        assert_eq!(config.keywords.latitude, ColumnKeywords::default().latitude);
    }

    #[test]
    fn json_keywords_are_trimmed_and_lowercased() {
        let raw = r#"{
            "oldest": { "label": "2020", "location": { "kind": "inline", "csv": "TMK,lat,lon\nA,1,1\nB,2,2\n" } },
            "middle": { "label": "2023", "location": { "kind": "inline", "csv": "TMK,lat,lon\nA,1,1\n" } },
            "newest": { "label": "2024", "location": { "kind": "inline", "csv": "TMK,lat,lon\nA,1,1\n" } },
            "keywords": { "identifier": [" TMK "], "latitude": ["LAT"] }
        }"#;
        let config = TrackerConfig::from_json_str(raw).unwrap();
        assert_eq!(config.keywords.identifier, vec!["tmk"]);
        assert_eq!(config.keywords.latitude, vec!["lat"]);
        assert_eq!(
            config.keywords,
            ColumnKeywords::default()
                .with_identifier([" TMK "])
                .with_latitude(["LAT"])
        );
        let report = config.run().unwrap();
        assert_eq!(report.columns.identifier, "TMK");
        assert_eq!(report.summary.disappeared_after_oldest, 1);
    }

    #[test]
    fn json_config_rejects_empty_keyword_list() {
        let raw = r#"{
            "oldest": { "label": "a", "location": { "kind": "inline", "csv": "" } },
            "middle": { "label": "b", "location": { "kind": "inline", "csv": "" } },
            "newest": { "label": "c", "location": { "kind": "inline", "csv": "" } },
            "keywords": { "longitude": [] }
        }"#;
        assert!(matches!(
            TrackerConfig::from_json_str(raw),
            Err(TrackerError::Configuration(_))
        ));
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let temp = tempdir().unwrap();
        let config_path = temp.path().join("tracker.json");
        let raw = r#"{
            "oldest": { "label": "2020", "location": { "kind": "path", "path": "tmk_2020.csv" } },
            "middle": { "label": "2023", "location": { "kind": "path", "path": "/abs/tmk_2023.csv" } },
            "newest": { "label": "2024", "location": { "kind": "path", "path": "tmk_2024.csv" } }
        }"#;
        fs::write(&config_path, raw).unwrap();
        let config = TrackerConfig::from_json_path(&config_path).unwrap();
        assert_eq!(
            config.oldest.location,
            SnapshotLocation::Path {
                path: temp.path().join("tmk_2020.csv")
            }
        );
        assert_eq!(
            config.middle.location,
            SnapshotLocation::Path {
                path: PathBuf::from("/abs/tmk_2023.csv")
            }
        );
    }

    #[test]
    fn directory_discovery_picks_earliest_and_two_latest_years() {
        let temp = tempdir().unwrap();
        for year in ["2020", "2021", "2023", "2024"] {
            fs::write(temp.path().join(format!("tmk_{year}.csv")), "TMK\n1\n").unwrap();
        }
        fs::write(temp.path().join("readme.csv"), "TMK\n1\n").unwrap();
        let config = TrackerConfig::from_directory(temp.path()).unwrap();
        assert_eq!(config.oldest.label, "2020");
        assert_eq!(config.middle.label, "2023");
        assert_eq!(config.newest.label, "2024");
    }

    #[test]
    fn directory_discovery_requires_three_distinct_years() {
        let temp = tempdir().unwrap();
        for name in ["tmk_2020.csv", "tmk_2023.csv"] {
            fs::write(temp.path().join(name), "TMK\n1\n").unwrap();
        }
        assert!(matches!(
            TrackerConfig::from_directory(temp.path()),
            Err(TrackerError::Configuration(_))
        ));

        fs::write(temp.path().join("parcels_2023.csv"), "TMK\n1\n").unwrap();
        let err = TrackerConfig::from_directory(temp.path()).unwrap_err();
        assert!(err.to_string().contains("multiple snapshots for year 2023"));
    }

    #[test]
    fn inline_config_runs_end_to_end() {
        let config = TrackerConfig::new(
            SnapshotSpec::inline("2020", "TMK,lat,lon\nA,1,1\nB,2,2\n"),
            SnapshotSpec::inline("2023", "TMK,lat,lon\nA,1,1\n"),
            SnapshotSpec::inline("2024", "TMK,lat,lon\nA,1,1\nB,2.5,2.5\n"),
        );
        let report = config.run().unwrap();
        assert_eq!(report.summary.reappeared_newest, 1);
        assert_eq!(report.records[0].label, "Reappeared in 2024");
        assert_eq!(report.records[0].latitude, Some(2.5));
    }
}
