use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::constants::source::CSV_EXTENSION;
use crate::errors::TrackerError;

/// Filesystem scanner that lists CSV snapshot files under a root.
pub struct CsvDirectory {
    root: PathBuf,
    max_depth: Option<usize>,
}

impl CsvDirectory {
    /// Create a scanner rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
        }
    }

    /// Limit recursion depth (`1` lists only the root's direct children).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// List CSV files in lexicographic path order.
    pub fn discover(&self) -> Result<Vec<PathBuf>, TrackerError> {
        if !self.root.is_dir() {
            return Err(TrackerError::Configuration(format!(
                "snapshot directory {} does not exist",
                self.root.display()
            )));
        }
        let mut walker = WalkDir::new(&self.root);
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }
        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_csv_file(path))
            .collect();
        files.sort();
        debug!(
            "[parcel:fs] discovered {} csv file(s) under {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }
}

/// True if the path has a `.csv` extension (case-insensitive).
pub fn is_csv_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
        .unwrap_or(false)
}

/// Best-effort file modified time.
pub fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// First standalone four-digit run in the file stem, read as a year.
///
/// `tmk_2020.csv` and `Hawaii TMKs 2023 v2.csv` yield 2020 and 2023; digit
/// runs of any other length are ignored.
pub fn year_from_stem(path: &Path) -> Option<u16> {
    let stem = path.file_stem()?.to_str()?;
    stem.split(|ch: char| !ch.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse::<u16>().ok())
}
