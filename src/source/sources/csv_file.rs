use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use tracing::info;

use crate::data::Snapshot;
use crate::errors::TrackerError;
use crate::source::{SnapshotSource, parse_csv};
use crate::transport::fs::file_mtime;
use crate::types::{SnapshotLabel, SourceId};

/// Snapshot source reading a local CSV file.
#[derive(Clone, Debug)]
pub struct CsvFileSource {
    id: SourceId,
    label: SnapshotLabel,
    path: PathBuf,
}

impl CsvFileSource {
    /// Create a source for `path`; the id defaults to the file path.
    pub fn new(label: impl Into<SnapshotLabel>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            label: label.into(),
            path,
        }
    }

    /// Override the source id.
    pub fn with_id(mut self, id: impl Into<SourceId>) -> Self {
        self.id = id.into();
        self
    }
}

impl SnapshotSource for CsvFileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Result<Snapshot, TrackerError> {
        let file = File::open(&self.path).map_err(|err| TrackerError::SourceUnavailable {
            source_id: self.id.clone(),
            reason: format!("failed opening {}: {err}", self.path.display()),
        })?;
        let mut snapshot = parse_csv(BufReader::new(file), self.id.clone(), self.label.clone())?;
        if let Some(observed_at) = file_mtime(&self.path) {
            snapshot = snapshot.with_observed_at(observed_at);
        }
        info!(
            "[parcel:csv] loaded {} row(s) from {} (label='{}')",
            snapshot.len(),
            self.path.display(),
            self.label
        );
        Ok(snapshot)
    }
}
