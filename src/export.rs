//! CSV export of change tables.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::constants::differ::CHANGE_COLUMN;
use crate::differ::ChangeReport;
use crate::errors::TrackerError;

/// Write the change table as CSV.
///
/// The header reuses the resolved source column names followed by `change`;
/// unknown coordinates are written as empty fields.
pub fn write_change_csv<W: Write>(writer: W, report: &ChangeReport) -> Result<(), TrackerError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        report.columns.identifier.as_str(),
        report.columns.latitude.as_str(),
        report.columns.longitude.as_str(),
        CHANGE_COLUMN,
    ])?;
    for record in &report.records {
        csv_writer.write_record([
            record.identifier.clone(),
            format_coordinate(record.latitude),
            format_coordinate(record.longitude),
            record.label.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the change table to a file, replacing any existing file.
pub fn write_change_csv_path(
    path: impl AsRef<Path>,
    report: &ChangeReport,
) -> Result<(), TrackerError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_change_csv(file, report)?;
    info!(
        "[parcel:export] wrote {} change row(s) to {}",
        report.records.len(),
        path.display()
    );
    Ok(())
}

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnKey, Snapshot};
    use crate::differ::{SnapshotDiffer, SnapshotSeries};

    fn series() -> SnapshotSeries {
        let header = || -> Vec<ColumnKey> { vec!["TMK_ID".into(), "LAT".into(), "LON".into()] };
        SnapshotSeries::new(
            Snapshot::new("a", "2020", header())
                .with_row(["1", "21.5", "-157.9"])
                .with_row(["2", "21.6", ""]),
            Snapshot::new("b", "2023", header()).with_row(["1", "21.5", "-157.9"]),
            Snapshot::new("c", "2024", header()).with_row(["1", "21.5", "-157.9"]),
        )
    }

    #[test]
    fn export_uses_resolved_headers_and_blank_missing_coordinates() {
        let report = SnapshotDiffer::default().diff(&series()).unwrap();
        let mut buffer = Vec::new();
        write_change_csv(&mut buffer, &report).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "TMK_ID,LAT,LON,change\n2,21.6,,Disappeared after 2020\n"
        );
    }

    #[test]
    fn export_to_path_writes_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing_tmks.csv");
        let report = SnapshotDiffer::default().diff(&series()).unwrap();
        write_change_csv_path(&path, &report).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("TMK_ID,LAT,LON,change\n"));
        assert_eq!(written.lines().count(), 2);
    }
}
