use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};

use crate::config::{SnapshotSpec, TrackerConfig};
use crate::differ::{ChangeCategory, ChangeReport};
use crate::export::write_change_csv_path;

#[derive(Debug, Parser)]
#[command(
    name = "missing_parcels",
    disable_help_subcommand = true,
    about = "Find parcel identifiers that disappeared or reappeared across three snapshots",
    long_about = "Compare oldest, middle, and newest CSV snapshots of a parcel table and report identifiers that disappeared after the oldest, disappeared after the middle, or reappeared in the newest snapshot.",
    after_help = "Snapshots are taken from --config, else --dir, else exactly three --snapshot LABEL=PATH flags in chronological order."
)]
/// CLI for `missing_parcels`.
///
/// Common usage:
/// - Discover year-tagged files: `--dir ./data`
/// - Explicit files: `--snapshot 2020=a.csv --snapshot 2023=b.csv --snapshot 2024=c.csv`
/// - Write the change table: `--output missing_tmks.csv`
struct MissingParcelsCli {
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["dir", "snapshots"],
        help = "JSON tracker config describing the three snapshots"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "DIR",
        conflicts_with = "snapshots",
        help = "Directory of year-tagged CSV snapshots (for example tmk_2020.csv)"
    )]
    dir: Option<PathBuf>,
    #[arg(
        long = "snapshot",
        value_name = "LABEL=PATH",
        value_parser = parse_snapshot_arg,
        help = "Snapshot file with its label, repeat three times oldest first"
    )]
    snapshots: Vec<SnapshotSpec>,
    #[arg(
        long = "id-keyword",
        value_name = "KEYWORD",
        help = "Override identifier column keywords, repeat as needed"
    )]
    id_keywords: Vec<String>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Optional path for the exported change table"
    )]
    output: Option<PathBuf>,
    #[arg(long = "show-rows", help = "Print every change row after the summary")]
    show_rows: bool,
}

/// Run the `missing_parcels` demo with command-line arguments (program name excluded).
pub fn run_missing_parcels<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let Some(cli) = parse_cli::<MissingParcelsCli, _>(
        std::iter::once("missing_parcels".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let mut config = if let Some(path) = &cli.config {
        TrackerConfig::from_json_path(path)?
    } else if let Some(dir) = &cli.dir {
        TrackerConfig::from_directory(dir)?
    } else {
        let [oldest, middle, newest]: [SnapshotSpec; 3] =
            cli.snapshots.try_into().map_err(|specs: Vec<SnapshotSpec>| {
                format!(
                    "expected exactly 3 --snapshot values (oldest, middle, newest), got {}",
                    specs.len()
                )
            })?;
        TrackerConfig::new(oldest, middle, newest)
    };
    if !cli.id_keywords.is_empty() {
        let keywords = config.keywords.clone().with_identifier(&cli.id_keywords);
        keywords.validate()?;
        config = config.with_keywords(keywords);
    }

    let report = config.run()?;
    print_report(&report, cli.show_rows);

    if let Some(output) = &cli.output {
        write_change_csv_path(output, &report)?;
        println!();
        println!("wrote {} row(s) to {}", report.records.len(), output.display());
    }
    Ok(())
}

fn print_report(report: &ChangeReport, show_rows: bool) {
    println!("=== parcel changes ===");
    println!(
        "snapshots: {} -> {} -> {}",
        report.labels.oldest, report.labels.middle, report.labels.newest
    );
    println!(
        "columns: id='{}' lat='{}' lon='{}'",
        report.columns.identifier, report.columns.latitude, report.columns.longitude
    );
    println!();
    println!("[SUMMARY]");
    for entry in &report.summary.per_category {
        println!(
            "  {:<28} {:>8}  ({:.1}%)",
            entry.category.label(&report.labels),
            format_count(entry.count),
            entry.share * 100.0
        );
    }
    println!("  {:<28} {:>8}", "total", format_count(report.summary.total));

    if !show_rows {
        return;
    }
    for category in ChangeCategory::ALL {
        println!();
        println!("[{}]", category.label(&report.labels));
        for record in report.records_for(category) {
            println!(
                "  {}  lat={}  lon={}",
                record.identifier,
                record
                    .latitude
                    .map(|value| format!("{value:.6}"))
                    .unwrap_or_else(|| "-".to_string()),
                record
                    .longitude
                    .map(|value| format!("{value:.6}"))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }
}

/// Render a count with thousands separators (`12345` -> `12,345`).
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn parse_snapshot_arg(raw: &str) -> Result<SnapshotSpec, String> {
    let (label, path) = raw
        .split_once('=')
        .ok_or_else(|| format!("--snapshot expects LABEL=PATH, got '{raw}'"))?;
    let label = label.trim();
    let path = path.trim();
    if label.is_empty() || path.is_empty() {
        return Err(format!(
            "--snapshot expects a non-empty LABEL and PATH, got '{raw}'"
        ));
    }
    Ok(SnapshotSpec::path(label, path))
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
