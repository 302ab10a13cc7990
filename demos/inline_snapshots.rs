use std::error::Error;

use parcel_tracker::{
    ChangeCategory, InMemorySource, SnapshotDiffer, load_series, write_change_csv,
};

const TMK_2020: &str = "\
TMK,Latitude,Longitude
130010010000,19.7241,-155.0868
130010020000,19.7250,-155.0871
130010030000,19.7263,-155.0902
130010040000,19.7270,-155.0915
";

const TMK_2023: &str = "\
TMK,Latitude,Longitude
130010010000,19.7241,-155.0868
130010030000,19.7263,-155.0902
130010050000,19.7288,-155.0933
";

const TMK_2024: &str = "\
TMK,Latitude,Longitude
130010010000,19.7241,-155.0868
130010020000,19.7251,-155.0872
130010030000,19.7263,-155.0902
";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let oldest = InMemorySource::from_csv_str("2020", TMK_2020)?;
    let middle = InMemorySource::from_csv_str("2023", TMK_2023)?;
    let newest = InMemorySource::from_csv_str("2024", TMK_2024)?;
    let series = load_series(&oldest, &middle, &newest)?;

    let report = SnapshotDiffer::default().diff(&series)?;
    for category in ChangeCategory::ALL {
        println!(
            "{}: {}",
            category.label(&report.labels),
            report.summary.count(category)
        );
    }
    println!();
    write_change_csv(std::io::stdout().lock(), &report)?;
    Ok(())
}
