/// Local CSV file source.
pub mod csv_file;
