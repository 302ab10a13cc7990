/// Parcel identifier in its textual form.
/// Examples: `1-2-3-004-005-0000`, `130010010000`
pub type ParcelId = String;
/// Column header name as it appears in a snapshot.
/// Examples: `TMK`, `Latitude`, `lon_dd`
pub type ColumnName = String;
/// Lowercase keyword matched against column names during detection.
/// Examples: `tmk`, `lat`, `lng`
pub type Keyword = String;
/// Identifier for the loader that produced a snapshot.
/// Examples: `tmk_2020`, `inline::middle`
pub type SourceId = String;
/// Human label for a snapshot, usually its year.
/// Examples: `2020`, `2023`, `oldest`
pub type SnapshotLabel = String;
/// Human label for a change category.
/// Examples: `Disappeared after 2020`, `Reappeared in 2024`
pub type ChangeLabel = String;
