/// Constants used by column keyword detection.
pub mod columns {
    /// Default keywords identifying the parcel identifier column.
    pub const IDENTIFIER_KEYWORDS: &[&str] = &["tmk"];
    /// Default keywords identifying the latitude column, checked in order.
    pub const LATITUDE_KEYWORDS: &[&str] = &["lat", "latitude", "y"];
    /// Default keywords identifying the longitude column, checked in order.
    pub const LONGITUDE_KEYWORDS: &[&str] = &["lon", "lng", "longitude", "x"];
}

/// Constants used by the snapshot differ and its output table.
pub mod differ {
    /// Name of the appended change-label column in exported tables.
    pub const CHANGE_COLUMN: &str = "change";
    /// Default label for the oldest snapshot.
    pub const DEFAULT_OLDEST_LABEL: &str = "oldest";
    /// Default label for the middle snapshot.
    pub const DEFAULT_MIDDLE_LABEL: &str = "middle";
    /// Default label for the newest snapshot.
    pub const DEFAULT_NEWEST_LABEL: &str = "newest";
}

/// Constants used by snapshot loaders and discovery.
pub mod source {
    /// File extension recognized as a CSV snapshot (case-insensitive).
    pub const CSV_EXTENSION: &str = "csv";
    /// Source id prefix used for inline (embedded) snapshots.
    pub const INLINE_SOURCE_PREFIX: &str = "inline";
    /// Number of snapshots compared in one run.
    pub const SNAPSHOT_COUNT: usize = 3;
}
