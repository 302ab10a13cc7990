//! Keyword-based column detection.
//!
//! Detection scans columns in header order and returns the first column whose
//! lowercased name contains any of the candidate keywords. Column order, not
//! keyword order, breaks ties: with columns `["y_coord", "lat"]` and keywords
//! `["lat", "y"]` the result is `y_coord`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::columns::{IDENTIFIER_KEYWORDS, LATITUDE_KEYWORDS, LONGITUDE_KEYWORDS};
use crate::data::{ColumnKey, Snapshot};
use crate::differ::SnapshotRole;
use crate::errors::TrackerError;
use crate::types::{ColumnName, Keyword};

/// Logical role a detected column plays in change detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Parcel identifier (TMK).
    Identifier,
    /// Latitude coordinate.
    Latitude,
    /// Longitude coordinate.
    Longitude,
}

impl ColumnRole {
    /// All roles in resolution order.
    pub const ALL: [ColumnRole; 3] = [
        ColumnRole::Identifier,
        ColumnRole::Latitude,
        ColumnRole::Longitude,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::Latitude => "latitude",
            ColumnRole::Longitude => "longitude",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return the first column (in header order) whose lowercased name contains
/// any keyword, or `None` when nothing matches.
///
/// Non-string headers are skipped. Keywords are compared lowercased.
pub fn detect_column<'a, K>(columns: &'a [ColumnKey], keywords: &[K]) -> Option<&'a str>
where
    K: AsRef<str>,
{
    let keywords: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.as_ref().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    if keywords.is_empty() {
        return None;
    }
    columns.iter().filter_map(ColumnKey::name).find(|name| {
        let lowered = name.to_lowercase();
        keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
    })
}

/// Candidate keywords per logical column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnKeywords {
    /// Keywords for the identifier column.
    pub identifier: Vec<Keyword>,
    /// Keywords for the latitude column.
    pub latitude: Vec<Keyword>,
    /// Keywords for the longitude column.
    pub longitude: Vec<Keyword>,
}

impl Default for ColumnKeywords {
    fn default() -> Self {
        Self {
            identifier: to_keywords(IDENTIFIER_KEYWORDS),
            latitude: to_keywords(LATITUDE_KEYWORDS),
            longitude: to_keywords(LONGITUDE_KEYWORDS),
        }
    }
}

impl ColumnKeywords {
    /// Override identifier keywords.
    pub fn with_identifier<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.identifier = to_keywords(keywords);
        self
    }

    /// Override latitude keywords.
    pub fn with_latitude<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.latitude = to_keywords(keywords);
        self
    }

    /// Override longitude keywords.
    pub fn with_longitude<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.longitude = to_keywords(keywords);
        self
    }

    /// Keywords for a role.
    pub fn for_role(&self, role: ColumnRole) -> &[Keyword] {
        match role {
            ColumnRole::Identifier => &self.identifier,
            ColumnRole::Latitude => &self.latitude,
            ColumnRole::Longitude => &self.longitude,
        }
    }

    /// Trim and lowercase every keyword, as the `with_*` builders do.
    pub fn normalized(self) -> Self {
        Self {
            identifier: to_keywords(self.identifier),
            latitude: to_keywords(self.latitude),
            longitude: to_keywords(self.longitude),
        }
    }

    /// Reject empty keyword lists.
    pub fn validate(&self) -> Result<(), TrackerError> {
        for role in ColumnRole::ALL {
            if self.for_role(role).iter().all(|keyword| keyword.is_empty()) {
                return Err(TrackerError::Configuration(format!(
                    "{role} keyword list must not be empty"
                )));
            }
        }
        Ok(())
    }
}

fn to_keywords<I, S>(keywords: I) -> Vec<Keyword>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|keyword| keyword.as_ref().trim().to_lowercase())
        .collect()
}

/// Column names resolved once against a reference header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumns {
    /// Identifier column name.
    pub identifier: ColumnName,
    /// Latitude column name.
    pub latitude: ColumnName,
    /// Longitude column name.
    pub longitude: ColumnName,
}

impl ResolvedColumns {
    /// Resolve all three roles against `columns`, failing on the first role
    /// that no column satisfies.
    pub fn detect(columns: &[ColumnKey], keywords: &ColumnKeywords) -> Result<Self, TrackerError> {
        let resolve = |role: ColumnRole| -> Result<ColumnName, TrackerError> {
            let found = detect_column(columns, keywords.for_role(role)).ok_or_else(|| {
                TrackerError::ColumnNotFound {
                    role,
                    keywords: keywords.for_role(role).to_vec(),
                }
            })?;
            debug!("[parcel:columns] {role} -> '{found}'");
            Ok(found.to_string())
        };
        let resolved = Self {
            identifier: resolve(ColumnRole::Identifier)?,
            latitude: resolve(ColumnRole::Latitude)?,
            longitude: resolve(ColumnRole::Longitude)?,
        };
        for (left, right) in resolved.shared_roles() {
            warn!(
                "[parcel:columns] {left} and {right} both resolved to '{}'",
                resolved.name(left)
            );
        }
        Ok(resolved)
    }

    /// Role pairs that resolved to the same column.
    pub fn shared_roles(&self) -> Vec<(ColumnRole, ColumnRole)> {
        let mut shared = Vec::new();
        for (idx, left) in ColumnRole::ALL.iter().enumerate() {
            for right in ColumnRole::ALL.iter().skip(idx + 1) {
                if self.name(*left) == self.name(*right) {
                    shared.push((*left, *right));
                }
            }
        }
        shared
    }

    /// Column name resolved for a role.
    pub fn name(&self, role: ColumnRole) -> &str {
        match role {
            ColumnRole::Identifier => &self.identifier,
            ColumnRole::Latitude => &self.latitude,
            ColumnRole::Longitude => &self.longitude,
        }
    }

    /// Ensure `snapshot` carries every resolved column.
    pub fn ensure_present(
        &self,
        snapshot: &Snapshot,
        role: SnapshotRole,
    ) -> Result<(), TrackerError> {
        for column_role in ColumnRole::ALL {
            let column = self.name(column_role);
            if !snapshot.has_column(column) {
                return Err(TrackerError::MissingColumn {
                    role,
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }
}
