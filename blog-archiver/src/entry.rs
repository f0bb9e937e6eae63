use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};
use crate::listing::ListingRow;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One blog post found on the archive index that is not in the ledger yet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiscoveredEntry {
    pub url: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub title: String,
}

impl DiscoveredEntry {
    pub fn new(url: &str, date: &str, title: &str) -> Result<Self> {
        NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|e| ArchiveError::parse(format!("invalid entry date '{}': {}", date, e)))?;

        Ok(DiscoveredEntry {
            url: normalize_url(url),
            date: date.to_string(),
            title: collapse_whitespace(title),
        })
    }

    /// Date with the separators stripped, e.g. `20161029`.
    pub fn file_stem(&self) -> String {
        self.date.replace('-', "")
    }

    /// The line written to the ledger once the entry is archived.
    pub fn to_record(&self) -> String {
        format!("{} {} {}", self.url, self.date, self.title)
    }
}

/// Listing rows carry an already validated date.
impl From<&ListingRow> for DiscoveredEntry {
    fn from(row: &ListingRow) -> Self {
        DiscoveredEntry {
            url: normalize_url(&row.url),
            date: row.date.clone(),
            title: collapse_whitespace(&row.title),
        }
    }
}

pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
