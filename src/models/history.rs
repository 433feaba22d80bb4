use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One completed prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// ISO-8601 instant, kept as text so legacy or malformed values survive a round trip
    pub timestamp: String,
    /// Whether the video was classified as a deepfake
    pub result: bool,
    /// Authenticated user that ran the detection
    pub username: Option<String>,
    /// Fake-probability reported by the classifier
    pub probability: Option<f32>,
}

/// Real/fake counts for one calendar day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCounts {
    pub real_count: u64,
    pub fake_count: u64,
}

impl DayCounts {
    pub fn total(&self) -> u64 {
        self.real_count + self.fake_count
    }
}

/// Parse the calendar date of an ISO-8601 timestamp
///
/// Accepts RFC 3339 (with offset) and naive `YYYY-MM-DDTHH:MM:SS[.fff]` forms.
/// The date is taken as written, without converting between offsets.
pub fn parse_entry_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(timestamp, "%Y-%m-%d").ok()
}

/// Group entries by the date component of their timestamp
///
/// Entries whose timestamp cannot be parsed are skipped.
pub fn distribution_by_day(entries: &[HistoryEntry]) -> BTreeMap<NaiveDate, DayCounts> {
    let mut days: BTreeMap<NaiveDate, DayCounts> = BTreeMap::new();

    for entry in entries {
        let Some(date) = parse_entry_date(&entry.timestamp) else {
            tracing::debug!("Skipping history entry with invalid timestamp: {}", entry.timestamp);
            continue;
        };

        let counts = days.entry(date).or_default();
        if entry.result {
            counts.fake_count += 1;
        } else {
            counts.real_count += 1;
        }
    }

    days
}
