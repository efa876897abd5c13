use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// One persisted conversion.
///
/// Created on a successful calculation, inserted into the history store and
/// never updated afterwards. Amounts are kept as the display text that was
/// converted, not re-parsed numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub source_symbol: String,
    pub target_symbol: String,
    pub source_amount: String,
    pub target_amount: String,

    /// Unix milliseconds at the moment the conversion completed.
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(
        source_symbol: impl Into<String>,
        target_symbol: impl Into<String>,
        source_amount: impl Into<String>,
        target_amount: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            source_symbol: source_symbol.into(),
            target_symbol: target_symbol.into(),
            source_amount: source_amount.into(),
            target_amount: target_amount.into(),
            timestamp,
        }
    }
}

/// A history entry formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub source_symbol: String,
    pub target_symbol: String,
    pub source_amount: String,
    pub target_amount: String,
    pub date: String,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            source_symbol: entry.source_symbol.clone(),
            target_symbol: entry.target_symbol.clone(),
            source_amount: format_amount(&entry.source_amount),
            target_amount: format_amount(&entry.target_amount),
            date: format_timestamp_millis(entry.timestamp),
        }
    }
}

/// All conversions that happened on one calendar day, display order matching
/// the underlying query (newest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    /// Calendar day key in the local time zone, "YYYY-MM-DD".
    pub day: String,
    pub entries: Vec<HistoryRow>,
}

/// Bucket entries by the local calendar day of their timestamp.
///
/// Bucket order follows the first occurrence of each day in `entries`, and
/// entries keep their relative order inside a bucket, so a newest-first input
/// produces newest-first buckets.
pub fn group_by_day(entries: &[HistoryEntry]) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for entry in entries {
        let day = day_key(entry.timestamp);
        match groups.iter_mut().find(|g| g.day == day) {
            Some(group) => group.entries.push(HistoryRow::from(entry)),
            None => groups.push(DayGroup {
                day,
                entries: vec![HistoryRow::from(entry)],
            }),
        }
    }
    groups
}

/// Local calendar day of a Unix-millisecond timestamp, "YYYY-MM-DD".
pub fn day_key(timestamp_millis: i64) -> String {
    format_with(timestamp_millis, "%Y-%m-%d")
}

/// Full local date-time of a Unix-millisecond timestamp.
pub fn format_timestamp_millis(timestamp_millis: i64) -> String {
    format_with(timestamp_millis, "%Y-%m-%d %H:%M:%S")
}

fn format_with(timestamp_millis: i64, pattern: &str) -> String {
    match Local.timestamp_millis_opt(timestamp_millis).single() {
        Some(dt) => dt.format(pattern).to_string(),
        None => String::new(),
    }
}

/// Two-decimal display form of a stored amount string; text that never was
/// a number is shown as stored.
fn format_amount(amount: &str) -> String {
    match amount.trim().parse::<f64>() {
        Ok(value) => format!("{value:.2}"),
        Err(_) => amount.to_string(),
    }
}
