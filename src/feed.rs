use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use workday_core::{Conversion, WorkdayRecord};

/// Length of the public feed identifier, in hex characters.
pub const FEED_ID_LEN: usize = 16;

/// Stable lookup key for a subscribed feed: SHA-256 of `url || summary`.
pub fn feed_id(url: &str, summary: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(summary.as_bytes());
    let digest = hasher.finalize();

    let mut id = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        let _ = write!(id, "{byte:02x}");
    }
    id.truncate(FEED_ID_LEN);
    id
}

/// A subscribed source feed together with its latest simplified calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    pub unique_id: String,
    pub url: String,
    pub summary: String,
    pub ical_content: String,
    #[serde(default)]
    pub workdays: Vec<WorkdayRecord>,
    pub last_updated: DateTime<Utc>,
}

impl FeedRecord {
    pub fn from_conversion(
        url: &str,
        summary: &str,
        conversion: Conversion,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            unique_id: feed_id(url, summary),
            url: url.to_string(),
            summary: summary.to_string(),
            ical_content: conversion.document,
            workdays: conversion.records.into_values().collect(),
            last_updated,
        }
    }

    /// Replaces the calendar content after a refresh, keeping the identity.
    pub fn apply_conversion(&mut self, conversion: Conversion, last_updated: DateTime<Utc>) {
        self.ical_content = conversion.document;
        self.workdays = conversion.records.into_values().collect();
        self.last_updated = last_updated;
    }
}
