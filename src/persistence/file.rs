use super::{PersistenceError, PersistenceResult};
use crate::feed::FeedRecord;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use workday_core::{WorkdayMap, WorkdayRecord};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct FeedSnapshot {
    version: u32,
    feeds: Vec<FeedRecord>,
}

pub fn save_feeds_to_json<P: AsRef<Path>>(feeds: &[FeedRecord], path: P) -> PersistenceResult<()> {
    for feed in feeds {
        super::validate_feed(feed)?;
    }
    let snapshot = FeedSnapshot {
        version: SNAPSHOT_VERSION,
        feeds: feeds.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_feeds_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<FeedRecord>> {
    let file = File::open(path)?;
    let snapshot: FeedSnapshot = serde_json::from_reader(file)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistenceError::InvalidData(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    for feed in &snapshot.feeds {
        super::validate_feed(feed)?;
    }
    Ok(snapshot.feeds)
}

/// One workday per row. The UTC columns are authoritative; the local columns
/// are for people opening the file in a spreadsheet.
#[derive(Default, Serialize, Deserialize)]
struct WorkdayCsvRecord {
    workday: String,
    earliest_start_utc: String,
    latest_end_utc: String,
    #[serde(default)]
    earliest_start_local: String,
    #[serde(default)]
    latest_end_local: String,
    #[serde(default)]
    timezone: String,
}

impl WorkdayCsvRecord {
    fn from_record(record: &WorkdayRecord, timezone: Tz) -> Self {
        Self {
            workday: record.workday.format("%Y-%m-%d").to_string(),
            earliest_start_utc: record.earliest_start.to_rfc3339(),
            latest_end_utc: record.latest_end.to_rfc3339(),
            earliest_start_local: format_local(record.earliest_start, timezone),
            latest_end_local: format_local(record.latest_end, timezone),
            timezone: timezone.name().to_string(),
        }
    }

    fn into_record(self) -> PersistenceResult<WorkdayRecord> {
        let workday = NaiveDate::parse_from_str(self.workday.trim(), "%Y-%m-%d").map_err(|e| {
            PersistenceError::InvalidData(format!("invalid workday '{}': {e}", self.workday))
        })?;
        let record = WorkdayRecord {
            workday,
            earliest_start: parse_instant(&self.earliest_start_utc)?,
            latest_end: parse_instant(&self.latest_end_utc)?,
        };
        if !record.is_consistent() {
            return Err(PersistenceError::InvalidData(format!(
                "workday {workday} ends before it starts"
            )));
        }
        Ok(record)
    }
}

pub fn save_workdays_to_csv<P: AsRef<Path>>(
    records: &WorkdayMap,
    timezone: Tz,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records.values() {
        writer.serialize(WorkdayCsvRecord::from_record(record, timezone))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_workdays_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<WorkdayMap> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = WorkdayMap::new();
    for row in reader.deserialize::<WorkdayCsvRecord>() {
        let record = row?.into_record()?;
        if records.insert(record.workday, record).is_some() {
            return Err(PersistenceError::InvalidData(format!(
                "CSV file lists workday {} twice",
                record.workday
            )));
        }
    }
    Ok(records)
}

fn format_local(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant
        .with_timezone(&timezone)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn parse_instant(input: &str) -> PersistenceResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid timestamp '{input}': {e}")))
}
