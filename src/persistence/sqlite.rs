use super::{FeedStore, PersistenceError, PersistenceResult};
use crate::feed::FeedRecord;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use workday_core::WorkdayRecord;

pub struct SqliteFeedStore {
    connection: Mutex<Connection>,
}

/// Column values as stored, before JSON and timestamp decoding.
struct FeedRow {
    unique_id: String,
    url: String,
    summary: String,
    ical_content: String,
    workdays_json: String,
    last_updated: String,
}

impl FeedRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            unique_id: row.get(0)?,
            url: row.get(1)?,
            summary: row.get(2)?,
            ical_content: row.get(3)?,
            workdays_json: row.get(4)?,
            last_updated: row.get(5)?,
        })
    }

    fn into_feed(self) -> PersistenceResult<FeedRecord> {
        let workdays: Vec<WorkdayRecord> = serde_json::from_str(&self.workdays_json)?;
        let last_updated = DateTime::parse_from_rfc3339(&self.last_updated)
            .map_err(|err| {
                PersistenceError::InvalidData(format!(
                    "invalid last_updated '{}' for feed {}: {err}",
                    self.last_updated, self.unique_id
                ))
            })?
            .with_timezone(&Utc);
        Ok(FeedRecord {
            unique_id: self.unique_id,
            url: self.url,
            summary: self.summary,
            ical_content: self.ical_content,
            workdays,
            last_updated,
        })
    }
}

const SELECT_FEED: &str = "SELECT unique_id, url, summary, ical_content, workdays_json, last_updated FROM feeds";

impl SqliteFeedStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS feeds (
                unique_id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                summary TEXT NOT NULL,
                ical_content TEXT NOT NULL,
                workdays_json TEXT NOT NULL,
                last_updated TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }
}

impl FeedStore for SqliteFeedStore {
    fn save_feed(&self, feed: &FeedRecord) -> PersistenceResult<()> {
        super::validate_feed(feed)?;
        let workdays_json = serde_json::to_string(&feed.workdays)?;
        let conn = self.connection.lock();
        conn.execute(
            "INSERT INTO feeds (unique_id, url, summary, ical_content, workdays_json, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(unique_id) DO UPDATE SET
                url = excluded.url,
                summary = excluded.summary,
                ical_content = excluded.ical_content,
                workdays_json = excluded.workdays_json,
                last_updated = excluded.last_updated",
            params![
                feed.unique_id,
                feed.url,
                feed.summary,
                feed.ical_content,
                workdays_json,
                feed.last_updated.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn load_feed(&self, unique_id: &str) -> PersistenceResult<Option<FeedRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!("{SELECT_FEED} WHERE unique_id = ?1"))?;
        let row = stmt
            .query_row(params![unique_id], FeedRow::from_row)
            .optional()?;
        row.map(FeedRow::into_feed).transpose()
    }

    fn list_feeds(&self) -> PersistenceResult<Vec<FeedRecord>> {
        let conn = self.connection.lock();
        let mut stmt = conn.prepare(&format!("{SELECT_FEED} ORDER BY unique_id ASC"))?;
        let rows = stmt.query_map([], FeedRow::from_row)?;

        let mut feeds = Vec::new();
        for row in rows {
            feeds.push(row?.into_feed()?);
        }
        Ok(feeds)
    }

    fn delete_feed(&self, unique_id: &str) -> PersistenceResult<bool> {
        let conn = self.connection.lock();
        let removed = conn.execute("DELETE FROM feeds WHERE unique_id = ?1", params![unique_id])?;
        Ok(removed > 0)
    }
}
