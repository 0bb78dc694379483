use crate::feed::FeedRecord;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Key-value storage for subscribed feeds, keyed by `FeedRecord::unique_id`.
pub trait FeedStore: Send + Sync {
    /// Inserts or replaces the feed with the same id.
    fn save_feed(&self, feed: &FeedRecord) -> PersistenceResult<()>;
    fn load_feed(&self, unique_id: &str) -> PersistenceResult<Option<FeedRecord>>;
    fn list_feeds(&self) -> PersistenceResult<Vec<FeedRecord>>;
    fn delete_feed(&self, unique_id: &str) -> PersistenceResult<bool>;
}

pub fn validate_feed(feed: &FeedRecord) -> PersistenceResult<()> {
    if feed.unique_id.trim().is_empty() {
        return Err(PersistenceError::InvalidData("feed has an empty id".into()));
    }
    if feed.url.trim().is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "feed {} has no source url",
            feed.unique_id
        )));
    }
    if let Some(record) = feed.workdays.iter().find(|record| !record.is_consistent()) {
        return Err(PersistenceError::InvalidData(format!(
            "feed {} has workday {} ending before it starts",
            feed.unique_id, record.workday
        )));
    }
    Ok(())
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_feeds_from_json, load_workdays_from_csv, save_feeds_to_json, save_workdays_to_csv,
};
pub use memory::MemoryFeedStore;
