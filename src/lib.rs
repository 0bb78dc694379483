pub mod config;
pub mod feed;
pub mod fetch;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod persistence;
pub mod refresh;
pub mod service;
pub mod status;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use feed::{FeedRecord, feed_id};
pub use fetch::{FeedSource, FetchError, HttpFeedSource, normalize_feed_url};
pub use persistence::{FeedStore, MemoryFeedStore, PersistenceError};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteFeedStore;
pub use service::{FeedService, RefreshReport, ServiceError};
pub use status::{JobStatus, SharedStatus};
