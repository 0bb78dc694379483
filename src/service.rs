use crate::feed::{FeedRecord, feed_id};
use crate::fetch::{FeedSource, FetchError, normalize_feed_url};
use crate::persistence::{FeedStore, PersistenceError};
use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use workday_core::{ConvertError, WorkdayConfig, WorkdayConverter};

pub const DEFAULT_REFRESH_PAUSE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub enum ServiceError {
    InvalidRequest(String),
    NotFound(String),
    Fetch(FetchError),
    Convert(ConvertError),
    Persistence(PersistenceError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            ServiceError::NotFound(id) => write!(f, "calendar {id} not found"),
            ServiceError::Fetch(err) => write!(f, "fetch failed: {err}"),
            ServiceError::Convert(err) => write!(f, "conversion failed: {err}"),
            ServiceError::Persistence(err) => write!(f, "storage failed: {err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<FetchError> for ServiceError {
    fn from(value: FetchError) -> Self {
        match value {
            err @ FetchError::InvalidUrl(_) => Self::InvalidRequest(err.to_string()),
            other => Self::Fetch(other),
        }
    }
}

impl From<ConvertError> for ServiceError {
    fn from(value: ConvertError) -> Self {
        Self::Convert(value)
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub feed_count: usize,
    pub refreshed: usize,
    pub failed: usize,
}

impl RefreshReport {
    pub fn to_cli_summary(&self) -> String {
        format!(
            "feeds={}, refreshed={}, failed={}",
            self.feed_count, self.refreshed, self.failed
        )
    }
}

/// Fetches, converts and stores subscribed feeds.
pub struct FeedService {
    store: Arc<dyn FeedStore>,
    source: Arc<dyn FeedSource>,
    defaults: WorkdayConfig,
    refresh_pause: Duration,
}

impl FeedService {
    pub fn new(
        store: Arc<dyn FeedStore>,
        source: Arc<dyn FeedSource>,
        defaults: WorkdayConfig,
    ) -> ServiceResult<Self> {
        defaults.validate()?;
        Ok(Self {
            store,
            source,
            defaults,
            refresh_pause: DEFAULT_REFRESH_PAUSE,
        })
    }

    pub fn with_refresh_pause(mut self, pause: Duration) -> Self {
        self.refresh_pause = pause;
        self
    }

    pub fn defaults(&self) -> &WorkdayConfig {
        &self.defaults
    }

    pub fn store(&self) -> &Arc<dyn FeedStore> {
        &self.store
    }

    fn converter_for(&self, summary: &str) -> ServiceResult<WorkdayConverter> {
        let config = self.defaults.clone().with_summary(summary);
        Ok(WorkdayConverter::new(config)?)
    }

    /// Subscribes to `url` and stores its simplified calendar. Generating the
    /// same url and summary again replaces the stored record.
    pub async fn generate(&self, url: &str, summary: Option<&str>) -> ServiceResult<FeedRecord> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ServiceError::InvalidRequest("url is required".into()));
        }
        normalize_feed_url(url)?;
        let summary = summary
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .unwrap_or(self.defaults.summary.as_str())
            .to_string();

        let raw = self.source.fetch(url).await?;
        let conversion = self.converter_for(&summary)?.convert(&raw)?;
        info!(
            feed = %feed_id(url, &summary),
            "generated calendar: {}",
            conversion.summary.to_cli_summary()
        );
        let record = FeedRecord::from_conversion(url, &summary, conversion, Utc::now());
        self.store.save_feed(&record)?;
        Ok(record)
    }

    pub fn calendar(&self, unique_id: &str) -> ServiceResult<FeedRecord> {
        self.store
            .load_feed(unique_id)?
            .ok_or_else(|| ServiceError::NotFound(unique_id.to_string()))
    }

    pub async fn refresh_feed(&self, feed: &mut FeedRecord) -> ServiceResult<()> {
        let raw = self.source.fetch(&feed.url).await?;
        let conversion = self.converter_for(&feed.summary)?.convert(&raw)?;
        feed.apply_conversion(conversion, Utc::now());
        self.store.save_feed(feed)?;
        Ok(())
    }

    /// Refreshes every stored feed one after another. A failing feed is
    /// logged and counted; it does not stop the others.
    pub async fn refresh_all(&self) -> ServiceResult<RefreshReport> {
        let feeds = self.store.list_feeds()?;
        let mut report = RefreshReport {
            feed_count: feeds.len(),
            ..RefreshReport::default()
        };
        info!(feeds = report.feed_count, "refreshing calendars");

        for (index, mut feed) in feeds.into_iter().enumerate() {
            if index > 0 && !self.refresh_pause.is_zero() {
                tokio::time::sleep(self.refresh_pause).await;
            }
            match self.refresh_feed(&mut feed).await {
                Ok(()) => report.refreshed += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(feed = %feed.unique_id, url = %feed.url, "refresh failed: {err}");
                }
            }
        }

        info!("refresh finished: {}", report.to_cli_summary());
        Ok(report)
    }
}
