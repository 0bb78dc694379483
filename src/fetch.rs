use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub const USER_AGENT: &str = "Calendar-Converter";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum FetchError {
    InvalidUrl(String),
    Request(reqwest::Error),
    Status { url: String, status: u16 },
    Unavailable(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidUrl(url) => write!(f, "not an http(s) or webcal url: '{url}'"),
            FetchError::Request(err) => write!(f, "request failed: {err}"),
            FetchError::Status { url, status } => write!(f, "{url} answered with status {status}"),
            FetchError::Unavailable(msg) => write!(f, "feed unavailable: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        Self::Request(value)
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = FetchResult<String>> + Send + 'a>>;

/// Somewhere raw calendar text can be downloaded from.
pub trait FeedSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// Rewrites `webcal://` and `webcals://` to `https://` and rejects anything
/// that is not http(s) afterwards.
pub fn normalize_feed_url(url: &str) -> FetchResult<String> {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();

    let normalized = ["webcals://", "webcal://"]
        .iter()
        .find(|scheme| lower.starts_with(*scheme))
        .map(|scheme| format!("https://{}", &trimmed[scheme.len()..]))
        .unwrap_or_else(|| trimmed.to_string());

    let has_host = ["https://", "http://"]
        .iter()
        .find(|scheme| normalized.to_ascii_lowercase().starts_with(*scheme))
        .is_some_and(|scheme| !normalized[scheme.len()..].trim().is_empty());
    if has_host {
        Ok(normalized)
    } else {
        Err(FetchError::InvalidUrl(trimmed.to_string()))
    }
}

pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> FetchResult<String> {
        let url = normalize_feed_url(url)?;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

impl FeedSource for HttpFeedSource {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(self.get(url))
    }
}
