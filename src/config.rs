use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use workday_core::{ConvertError, WorkdayConfig};

pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_DB_PATH: &str = "workday-feed.sqlite3";
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 3_600_000;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug)]
pub enum ConfigError {
    Invalid { variable: &'static str, message: String },
    Workday(ConvertError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { variable, message } => write!(f, "{variable}: {message}"),
            ConfigError::Workday(err) => write!(f, "workday settings: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConvertError> for ConfigError {
    fn from(value: ConvertError) -> Self {
        Self::Workday(value)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_addr: SocketAddr,
    pub db_path: PathBuf,
    /// `None` disables the periodic refresh job.
    pub update_interval: Option<Duration>,
    pub update_api_key: Option<String>,
    pub client_url: Option<String>,
    pub fetch_timeout: Duration,
    pub workday: WorkdayConfig,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let http_addr = match var("WORKDAY_FEED_HTTP_ADDR") {
            Some(addr) => parse_var("WORKDAY_FEED_HTTP_ADDR", &addr)?,
            None => {
                let port = match var("PORT") {
                    Some(port) => parse_var("PORT", &port)?,
                    None => DEFAULT_HTTP_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let update_interval_ms = match var("UPDATE_INTERVAL") {
            Some(value) => parse_var::<u64>("UPDATE_INTERVAL", &value)?,
            None => DEFAULT_UPDATE_INTERVAL_MS,
        };
        let fetch_timeout_ms = match var("FETCH_TIMEOUT_MS") {
            Some(value) => parse_var::<u64>("FETCH_TIMEOUT_MS", &value)?,
            None => DEFAULT_FETCH_TIMEOUT_MS,
        };
        if fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                variable: "FETCH_TIMEOUT_MS",
                message: "must be greater than zero".into(),
            });
        }

        let mut workday = WorkdayConfig::default();
        if let Some(timezone) = var("CALENDAR_TIMEZONE") {
            workday = workday.with_timezone(timezone);
        }
        if let Some(hour) = var("WORKDAY_START_HOUR") {
            workday = workday.with_day_start_hour(parse_var("WORKDAY_START_HOUR", &hour)?);
        }
        if let Some(summary) = var("DEFAULT_SUMMARY") {
            workday = workday.with_summary(summary);
        }
        if let Some(keywords) = lookup("EXCLUDE_KEYWORDS") {
            workday = workday.with_exclusion_keywords(
                keywords
                    .split(',')
                    .map(str::trim)
                    .filter(|term| !term.is_empty()),
            );
        }
        workday.validate()?;

        Ok(Self {
            http_addr,
            db_path: var("WORKDAY_FEED_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            update_interval: (update_interval_ms > 0)
                .then(|| Duration::from_millis(update_interval_ms)),
            update_api_key: var("UPDATE_API_KEY"),
            client_url: var("CLIENT_URL"),
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            workday,
        })
    }
}

fn parse_var<T>(variable: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|err| ConfigError::Invalid {
        variable,
        message: format!("cannot parse '{value}': {err}"),
    })
}
