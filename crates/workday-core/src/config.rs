use crate::error::{ConvertError, ConvertResult};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "Europe/Stockholm";
pub const DEFAULT_DAY_START_HOUR: u32 = 6;
pub const DEFAULT_SUMMARY: &str = "Jobb";
pub const DEFAULT_EXCLUSION_KEYWORDS: [&str; 5] =
    ["work reduction", "holiday", "loa", "care of child", "sick"];

/// Caller supplied settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkdayConfig {
    pub timezone: String,
    pub day_start_hour: u32,
    pub summary: String,
    pub exclusion_keywords: Vec<String>,
}

impl Default for WorkdayConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            day_start_hour: DEFAULT_DAY_START_HOUR,
            summary: DEFAULT_SUMMARY.to_string(),
            exclusion_keywords: DEFAULT_EXCLUSION_KEYWORDS
                .iter()
                .map(|term| term.to_string())
                .collect(),
        }
    }
}

impl WorkdayConfig {
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_day_start_hour(mut self, hour: u32) -> Self {
        self.day_start_hour = hour;
        self
    }

    pub fn with_exclusion_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusion_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn timezone(&self) -> ConvertResult<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn validate(&self) -> ConvertResult<()> {
        self.timezone()?;
        if self.day_start_hour > 23 {
            return Err(ConvertError::InvalidConfig(format!(
                "day start hour must be between 0 and 23 (got {})",
                self.day_start_hour
            )));
        }
        Ok(())
    }
}

pub fn parse_timezone(name: &str) -> ConvertResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ConvertError::InvalidTimezone(name.to_string()))
}
