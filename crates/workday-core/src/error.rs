use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// Which party is at fault for a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The payload is not a calendar at all.
    MalformedInput(String),
    InvalidTimezone(String),
    InvalidConfig(String),
    /// A workday record whose start lies after its end reached the writer.
    RenderInconsistency {
        workday: NaiveDate,
        earliest_start: DateTime<Utc>,
        latest_end: DateTime<Utc>,
    },
}

impl ConvertError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ConvertError::MalformedInput(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ConvertError::MalformedInput(_) => ErrorCategory::Input,
            ConvertError::InvalidTimezone(_) | ConvertError::InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            ConvertError::RenderInconsistency { .. } => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::MalformedInput(msg) => write!(f, "malformed calendar input: {msg}"),
            ConvertError::InvalidTimezone(tz) => write!(f, "unknown timezone identifier '{tz}'"),
            ConvertError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            ConvertError::RenderInconsistency {
                workday,
                earliest_start,
                latest_end,
            } => write!(
                f,
                "workday {workday} starts at {earliest_start} after it ends at {latest_end}"
            ),
        }
    }
}

impl std::error::Error for ConvertError {}

pub type ConvertResult<T> = Result<T, ConvertError>;
