use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress of a long-running job as reported by the status endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub is_running: bool,
    pub last_started: Option<DateTime<Utc>>,
    pub last_completed: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub unique_id: Option<String>,
}

impl JobStatus {
    /// Marks the job as started unless a run is already in progress.
    /// Returns `false` when the caller must not start another run.
    pub fn try_begin(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running {
            return false;
        }
        self.begin(now);
        true
    }

    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.is_running = true;
        self.last_started = Some(now);
        self.error = None;
    }

    pub fn succeed(&mut self, now: DateTime<Utc>, unique_id: Option<String>) {
        self.is_running = false;
        self.last_completed = Some(now);
        self.error = None;
        if unique_id.is_some() {
            self.unique_id = unique_id;
        }
    }

    pub fn fail(&mut self, now: DateTime<Utc>, error: impl Into<String>) {
        self.is_running = false;
        self.last_completed = Some(now);
        self.error = Some(error.into());
    }
}

pub type SharedStatus = Arc<RwLock<JobStatus>>;

pub fn shared_status() -> SharedStatus {
    Arc::new(RwLock::new(JobStatus::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn second_begin_is_refused_until_the_first_run_ends() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        let mut status = JobStatus::default();
        assert!(status.try_begin(now));
        assert!(!status.try_begin(now));

        status.fail(now, "boom");
        assert!(!status.is_running);
        assert_eq!(status.error.as_deref(), Some("boom"));

        assert!(status.try_begin(now));
        assert_eq!(status.error, None);
        status.succeed(now, Some("abc".into()));
        assert_eq!(status.unique_id.as_deref(), Some("abc"));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(JobStatus::default()).unwrap();
        assert_eq!(value["isRunning"], false);
        assert!(value.get("lastStarted").is_some());
        assert!(value.get("uniqueId").is_some());
    }
}
