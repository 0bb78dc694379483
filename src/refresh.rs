use crate::service::{FeedService, RefreshReport, ServiceResult};
use crate::status::SharedStatus;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Runs one full refresh and records its outcome in `status`. Returns `None`
/// when another refresh already holds the status.
pub async fn run_refresh(
    service: &FeedService,
    status: &SharedStatus,
) -> Option<ServiceResult<RefreshReport>> {
    if !status.write().try_begin(Utc::now()) {
        warn!("refresh already running, skipping");
        return None;
    }

    let result = service.refresh_all().await;
    {
        let mut guard = status.write();
        match &result {
            Ok(_) => guard.succeed(Utc::now(), None),
            Err(err) => guard.fail(Utc::now(), err.to_string()),
        }
    }
    Some(result)
}

/// Starts a refresh in the background. The status is claimed before the task
/// is spawned, so a `false` return means nothing was started.
pub fn start_refresh(service: Arc<FeedService>, status: SharedStatus) -> bool {
    if !status.write().try_begin(Utc::now()) {
        return false;
    }
    tokio::spawn(async move {
        let result = service.refresh_all().await;
        let mut guard = status.write();
        match result {
            Ok(_) => guard.succeed(Utc::now(), None),
            Err(err) => guard.fail(Utc::now(), err.to_string()),
        }
    });
    true
}

pub fn spawn_periodic_refresh(
    service: Arc<FeedService>,
    status: SharedStatus,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;
        info!(every_ms = every.as_millis() as u64, "periodic refresh scheduled");
        loop {
            interval.tick().await;
            if let Some(Err(err)) = run_refresh(&service, &status).await {
                warn!("periodic refresh failed: {err}");
            }
        }
    })
}
