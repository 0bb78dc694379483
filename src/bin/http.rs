use std::sync::Arc;

use tracing::info;
use workday_feed::{
    FeedService, HttpFeedSource, ServiceConfig, SqliteFeedStore, http_api, refresh,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();
    let config = ServiceConfig::from_env()?;

    let store = SqliteFeedStore::new(&config.db_path)?;
    let source = HttpFeedSource::new(config.fetch_timeout)?;
    let service = Arc::new(FeedService::new(
        Arc::new(store),
        Arc::new(source),
        config.workday.clone(),
    )?);

    let state = http_api::AppState::new(service.clone())
        .with_update_api_key(config.update_api_key.clone())
        .with_client_url(config.client_url.clone());

    match config.update_interval {
        Some(every) => {
            refresh::spawn_periodic_refresh(service, state.update_status(), every);
        }
        None => info!("periodic refresh disabled"),
    }

    info!(db = %config.db_path.display(), "workday-feed starting");
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}
