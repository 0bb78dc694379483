use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use workday_core::ErrorCategory;

use crate::{
    FeedService, JobStatus, ServiceError, SharedStatus, refresh, status::shared_status,
};

/// Characters `encodeURIComponent` leaves alone, so subscription links match
/// what browsers produce.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const GOOGLE_CALENDAR_RENDER: &str = "https://www.google.com/calendar/render?cid=";

#[derive(Clone)]
pub struct AppState {
    service: Arc<FeedService>,
    generate_status: SharedStatus,
    update_status: SharedStatus,
    update_api_key: Option<String>,
    client_url: Option<String>,
}

impl AppState {
    pub fn new(service: Arc<FeedService>) -> Self {
        Self {
            service,
            generate_status: shared_status(),
            update_status: shared_status(),
            update_api_key: None,
            client_url: None,
        }
    }

    pub fn with_update_api_key(mut self, key: Option<String>) -> Self {
        self.update_api_key = key;
        self
    }

    pub fn with_client_url(mut self, origin: Option<String>) -> Self {
        self.client_url = origin;
        self
    }

    /// The status shared with the periodic refresh job.
    pub fn update_status(&self) -> SharedStatus {
        self.update_status.clone()
    }

    pub fn service(&self) -> Arc<FeedService> {
        self.service.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Unauthorized(String),
    Upstream(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::InvalidRequest(message) => ApiError::Invalid(message),
            err @ ServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            err @ ServiceError::Fetch(_) => ApiError::Upstream(err.to_string()),
            ServiceError::Convert(err) => match err.category() {
                ErrorCategory::Input => ApiError::Unprocessable(err.to_string()),
                ErrorCategory::Configuration | ErrorCategory::Internal => {
                    ApiError::Internal(err.to_string())
                }
            },
            err @ ServiceError::Persistence(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            ApiError::Upstream(message) => (StatusCode::BAD_GATEWAY, "upstream_error", message),
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "malformed_calendar", message)
            }
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct GeneratePayload {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    google_link: String,
    api_url: String,
    unique_id: String,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct UpdateQuery {
    #[serde(rename = "apiKey")]
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    message: &'static str,
    update_status: JobStatus,
}

pub fn router(state: AppState) -> Router {
    let cors = state.client_url.as_deref().and_then(cors_layer);
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/generate-status", get(generate_status))
        .route("/calendar/:id", get(get_calendar))
        .route("/update-calendars", get(update_calendars))
        .route("/update-status", get(update_status))
        .with_state(state);
    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    match HeaderValue::from_str(origin) {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_headers([header::CONTENT_TYPE])
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST]),
        ),
        Err(err) => {
            warn!("ignoring CLIENT_URL '{origin}': {err}");
            None
        }
    }
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn root() -> impl IntoResponse {
    Json(json!({ "status": "online", "message": "API is running" }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<GeneratePayload>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let url = payload
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::invalid("url is required"))?;

    state.generate_status.write().begin(Utc::now());
    let result = state.service.generate(url, payload.summary.as_deref()).await;
    let record = match result {
        Ok(record) => {
            state
                .generate_status
                .write()
                .succeed(Utc::now(), Some(record.unique_id.clone()));
            record
        }
        Err(err) => {
            error!(url = %url, "generate failed: {err}");
            state.generate_status.write().fail(Utc::now(), err.to_string());
            return Err(ApiError::from(err));
        }
    };

    let api_url = format!("{}/calendar/{}", base_url(&headers), record.unique_id);
    let google_link = format!(
        "{GOOGLE_CALENDAR_RENDER}{}",
        utf8_percent_encode(&api_url, URI_COMPONENT)
    );
    Ok(Json(GenerateResponse {
        google_link,
        api_url,
        unique_id: record.unique_id,
        last_updated: record.last_updated,
    }))
}

async fn generate_status(State(state): State<AppState>) -> Json<JobStatus> {
    let snapshot = state.generate_status.read().clone();
    Json(snapshot)
}

async fn get_calendar(
    State(state): State<AppState>,
    Path(unique_id): Path<String>,
) -> Result<Response, ApiError> {
    let record = state.service.calendar(&unique_id)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=calendar.ics"),
        ],
        record.ical_content,
    )
        .into_response())
}

async fn update_calendars(
    State(state): State<AppState>,
    Query(query): Query<UpdateQuery>,
) -> Result<Response, ApiError> {
    let authorized = match (&state.update_api_key, &query.api_key) {
        (Some(expected), Some(given)) => expected == given,
        _ => false,
    };
    if !authorized {
        return Err(ApiError::Unauthorized("invalid api key".into()));
    }

    let started = refresh::start_refresh(state.service(), state.update_status());
    let snapshot = state.update_status.read().clone();
    if !started {
        let body = UpdateResponse {
            message: "update already running",
            update_status: snapshot,
        };
        return Ok((StatusCode::ACCEPTED, Json(body)).into_response());
    }
    let body = UpdateResponse {
        message: "update started",
        update_status: snapshot,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

async fn update_status(State(state): State<AppState>) -> Json<JobStatus> {
    let snapshot = state.update_status.read().clone();
    Json(snapshot)
}

/// Scheme and host the client used to reach us, honouring a reverse proxy's
/// `x-forwarded-proto`.
fn base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}
