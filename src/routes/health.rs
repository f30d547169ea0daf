use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::db::HealthSnapshot;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/info", get(info))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
    #[serde(rename = "databaseHealth", skip_serializing_if = "Option::is_none")]
    database_health: Option<HealthSnapshot>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
}

async fn root(State(state): State<AppState>) -> Response {
    // Reports the background monitor's snapshot rather than pinging inline,
    // so a flapping database shows up with its failure streak.
    let snapshot = match state.db_proxy() {
        Some(proxy) => Some(proxy.health_status().await),
        None => None,
    };

    let connected = snapshot.as_ref().map(|s| s.healthy).unwrap_or(false);

    let response = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        database: if connected { "connected" } else { "disconnected" },
        timestamp: now_iso(),
        database_health: snapshot,
    };

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    let response = LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

async fn info(State(state): State<AppState>) -> Response {
    let response = HealthInfoResponse {
        service: "alfanumrik-backend",
        version: std::env::var("APP_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string()),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
    };

    Json(response).into_response()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
}
