use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
};
use chrono::Utc;
use redap_telemetry::{AlertEvent, ConnectionState, HistorySnapshot, StatusOverview};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::state::AppState;

pub async fn get_sensors(
    State(state): State<Arc<AppState>>,
) -> Json<BTreeMap<String, HistorySnapshot>> {
    Json(state.query.all_sensors())
}

/// Unknown sensors answer `{}` with 200, not 404.
pub async fn get_sensor(
    State(state): State<Arc<AppState>>,
    Path(sensor_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.query.sensor(&sensor_id) {
        Some(history) => serde_json::to_value(history).map(Json).map_err(|e| {
            error!("Failed to serialize history for {}: {}", sensor_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }),
        None => {
            debug!(sensor_id = %sensor_id, "Query for unknown sensor");
            Ok(Json(json!({})))
        }
    }
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusOverview> {
    Json(state.query.status_overview())
}

/// Recent risk/critical transitions, newest first.
pub async fn get_alerts(State(state): State<Arc<AppState>>) -> Json<Vec<AlertEvent>> {
    Json(state.alerts.recent())
}

pub async fn export_csv(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sensor_history.csv\"",
            ),
        ],
        state.query.export_csv(),
    )
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let broker = state.broker_state();
    let status = if broker == ConnectionState::Connected {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": "redap-gateway",
        "broker": broker,
        "sensors": state.query.sensor_count(),
        "ingest": state.driver_stats.counters(),
        "timestamp": Utc::now().to_rfc3339()
    }))
}

pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, StatusCode> {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Ok(Html(body)),
        Err(e) => {
            debug!("Landing page {} unavailable: {}", path.display(), e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}
