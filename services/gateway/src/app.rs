use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tracing::debug;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/api/sensors", get(handlers::get_sensors))
        .route("/api/sensors/:sensor_id", get(handlers::get_sensor))
        .route("/api/status", get(handlers::get_status))
        .route("/api/alerts", get(handlers::get_alerts))
        .route("/api/export.csv", get(handlers::export_csv))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(middleware::from_fn(log_request)))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    debug!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "HTTP request"
    );
    response
}
