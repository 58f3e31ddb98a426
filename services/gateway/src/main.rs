use anyhow::Context;
use redap_core::{logging, Config};
use redap_telemetry::{AlertLog, LevelThresholds, SensorQuery, SubscriptionDriver, TelemetryStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};

mod app;
mod handlers;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    logging::init_with(&config.logging);

    let bind_addr = config.http_bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", bind_addr))?;

    let thresholds = LevelThresholds::from_config(&config.store);
    let store = Arc::new(TelemetryStore::with_max_history(config.store.max_history));
    let alerts = Arc::new(AlertLog::new(thresholds, config.store.max_alerts));
    let driver = SubscriptionDriver::new(config.broker.clone(), Arc::clone(&store))
        .with_alerts(Arc::clone(&alerts));
    let broker_state = driver.state();
    let driver_stats = driver.stats();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let driver_task = driver.spawn(shutdown_rx);

    let query = SensorQuery::new(store, thresholds);
    let state = Arc::new(AppState::new(
        query,
        alerts,
        broker_state,
        driver_stats,
        &config.http.static_dir,
    ));
    let app = app::build_router(state);

    info!(
        max_history = config.store.max_history,
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        "REDAP gateway listening on {}", bind_addr
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Shutting down subscription driver");
    let _ = shutdown_tx.send(true);
    if let Err(e) = driver_task.await {
        error!("Subscription driver task failed: {}", e);
    }

    served.context("HTTP server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
