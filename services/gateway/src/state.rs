use redap_telemetry::{AlertLog, ConnectionState, DriverStats, SensorQuery};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

pub struct AppState {
    pub query: SensorQuery,
    pub alerts: Arc<AlertLog>,
    pub broker_state: watch::Receiver<ConnectionState>,
    pub driver_stats: Arc<DriverStats>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        query: SensorQuery,
        alerts: Arc<AlertLog>,
        broker_state: watch::Receiver<ConnectionState>,
        driver_stats: Arc<DriverStats>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        AppState {
            query,
            alerts,
            broker_state,
            driver_stats,
            static_dir: static_dir.into(),
        }
    }

    pub fn broker_state(&self) -> ConnectionState {
        *self.broker_state.borrow()
    }
}
