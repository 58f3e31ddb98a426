//! MQTT subscription driver.
//!
//! Runs one explicit receive loop over the `rumqttc` event loop:
//! `Disconnected -> Connecting -> Connected -> (receive) -> Disconnected`.
//! Every inbound publish is decoded and appended to the store before the
//! next event is polled, so per-sensor arrival order is preserved and no
//! append is ever left half-done at shutdown.

use crate::alerts::AlertLog;
use crate::backoff::Backoff;
use crate::error::{ConnectionError, DecodeError, TelemetryError, TelemetryResult};
use crate::reading;
use crate::store::TelemetryStore;
use redap_core::BrokerConfig;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// How long a clean DISCONNECT may take to flush at shutdown.
const DISCONNECT_FLUSH: Duration = Duration::from_secs(1);

/// Broker connectivity as observed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Ingest counters, shared with health reporting.
#[derive(Debug, Default)]
pub struct DriverStats {
    messages_received: AtomicU64,
    messages_dropped: AtomicU64,
    reconnect_attempts: AtomicU64,
}

/// Point-in-time copy of [`DriverStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DriverCounters {
    pub messages_received: u64,
    pub messages_dropped: u64,
    pub reconnect_attempts: u64,
}

impl DriverStats {
    pub fn counters(&self) -> DriverCounters {
        DriverCounters {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
        }
    }
}

/// Long-lived subscriber feeding the telemetry store.
pub struct SubscriptionDriver {
    config: BrokerConfig,
    store: Arc<TelemetryStore>,
    alerts: Option<Arc<AlertLog>>,
    state_tx: watch::Sender<ConnectionState>,
    stats: Arc<DriverStats>,
}

impl SubscriptionDriver {
    pub fn new(config: BrokerConfig, store: Arc<TelemetryStore>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            store,
            alerts: None,
            state_tx,
            stats: Arc::new(DriverStats::default()),
        }
    }

    /// Feed every decoded reading through `alerts` before it is stored.
    pub fn with_alerts(mut self, alerts: Arc<AlertLog>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Receiver tracking connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn current_state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    pub fn stats(&self) -> Arc<DriverStats> {
        Arc::clone(&self.stats)
    }

    /// MQTT options for this driver, with a per-process client id suffix.
    pub fn mqtt_options(&self) -> MqttOptions {
        let suffix = Uuid::new_v4().simple().to_string();
        let client_id = format!("{}-{}", self.config.client_id, &suffix[..8]);
        let mut options = MqttOptions::new(client_id, self.config.host.clone(), self.config.port);
        options
            .set_keep_alive(Duration::from_secs(self.config.keep_alive_secs.max(5)))
            .set_clean_session(true);
        options
    }

    /// Run the driver on its own task until `shutdown` flips to `true`.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Receive loop. Returns once shutdown is signalled (or its sender dropped).
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let (client, mut eventloop) =
            AsyncClient::new(self.mqtt_options(), self.config.channel_capacity.max(1));
        let mut backoff = Backoff::new(
            Duration::from_millis(self.config.reconnect_initial_ms),
            Duration::from_millis(self.config.reconnect_max_ms),
        );

        info!(
            host = %self.config.host,
            port = self.config.port,
            topic = %self.config.topic,
            "Subscription driver starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            if self.current_state() == ConnectionState::Disconnected {
                self.set_state(ConnectionState::Connecting);
            }

            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = self.poll_once(&mut eventloop) => polled,
            };

            let outcome = match polled {
                Ok(event) => self.handle_event(&client, &mut backoff, event).await,
                Err(err) => Err(err.into()),
            };

            match outcome {
                Ok(()) => {}
                // Already counted and logged; only this message is lost.
                Err(TelemetryError::Decode(_)) => {}
                Err(TelemetryError::Connection(err)) => {
                    self.set_state(ConnectionState::Disconnected);
                    let delay = backoff.next_delay();
                    self.stats.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        error = %err,
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Broker connection unavailable, retrying"
                    );
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.close(&client, &mut eventloop).await;
    }

    /// Poll the next event; connection attempts are bounded by the connect timeout.
    async fn poll_once(&self, eventloop: &mut EventLoop) -> Result<Event, ConnectionError> {
        if self.current_state() == ConnectionState::Connected {
            return Ok(eventloop.poll().await?);
        }

        let timeout_ms = self.config.connect_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), eventloop.poll()).await {
            Ok(polled) => Ok(polled?),
            Err(_) => Err(ConnectionError::Timeout(timeout_ms)),
        }
    }

    /// Apply one event from the MQTT event loop.
    ///
    /// Decode failures come back as `TelemetryError::Decode` with the store
    /// untouched; connection-level failures as `TelemetryError::Connection`.
    pub async fn handle_event(
        &self,
        client: &AsyncClient,
        backoff: &mut Backoff,
        event: Event,
    ) -> TelemetryResult<()> {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                self.set_state(ConnectionState::Connected);
                backoff.reset();
                // Never await the request channel here: this task is the one
                // draining it through the event loop.
                client
                    .try_subscribe(self.config.topic.clone(), QoS::AtMostOnce)
                    .map_err(ConnectionError::from)?;
                info!(topic = %self.config.topic, "Subscribed to sensor topic");
                Ok(())
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.ingest(&publish.topic, &publish.payload)?;
                Ok(())
            }
            Event::Incoming(Packet::SubAck(suback)) => {
                if suback
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    error!(topic = %self.config.topic, "Broker rejected subscription");
                }
                Ok(())
            }
            other => {
                trace!(event = ?other, "MQTT event");
                Ok(())
            }
        }
    }

    /// Decode one payload and append it to the store.
    pub fn ingest(&self, topic: &str, payload: &[u8]) -> Result<(), DecodeError> {
        self.stats.messages_received.fetch_add(1, Ordering::Relaxed);
        match reading::decode(payload) {
            Ok(reading) => {
                debug!(topic, sensor_id = %reading.sensor_id(), "Sensor message received");
                if let Some(alerts) = &self.alerts {
                    alerts.observe(&reading);
                }
                self.store.append(reading);
                Ok(())
            }
            Err(err) => {
                self.stats.messages_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(topic, error = %err, "Dropping undecodable sensor message");
                Err(err)
            }
        }
    }

    async fn close(&self, client: &AsyncClient, eventloop: &mut EventLoop) {
        if self.current_state() == ConnectionState::Connected && client.disconnect().await.is_ok() {
            let flush = async {
                loop {
                    match eventloop.poll().await {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
            };
            if tokio::time::timeout(DISCONNECT_FLUSH, flush).await.is_err() {
                warn!("Timed out flushing DISCONNECT to broker");
            }
        }
        self.set_state(ConnectionState::Disconnected);
        info!("Subscription driver stopped");
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            info!(state = ?next, "Broker connection state changed");
        }
    }
}
