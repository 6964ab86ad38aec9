use crate::config::ConnectionParams;
use crate::dashboard::{ConnectionStatus, Dashboard};
use crate::dispatcher::CommandDispatcher;
use crate::robot_agent::AgentHandle;
use log::{debug, error, info, warn};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Debug)]
enum ClientState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// Owns the broker connection: an outer retry loop with capped backoff, a
/// clean non-persistent session, and a QoS 0 subscription that is renewed on
/// every ConnAck so reconnects pick the topic back up.
pub struct MqttService {
    client_state: Mutex<ClientState>,
    client: Mutex<Option<AsyncClient>>,
    dispatcher: CommandDispatcher,
    dashboard: Arc<Dashboard>,
    agent: Arc<AgentHandle>,
    params: ConnectionParams,
    retry_interval_ms: u64,
    shutdown: AtomicBool,
    announced: AtomicBool,
}

impl MqttService {
    pub fn new(
        params: ConnectionParams,
        retry_interval_ms: u64,
        dispatcher: CommandDispatcher,
        dashboard: Arc<Dashboard>,
        agent: Arc<AgentHandle>,
    ) -> Arc<Self> {
        Arc::new(Self {
            client_state: Mutex::new(ClientState::Disconnected),
            client: Mutex::new(None),
            dispatcher,
            dashboard,
            agent,
            params,
            retry_interval_ms,
            shutdown: AtomicBool::new(false),
            announced: AtomicBool::new(false),
        })
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            "Starting MQTT service for {} as '{}'...",
            self.params.server_uri, self.params.client_id
        );

        let initial_retry_interval = Duration::from_millis(self.retry_interval_ms);
        let mut retry_interval = initial_retry_interval;

        'connection: loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            debug!(
                "Configuring MQTT broker at {}:{}...",
                self.params.host, self.params.port
            );

            let mut mqtt_options =
                MqttOptions::new(&self.params.client_id, &self.params.host, self.params.port);
            mqtt_options.set_keep_alive(Duration::from_secs(10));
            mqtt_options.set_clean_session(true);

            let (client, mut eventloop) = AsyncClient::new(mqtt_options, 10);

            {
                let mut client_lock = self.client.lock().await;
                *client_lock = Some(client.clone());
            }

            {
                let mut client_state = self.client_state.lock().await;
                *client_state = ClientState::Connecting;
            }
            self.dashboard.set_connection(ConnectionStatus::Connecting).await;

            loop {
                match eventloop.poll().await {
                    Ok(event) => {
                        self.handle_event(event).await;
                    }
                    Err(e) => {
                        if self.shutdown.load(Ordering::SeqCst) {
                            debug!("Event loop closed after shutdown request.");
                            break 'connection;
                        }
                        error!("Error in MQTT event loop: {:?}", e);
                        if !self.announced.swap(true, Ordering::SeqCst) {
                            self.agent.speak("MQTT connection failed");
                        }
                        {
                            let mut client_state = self.client_state.lock().await;
                            // A drop after a live session restarts the backoff ladder.
                            if matches!(*client_state, ClientState::Connected) {
                                retry_interval = initial_retry_interval;
                            }
                            *client_state = ClientState::Error(e.to_string());
                        }
                        self.dashboard
                            .set_connection(ConnectionStatus::Lost(e.to_string()))
                            .await;
                        break;
                    }
                }
            }

            warn!(
                "Lost connection to MQTT broker. Retrying in {:?}...",
                retry_interval
            );
            sleep(retry_interval).await;
            retry_interval = (retry_interval * 2).min(Duration::from_secs(60));
        }

        info!("MQTT service stopped.");
    }

    async fn handle_event(&self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                let reconnect = {
                    let mut client_state = self.client_state.lock().await;
                    let was_connected = matches!(*client_state, ClientState::Connected);
                    *client_state = ClientState::Connected;
                    was_connected
                };
                if reconnect {
                    info!("Reconnected to MQTT broker, renewing subscription...");
                } else {
                    info!("Connected to MQTT broker, subscribing...");
                }
                if !self.announced.swap(true, Ordering::SeqCst) {
                    self.agent.speak("MQTT connection established");
                }
                self.dashboard.set_connection(ConnectionStatus::Connected).await;
                self.dashboard.push_log("connected, subscribing...").await;
                self.subscribe().await;
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.dispatcher
                    .handle_payload(&publish.topic, &publish.payload)
                    .await;
            }
            Event::Incoming(Packet::SubAck(_)) => {
                debug!("Subscription to '{}' acknowledged.", self.params.topic);
            }
            Event::Outgoing(_) => {
                debug!("Outgoing event.");
            }
            _ => {
                debug!("Unhandled event: {:?}", event);
            }
        }
    }

    /// At-most-once delivery is enough here: commands are ephemeral and a
    /// fresher one supersedes anything a redelivery could carry.
    async fn subscribe(&self) {
        let client = self.client.lock().await;
        if let Some(client) = client.as_ref() {
            match client.subscribe(&self.params.topic, QoS::AtMostOnce).await {
                Ok(_) => {
                    info!("Successfully subscribed to topic '{}'.", self.params.topic);
                    self.dashboard
                        .push_log(format!("subscribed to '{}'", self.params.topic))
                        .await;
                }
                Err(e) => {
                    error!("Failed to subscribe to topic '{}': {}", self.params.topic, e);
                    let mut client_state = self.client_state.lock().await;
                    *client_state = ClientState::Error(e.to_string());
                }
            }
        }
    }

    /// Best-effort teardown: unsubscribe and disconnect, errors logged and
    /// swallowed. Never blocks shutdown.
    pub async fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);

        let client = {
            let mut client_lock = self.client.lock().await;
            client_lock.take()
        };
        if let Some(client) = client {
            if let Err(e) = client.unsubscribe(&self.params.topic).await {
                warn!("Unsubscribe failed during shutdown: {}", e);
            }
            if let Err(e) = client.disconnect().await {
                warn!("Disconnect failed during shutdown: {}", e);
            }
        }

        {
            let mut client_state = self.client_state.lock().await;
            *client_state = ClientState::Disconnected;
        }
        self.dashboard.set_connection(ConnectionStatus::Disconnected).await;
    }
}
