use crate::mqtt_service::MqttService;
use crate::robot_agent::AgentHandle;
use std::sync::Arc;
use tracing::{error, info};

/// Start the MQTT service on its own task
pub fn start_mqtt_service(mqtt_service: Arc<MqttService>) {
    tokio::spawn(async move {
        mqtt_service.start().await;
    });
}

/// Block until ctrl-c, then tear everything down best-effort: unsubscribe,
/// disconnect, release the robot handle. Failures are logged, never raised.
pub async fn handle_shutdown(mqtt_service: Arc<MqttService>, agent: Arc<AgentHandle>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to handle termination signal: {:?}", e);
    }

    info!("Shutting down...");
    mqtt_service.stop().await;
    agent.release();
    info!("Teardown complete.");
}
