mod config;
mod dashboard;
mod dispatcher;
mod models;
mod motors;
mod mqtt_service;
mod rest_server;
mod robot_agent;
mod service_utils;

use crate::config::{Config, ConnectionParams};
use crate::dashboard::Dashboard;
use crate::dispatcher::CommandDispatcher;
use crate::mqtt_service::MqttService;
use crate::rest_server::run_rest_server;
use crate::robot_agent::{AgentHandle, LoopbackRobot};
use crate::service_utils::{handle_shutdown, start_mqtt_service};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Error loading configuration: {:?}", e);
            return;
        }
    };

    let params = ConnectionParams::resolve(&config);
    info!(
        "Resolved broker {} as client '{}', topic '{}'.",
        params.server_uri, params.client_id, params.topic
    );

    let dashboard = Dashboard::new();

    let agent = if config.simulation {
        info!("Simulation mode: robot service skipped, motor commands are logged only.");
        Arc::new(AgentHandle::simulated())
    } else {
        info!("Initializing robot service...");
        let (robot, events) = LoopbackRobot::spawn();
        Arc::new(AgentHandle::hardware(robot, events))
    };

    // The dashboard is reachable regardless of broker or robot state.
    let rest_task = tokio::spawn(run_rest_server(
        dashboard.clone(),
        agent.clone(),
        config.dashboard_port,
    ));

    // The robot service must be up before the broker connection is attempted.
    agent.wait_ready().await;
    agent.speak("Attempting MQTT connection");

    let dispatcher = CommandDispatcher::new(dashboard.clone(), agent.clone(), config.motor_speed);
    let mqtt_service = MqttService::new(
        params,
        config.mqtt_retry_interval_ms,
        dispatcher,
        dashboard.clone(),
        agent.clone(),
    );
    start_mqtt_service(mqtt_service.clone());

    handle_shutdown(mqtt_service, agent).await;

    rest_task.abort();
    info!("All services shut down successfully.");
}
