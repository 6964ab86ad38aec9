use dotenvy::dotenv;
use std::env;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Config {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    /// Empty means "generate one at resolve time".
    pub mqtt_client_id: String,
    pub mqtt_topic: String,
    pub mqtt_retry_interval_ms: u64,

    /// Speed passed to every motor-control call.
    pub motor_speed: i32,
    /// Skip the robot service entirely and log actuations instead.
    pub simulation: bool,
    pub dashboard_port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is missing or invalid.")]
    MissingOrInvalid(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
}

impl Config {
    /// Validate timeout values and other critical configurations.
    fn validate(&self) -> Result<(), ConfigError> {
        const MIN_RETRY_MS: u64 = 100;
        const MAX_RETRY_MS: u64 = 1_000_000;

        if !(MIN_RETRY_MS..=MAX_RETRY_MS).contains(&self.mqtt_retry_interval_ms) {
            return Err(ConfigError::ParsingError(format!(
                "MQTT_RETRY_INTERVAL_MS must be between {} and {} ms",
                MIN_RETRY_MS, MAX_RETRY_MS
            )));
        }

        if !(1..=100).contains(&self.motor_speed) {
            return Err(ConfigError::ParsingError(
                "MOTOR_SPEED must be between 1 and 100".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load environment variables from .env file

        let config = Self {
            mqtt_host: require_non_empty("MQTT_HOST")?,
            mqtt_port: env::var("MQTT_PORT")
                .map_err(|_| ConfigError::MissingOrInvalid("MQTT_PORT".to_string()))?
                .parse::<u16>()
                .map_err(|_| ConfigError::ParsingError("MQTT_PORT must be a valid number".to_string()))?,
            mqtt_client_id: env::var("MQTT_CLIENT_ID").unwrap_or_default(), // Default to empty
            mqtt_topic: require_non_empty("MQTT_TOPIC")?,
            mqtt_retry_interval_ms: env::var("MQTT_RETRY_INTERVAL_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse::<u64>()
                .map_err(|_| ConfigError::ParsingError("MQTT_RETRY_INTERVAL_MS must be a valid number".to_string()))?,
            motor_speed: env::var("MOTOR_SPEED")
                .unwrap_or_else(|_| "45".to_string())
                .parse::<i32>()
                .map_err(|_| ConfigError::ParsingError("MOTOR_SPEED must be an integer".to_string()))?,
            simulation: env::var("ROBOT_SIMULATION")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            dashboard_port: env::var("DASHBOARD_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse::<u16>()
                .map_err(|_| ConfigError::ParsingError("DASHBOARD_PORT must be a valid number".to_string()))?,
        };

        config.validate()?;

        Ok(config)
    }
}

fn require_non_empty(key: &str) -> Result<String, ConfigError> {
    let value = env::var(key).map_err(|_| ConfigError::MissingOrInvalid(key.to_string()))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::MissingOrInvalid(key.to_string()));
    }
    Ok(value)
}

/// Resolved broker connection parameters. Built once from a validated
/// [`Config`], handed to the MQTT service by value, never mutated.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Bare host for the transport layer, scheme stripped.
    pub host: String,
    pub port: u16,
    /// Display form, always carrying a scheme.
    pub server_uri: String,
    pub client_id: String,
    pub topic: String,
}

impl ConnectionParams {
    pub fn resolve(config: &Config) -> Self {
        let client_id = if config.mqtt_client_id.trim().is_empty() {
            generate_client_id()
        } else {
            config.mqtt_client_id.trim().to_string()
        };

        let (scheme, host) = split_scheme(config.mqtt_host.trim());
        let server_uri = format!("{}{}:{}", scheme.unwrap_or("tcp://"), host, config.mqtt_port);

        Self {
            host: host.to_string(),
            port: config.mqtt_port,
            server_uri,
            client_id,
            topic: config.mqtt_topic.trim().to_string(),
        }
    }
}

fn generate_client_id() -> String {
    format!("motorflux-{}", Uuid::new_v4())
}

/// Split an explicit scheme off the host, if one is present.
fn split_scheme(host: &str) -> (Option<&'static str>, &str) {
    for scheme in ["tcp://", "wss://"] {
        if let Some(rest) = host.strip_prefix(scheme) {
            return (Some(scheme), rest);
        }
    }
    (None, host)
}
