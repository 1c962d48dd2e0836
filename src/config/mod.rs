use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_retry_attempts: u32,
    pub jwt_secret: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    pub cache_ttl_secs: u64,
    #[serde(default = "default_opening_hours_timezone")]
    pub opening_hours_timezone: String,
    #[serde(default)]
    pub telemetry_enabled: bool,
    #[serde(default = "default_telemetry_service_name")]
    pub telemetry_service_name: String,
    #[serde(default = "default_telemetry_service_version")]
    pub telemetry_service_version: String,
    #[serde(default = "default_telemetry_environment")]
    pub telemetry_environment: String,
    #[serde(default = "default_telemetry_otlp_endpoint")]
    pub telemetry_otlp_endpoint: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_opening_hours_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_telemetry_service_name() -> String {
    "locations-service".to_string()
}

fn default_telemetry_service_version() -> String {
    "1.0.0".to_string()
}

fn default_telemetry_environment() -> String {
    "production".to_string()
}

fn default_telemetry_otlp_endpoint() -> String {
    "http://otel-collector.observability.svc.cluster.local:4317".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    fn from_source(source: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_max_connections", 5)?
            .set_default("database_retry_attempts", 3)?
            .set_default("cache_ttl_secs", 300)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Zone in which opening-hours strings are interpreted.
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.opening_hours_timezone
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("unknown timezone: {}", self.opening_hours_timezone))
    }
}
