use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    pub socket: SocketConfig,
    /// Room transport is only registered when this section is present
    #[serde(default)]
    pub room: Option<RoomConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// How long completed sessions stay queryable
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
    /// Frame buffer between a transport and its chain
    pub channel_size: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
            sweep_interval_secs: 300,
            channel_size: 64,
        }
    }
}

impl SessionsConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Deserialize)]
pub struct SocketConfig {
    /// Base URL callers use to reach this service's websocket route
    pub public_base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RoomConfig {
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_room_expiry")]
    pub expiry_secs: u64,
    #[serde(default = "default_max_participants")]
    pub max_participants: u32,
}

fn default_room_expiry() -> u64 {
    3600
}

fn default_max_participants() -> u32 {
    2
}

impl RoomConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("VOICE_SESSIONS").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.http.bind, self.service.http.port)
    }
}
