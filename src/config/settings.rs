use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the hub and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub hub: HubSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the WebSocket listener binds to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the hub.
///
/// Controls the housekeeping cadence, the per-send timeout and the queue
/// sizes that define backpressure.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HubSettings {
    pub tick_interval_ms: u64,
    pub send_timeout_ms: u64,
    pub broadcast_queue_capacity: usize,
    pub client_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

impl HubSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms.max(1))
    }

    /// Capacity of the broadcast queue. tokio channels reject a zero capacity.
    pub fn queue_capacity(&self) -> usize {
        self.broadcast_queue_capacity.max(1)
    }

    /// Capacity of each connection's outbox.
    pub fn client_capacity(&self) -> usize {
        self.client_buffer.max(1)
    }
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub hub: Option<PartialHubSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialHubSettings {
    pub tick_interval_ms: Option<u64>,
    pub send_timeout_ms: Option<u64>,
    pub broadcast_queue_capacity: Option<usize>,
    pub client_buffer: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            send_timeout_ms: 5000,
            broadcast_queue_capacity: 1024,
            client_buffer: 64,
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            hub: HubSettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}
