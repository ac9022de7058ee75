mod settings;

use std::path::Path;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{HubSettings, LogSettings, ServerSettings, Settings};

/// Prefix for environment overrides, e.g. `CONNHUB_HUB__TICK_INTERVAL_MS`.
pub const ENV_PREFIX: &str = "CONNHUB";

/// Loads the configuration from `config/default` and environment variables.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Loads the configuration from the given file (any extension the `config`
/// crate understands, the file being optional) and the environment, then
/// merges the result over the defaults.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(merge(partial, Settings::default()))
}

fn merge(partial: PartialSettings, default: Settings) -> Settings {
    let server = partial.server;
    let hub = partial.hub;
    let log = partial.log;

    Settings {
        server: ServerSettings {
            host: server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        hub: HubSettings {
            tick_interval_ms: hub
                .as_ref()
                .and_then(|h| h.tick_interval_ms)
                .unwrap_or(default.hub.tick_interval_ms),
            send_timeout_ms: hub
                .as_ref()
                .and_then(|h| h.send_timeout_ms)
                .unwrap_or(default.hub.send_timeout_ms),
            broadcast_queue_capacity: hub
                .as_ref()
                .and_then(|h| h.broadcast_queue_capacity)
                .unwrap_or(default.hub.broadcast_queue_capacity),
            client_buffer: hub
                .as_ref()
                .and_then(|h| h.client_buffer)
                .unwrap_or(default.hub.client_buffer),
        },
        log: LogSettings {
            level: log
                .and_then(|l| l.level)
                .unwrap_or(default.log.level),
        },
    }
}

#[cfg(test)]
mod tests;
