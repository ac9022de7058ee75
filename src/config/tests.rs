use super::settings::Settings;
use super::{HubSettings, load_config_from};
use serial_test::serial;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.hub.tick_interval_ms, 1000);
    assert_eq!(settings.hub.send_timeout_ms, 5000);
    assert_eq!(settings.hub.broadcast_queue_capacity, 1024);
    assert_eq!(settings.hub.client_buffer, 64);
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_zero_values_are_clamped() {
    let hub = HubSettings {
        tick_interval_ms: 0,
        send_timeout_ms: 0,
        broadcast_queue_capacity: 0,
        client_buffer: 0,
    };
    assert_eq!(hub.tick_interval(), Duration::from_millis(1));
    assert_eq!(hub.send_timeout(), Duration::from_millis(1));
    assert_eq!(hub.queue_capacity(), 1);
    assert_eq!(hub.client_capacity(), 1);
}

#[test]
#[serial]
fn test_missing_file_yields_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let cfg = load_config_from(tmp.path().join("absent")).expect("load_config failed");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.hub, HubSettings::default());
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("default.toml");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [hub]
        tick_interval_ms = 250
        broadcast_queue_capacity = 16
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config_from(&path).expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.hub.tick_interval_ms, 250);
    assert_eq!(cfg.hub.broadcast_queue_capacity, 16);
    // untouched keys keep their defaults
    assert_eq!(cfg.hub.send_timeout_ms, 5000);
    assert_eq!(cfg.hub.client_buffer, 64);
    assert_eq!(cfg.log.level, "info");
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("default.toml");
    fs::write(&path, "[hub]\nsend_timeout_ms = 100\n").expect("write config file");

    temp_env::with_vars(
        [
            ("CONNHUB_HUB__SEND_TIMEOUT_MS", Some("750")),
            ("CONNHUB_SERVER__PORT", Some("9100")),
            ("CONNHUB_LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config_from(&path).expect("load_config failed");
            assert_eq!(cfg.hub.send_timeout_ms, 750);
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.log.level, "debug");
        },
    );
}
