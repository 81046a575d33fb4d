use std::fs;
use tempfile::TempDir;
use voice_sessions::config::Config;

fn write_config(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("voice-sessions.toml");
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

const MINIMAL: &str = r#"
[service]
name = "voice-sessions"

[service.http]
bind = "0.0.0.0"
port = 9090

[socket]
public_base_url = "wss://calls.example.com"
"#;

#[test]
fn test_minimal_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::load(&write_config(&dir, MINIMAL)).unwrap();

    assert_eq!(cfg.bind_address(), "0.0.0.0:9090");
    assert_eq!(cfg.socket.public_base_url, "wss://calls.example.com");
    assert_eq!(cfg.sessions.retention_secs, 3600);
    assert_eq!(cfg.sessions.sweep_interval_secs, 300);
    assert_eq!(cfg.sessions.channel_size, 64);
    assert!(cfg.room.is_none());
}

#[test]
fn test_room_section_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let body = format!(
        "{}\n[room]\napi_url = \"https://rooms.example.com/v1\"\napi_key = \"secret\"\n",
        MINIMAL
    );
    let cfg = Config::load(&write_config(&dir, &body)).unwrap();

    let room = cfg.room.expect("room section");
    assert_eq!(room.api_url, "https://rooms.example.com/v1");
    assert_eq!(room.api_key, "secret");
    assert_eq!(room.expiry_secs, 3600);
    assert_eq!(room.max_participants, 2);
}

#[test]
fn test_session_overrides() {
    let dir = TempDir::new().unwrap();
    let body = format!(
        "{}\n[sessions]\nretention_secs = 60\nsweep_interval_secs = 0\n",
        MINIMAL
    );
    let cfg = Config::load(&write_config(&dir, &body)).unwrap();

    assert_eq!(cfg.sessions.retention().as_secs(), 60);
    // A zero interval would spin the sweeper
    assert_eq!(cfg.sessions.sweep_interval().as_secs(), 1);
    assert_eq!(cfg.sessions.channel_size, 64);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(Config::load(&path.to_string_lossy()).is_err());
}
