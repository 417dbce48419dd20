// Integration tests for settings loading and client construction from settings
use std::sync::Arc;

use clockin::ceremony::{CeremonyClient, LatestStatus};
use clockin::location::UnsupportedLocationProvider;
use clockin::settings::ClientSettings;
use clockin::testing::{CallLog, MockBroker};
use serial_test::serial;

fn clean_env_vars() {
    for var in [
        "CLOCKIN_CONFIG_DIR",
        "CLOCKIN_SERVER_URL",
        "CLOCKIN_REQUEST_TIMEOUT_SECONDS",
        "CLOCKIN_GEOFENCE_ENABLED",
        "CLOCKIN_ALLOWED_DISTANCE_METERS",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_from_config_dir() {
    clean_env_vars();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Settings.toml"),
        r#"
[server]
url = "https://attendance.example.com/api"
request_timeout_seconds = 30

[geofence]
enabled = true
allowed_distance_meters = 250.0

[logging]
level = "debug"
"#,
    )
    .unwrap();
    std::env::set_var("CLOCKIN_CONFIG_DIR", dir.path());

    let settings = ClientSettings::load().expect("settings should load");

    assert_eq!(settings.server.url, "https://attendance.example.com/api");
    assert_eq!(settings.server.request_timeout_seconds, Some(30));
    assert!(settings.geofence.enabled);
    assert!((settings.geofence.allowed_distance_meters - 250.0).abs() < f64::EPSILON);
    // unset values fall back to defaults
    assert_eq!(settings.server.login_start_path, "/login/start");

    clean_env_vars();
}

#[test]
#[serial]
fn test_env_overrides_config_file() {
    clean_env_vars();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Settings.toml"),
        "[server]\nurl = \"https://from-file.example.com\"\n",
    )
    .unwrap();
    std::env::set_var("CLOCKIN_CONFIG_DIR", dir.path());
    std::env::set_var("CLOCKIN_SERVER_URL", "https://from-env.example.com");
    std::env::set_var("CLOCKIN_REQUEST_TIMEOUT_SECONDS", "0");

    let settings = ClientSettings::load().unwrap();

    assert_eq!(settings.server.url, "https://from-env.example.com");
    assert_eq!(settings.server.request_timeout_seconds, None);

    clean_env_vars();
}

#[test]
#[serial]
fn test_malformed_config_is_an_error() {
    clean_env_vars();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Settings.toml"), "[server\nurl = ").unwrap();
    std::env::set_var("CLOCKIN_CONFIG_DIR", dir.path());

    assert!(ClientSettings::load().is_err());

    clean_env_vars();
}

#[test]
#[serial]
fn test_invalid_url_rejected_on_load() {
    clean_env_vars();
    std::env::set_var("CLOCKIN_SERVER_URL", "attendance.example.com");

    let error = ClientSettings::load().unwrap_err();
    assert!(error.to_string().contains("invalid server url"));

    clean_env_vars();
}

#[tokio::test]
async fn test_client_from_settings_applies_geofence() {
    let mut settings = ClientSettings::default();
    settings.geofence.enabled = true;
    settings.geofence.office_latitude = 95.0;

    let log = CallLog::new();
    let result = CeremonyClient::from_settings(
        &settings,
        Arc::new(MockBroker::succeeding(log.clone())),
        Arc::new(UnsupportedLocationProvider),
        Arc::new(LatestStatus::new()),
    );
    assert!(result.is_err(), "invalid office coordinates must be refused");

    settings.geofence.office_latitude = 37.7749;
    let client = CeremonyClient::from_settings(
        &settings,
        Arc::new(MockBroker::succeeding(log.clone())),
        Arc::new(UnsupportedLocationProvider),
        Arc::new(LatestStatus::new()),
    )
    .unwrap();

    assert_eq!(
        client.login("alice").await.unwrap_err().status_message(),
        "Error: Geolocation is not supported by your browser"
    );
    assert!(log.calls().is_empty());
}
