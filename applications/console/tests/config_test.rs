/// Console configuration tests
/// Loads real TOML files and environment overrides
use podplay_console::{ConsoleConfig, ConsoleError};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

// Environment overrides are process-wide
static SERIAL: Mutex<()> = Mutex::new(());

fn serial_guard() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("podplay.toml");
    fs::write(&path, contents).unwrap();
    path
}

/// Test that a partial file keeps defaults for everything it omits
#[test]
fn test_partial_file_keeps_defaults() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[player]
skip_forward_seconds = 45.0

[engine]
load_latency_ms = 10
"#,
    );

    let config = ConsoleConfig::load(Some(&path)).unwrap();
    config.validate().unwrap();

    assert_eq!(config.player.skip_forward_seconds, 45.0);
    assert_eq!(config.player.skip_back_seconds, 10.0);
    assert_eq!(config.player.poll_interval_ms, 50);
    assert_eq!(config.engine.load_latency_ms, 10);
    assert_eq!(config.engine.episode_duration_seconds, 1800.0);
}

/// Test that an invalid poll interval is caught by validation
#[test]
fn test_zero_poll_interval_fails_validation() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[player]\npoll_interval_ms = 0\n");

    let config = ConsoleConfig::load(Some(&path)).unwrap();
    assert!(matches!(config.validate(), Err(ConsoleError::Config(_))));
}

/// Test that a missing explicit file is a configuration error
#[test]
fn test_missing_explicit_file_is_error() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ConsoleConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConsoleError::Config(_)));
}

/// Test that malformed values are reported, not defaulted
#[test]
fn test_malformed_value_is_error() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[engine]\nepisode_duration_seconds = \"long\"\n");

    assert!(ConsoleConfig::load(Some(&path)).is_err());
}

/// Test that environment variables override the file
#[test]
fn test_environment_overrides_file() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[player]\nskip_back_seconds = 5.0\n");

    std::env::set_var("PODPLAY_PLAYER__SKIP_BACK_SECONDS", "15");
    let loaded = ConsoleConfig::load(Some(&path));
    std::env::remove_var("PODPLAY_PLAYER__SKIP_BACK_SECONDS");

    let config = loaded.unwrap();
    assert_eq!(config.player.skip_back_seconds, 15.0);
}

/// Test that printed TOML loads back to the same configuration
#[test]
fn test_printed_config_loads_back() {
    let _guard = serial_guard();
    let dir = TempDir::new().unwrap();
    let mut written = ConsoleConfig::default();
    written.engine.episode_duration_seconds = 3600.0;
    written.player.failure_message = "Playback failed".to_string();

    let path = write_config(&dir, &written.to_toml().unwrap());
    let loaded = ConsoleConfig::load(Some(&path)).unwrap();

    assert_eq!(loaded.player, written.player);
    assert_eq!(loaded.engine, written.engine);
}
