//! Integration tests for loading settings from disk

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_test::{assert_err, assert_ok};
use unitsync::config::{ConfigError, Settings};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

fn unique_test_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("unitsync-test-{}-{}", std::process::id(), id));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_config(dir: &PathBuf, content: &str) -> PathBuf {
    let path = dir.join("unitsync.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_config_file() {
    let dir = unique_test_dir();
    let path = write_config(&dir, r#"
services = ["nginx", "getty@tty1.service"]
scan_interval = 5
"#);

    let settings = assert_ok!(Settings::load(&path));
    assert!(settings.is_selected("nginx.service"));
    assert!(settings.is_selected("getty@tty1.service"));
    assert_eq!(settings.scan_interval, 5);
}

#[test]
fn test_missing_file() {
    let dir = unique_test_dir();
    let path = dir.join("absent.toml");

    let err = assert_err!(Settings::load(&path));
    assert!(matches!(err, ConfigError::Io { .. }));

    let settings = assert_ok!(Settings::load_or_default(&path));
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_invalid_file() {
    let dir = unique_test_dir();
    let path = write_config(&dir, "services = \"nginx\"");
    assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));

    let path = write_config(&dir, "scan_interval = 0");
    assert!(matches!(Settings::load(&path), Err(ConfigError::InvalidInterval)));
}
