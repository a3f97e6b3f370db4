use claude_pty_run::config::{Config, ConfigError, Defaults};
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).expect("Failed to write config");
    path
}

/// Test that Config::default() produces the expected values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.defaults.timeout_seconds, 600);
    assert!(config.defaults.strip_ansi);
    assert_eq!(config.defaults.max_output_bytes, 16 * 1024 * 1024);
    assert_eq!(config.defaults.kill_grace_ms, 2000);
    assert!(config.defaults.claude_bin.is_none());
}

#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("claude-pty-run/config.toml"));
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "[defaults]\ntimeout_seconds = 30\nclaude_bin = \"/opt/claude\"\n");
    let config = Config::load_from(&path).unwrap();

    assert_eq!(
        config.defaults,
        Defaults {
            timeout_seconds: 30,
            claude_bin: Some("/opt/claude".to_string()),
            ..Defaults::default()
        }
    );
    assert_eq!(config.timeout().unwrap().get(), 30);
}

#[test]
fn test_empty_file_is_valid() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "");
    assert_eq!(Config::load_from(&path).unwrap(), Config::default());
}

#[test]
fn test_zero_timeout_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "[defaults]\ntimeout_seconds = 0\n");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "[defaults\nstrip_ansi = ");
    let err = Config::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_wrong_type_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "[defaults]\nstrip_ansi = \"yes\"\n");
    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::ParseError { .. })
    ));
}
