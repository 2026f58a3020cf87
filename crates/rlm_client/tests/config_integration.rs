//! Integration tests for config load/save with real files in a temp dir.

use rlm_client::{config, Config};
use predicates::prelude::*;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
api:
  api_key: "test-key"
  model: "gemini-3-flash-preview"
server:
  port: 8765
  directories:
    - "/path/to/docs"
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.api.api_key.as_deref(), Some("test-key"));
    assert_eq!(cfg.api.model.as_deref(), Some("gemini-3-flash-preview"));
    assert_eq!(cfg.server.port, Some(8765));
    assert_eq!(cfg.server.directories, vec!["/path/to/docs"]);
}

#[test]
fn missing_sections_default_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "api:\n  api_key: k\n").unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(cfg.api.api_key.as_deref(), Some("k"));
    assert_eq!(cfg.server.port, None);
    assert!(cfg.server.directories.is_empty());
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("rlm-explorer");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut config = Config::default();
    config.api.api_key = Some("key".into());
    config.api.model = Some("gemini-2.5-flash".into());
    config.server.port = Some(8766);
    config.server.directories = vec!["/docs".into()];

    config::save(&config_path, &config).expect("save should succeed");
    let pred = predicates::path::exists();
    assert!(
        pred.eval(&config_path),
        "config file should exist after save"
    );
    assert!(config_dir.exists(), "config directory should be created");
}

#[test]
fn round_trip_preserves_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    let yaml = r#"
api:
  api_key: "secret"
  model: "gemini-3-flash-preview"
server:
  port: 8765
  directories:
    - "/a"
    - "/b"
"#;
    std::fs::write(&config_path, yaml).unwrap();

    let loaded = config::load(&config_path).expect("load should succeed");
    config::save(&config_path, &loaded).expect("save should succeed");

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(
        predicates::str::contains("api:").eval(&contents),
        "saved file should contain api section"
    );
    assert!(
        predicates::str::contains("server:").eval(&contents),
        "saved file should contain server section"
    );
    assert!(
        predicates::str::contains("directories").eval(&contents),
        "saved file should contain directories"
    );

    let reloaded = config::load(&config_path).expect("reload should succeed");
    assert_eq!(reloaded.api.api_key, loaded.api.api_key);
    assert_eq!(reloaded.api.model, loaded.api.model);
    assert_eq!(reloaded.server.port, loaded.server.port);
    assert_eq!(reloaded.server.directories, loaded.server.directories);
}

/// Config path resolves to `~/.rlm-explorer/config.yaml` using the current
/// platform's home dir. We override the env var to a temp dir to verify.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    // Override HOME (Unix) / USERPROFILE (Windows) temporarily.
    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    // Restore.
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    let expected = dir.path().join(".rlm-explorer").join("config.yaml");
    assert_eq!(path, expected);
}

#[test]
fn load_missing_file_returns_io_error() {
    let result = config::load(std::path::Path::new(
        "/tmp/does-not-exist-ever/config.yaml",
    ));
    let err = result.expect_err("load should fail");
    assert!(matches!(err, config::ConfigError::Io(_)));
}
