//! Unit tests for configuration loading
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that touch ROLLCALL_* variables are marked #[serial].

use rollcall_common::config::{
    load_config, load_toml_config, GatewayKind, TomlConfig, ENV_ADMIN_NAME, ENV_DATABASE_PATH,
    ENV_OPERATOR_ADDRESS,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(ENV_DATABASE_PATH);
    env::remove_var(ENV_OPERATOR_ADDRESS);
    env::remove_var(ENV_ADMIN_NAME);
}

#[test]
fn test_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.engine.region_code, "+1");
    assert!(config.engine.operator_address.is_none());
    assert_eq!(config.gateway.kind, GatewayKind::Log);
    assert_eq!(config.schedule.hour, 18);
    assert_eq!(config.schedule.stop_day, 5);
    assert!(config.schedule.enforce_window);
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = TomlConfig::from_toml_str("").unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_file() {
    let config = TomlConfig::from_toml_str(
        r#"
        database_path = "/var/lib/rollcall/rollcall.db"

        [engine]
        region_code = "+52"
        admin_name = "Rosa Vidal"
        operator_address = "5559990000"

        [gateway]
        kind = "twilio"
        account_sid = "AC123"
        from_address = "+15550000000"

        [schedule]
        hour = 7
        stop_day = 3
        enforce_window = false

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.database_path(), PathBuf::from("/var/lib/rollcall/rollcall.db"));
    assert_eq!(config.engine.region_code, "+52");
    assert_eq!(config.engine.operator_address.as_deref(), Some("5559990000"));
    assert_eq!(config.gateway.kind, GatewayKind::Twilio);
    assert_eq!(config.gateway.base_url, "https://api.twilio.com");
    assert_eq!(config.schedule.hour, 7);
    assert!(!config.schedule.enforce_window);
    assert_eq!(config.logging.level, "debug");
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_config_error() {
    let err = TomlConfig::from_toml_str("schedule = [").unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = TomlConfig::default();
    config.schedule.hour = 24;
    assert!(config.validate().is_err());

    let mut config = TomlConfig::default();
    config.schedule.stop_day = 0;
    assert!(config.validate().is_err());

    let mut config = TomlConfig::default();
    config.engine.region_code = "1".to_string();
    assert!(config.validate().is_err());

    let mut config = TomlConfig::default();
    config.gateway.kind = GatewayKind::Twilio;
    assert!(config.validate().is_err(), "twilio needs account_sid and from_address");
}

#[test]
#[serial]
fn test_explicit_missing_file_is_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    assert!(load_config(Some(&missing)).is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rollcall.toml");
    std::fs::write(
        &path,
        "database_path = \"/from/file.db\"\n[engine]\nadmin_name = \"File Admin\"\n",
    )
    .unwrap();

    env::set_var(ENV_DATABASE_PATH, "/from/env.db");
    env::set_var(ENV_ADMIN_NAME, "Env Admin");
    env::set_var(ENV_OPERATOR_ADDRESS, "  ");

    let config = load_config(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.database_path(), PathBuf::from("/from/env.db"));
    assert_eq!(config.engine.admin_name, "Env Admin");
    assert!(config.engine.operator_address.is_none(), "blank env value is ignored");
}

#[test]
#[serial]
fn test_load_toml_config_reads_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rollcall.toml");
    std::fs::write(&path, "[schedule]\nhour = 6\n").unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.schedule.hour, 6);
    assert_eq!(config.schedule.stop_day, 5);
}
