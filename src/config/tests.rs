use std::env;
use std::fs;

use serial_test::serial;
use tempfile::TempDir;

use super::load_config;
use super::settings::ConnectionConfig;

#[test]
fn default_config() {
    let config = ConnectionConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.username, None);
    assert_eq!(config.password, None);
    assert!(!config.use_tls);
    assert_eq!(config.connect_timeout_secs, 10);
}

#[test]
fn url_follows_tls_flag() {
    let mut config = ConnectionConfig::default();
    assert_eq!(config.url(), "ws://127.0.0.1:8080");
    config.use_tls = true;
    config.host = "broker.example".to_string();
    config.port = 443;
    assert_eq!(config.url(), "wss://broker.example:443");
}

#[test]
#[serial]
fn load_config_falls_back_to_defaults() {
    // Run from a directory without a config file and without CONNECTION_*
    // variables set.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    let loaded = temp_env::with_vars_unset(["CONNECTION_HOST", "CONNECTION_PORT"], || {
        load_config().expect("load_config failed")
    });
    assert_eq!(loaded.host, ConnectionConfig::default().host);
    assert_eq!(loaded.port, ConnectionConfig::default().port);

    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // Create a temporary directory and set it as current dir so load_config
    // will pick up config/default.toml from there.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [connection]
        host = "0.0.0.0"
        port = 9000
        username = "agent"
        use_tls = true
        connect_timeout_secs = 3
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let loaded = load_config().expect("load_config failed");
    assert_eq!(loaded.host, "0.0.0.0");
    assert_eq!(loaded.port, 9000);
    assert_eq!(loaded.username.as_deref(), Some("agent"));
    assert!(loaded.use_tls);
    assert_eq!(loaded.connect_timeout_secs, 3);
    // Unspecified fields keep their defaults.
    assert_eq!(loaded.password, None);

    env::set_current_dir(orig).expect("restore cwd");
}

#[test]
#[serial]
fn load_config_reads_environment() {
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    let loaded = temp_env::with_var("CONNECTION_HOST", Some("broker.internal"), || {
        load_config().expect("load_config failed")
    });
    assert_eq!(loaded.host, "broker.internal");

    env::set_current_dir(orig).expect("restore cwd");
}
