//! Integration tests for client configuration
//!
//! These tests verify:
//! - Loading configuration from an explicit TOML file
//! - `WSMAN_CONFIG` lookup and environment variable overrides
//! - Mapping configuration onto request options and a connected client

use secrecy::ExposeSecret;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{tempdir, NamedTempFile};
use wsman::config::ClientConfig;

const ENV_VARS: [&str; 7] = [
    "WSMAN_CONFIG",
    "WSMAN_HOST",
    "WSMAN_PORT",
    "WSMAN_SCHEME",
    "WSMAN_USER",
    "WSMAN_PASSWORD",
    "WSMAN_TIMEOUT",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SAMPLE: &str = r#"
[connection]
scheme = "https"
host = "bmc.example.com"
port = 5986
path = "/wsman-anon"

[auth]
username = "admin"
password = "hunter2"

[tls]
verify_peer = false

[defaults]
timeout = 60000
cim_namespace = "root/cimv2"
max_envelope_size = 512000
"#;

// ============================================================================
// Loading
// ============================================================================

#[test]
#[serial]
fn test_load_explicit_file() {
    clear_env();
    let file = write_config(SAMPLE);
    let path = file.path().to_path_buf();

    let config = ClientConfig::load(Some(&path)).unwrap();
    assert_eq!(config.connection.scheme.as_deref(), Some("https"));
    assert_eq!(config.connection.host.as_deref(), Some("bmc.example.com"));
    assert_eq!(config.connection.port, 5986);
    assert_eq!(config.auth.username.as_deref(), Some("admin"));
    assert_eq!(
        config.auth.password.as_ref().map(|p| p.expose_secret()),
        Some("hunter2")
    );
    assert_eq!(config.defaults.max_envelope_size, Some(512_000));
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = ClientConfig::load(Some(&path)).unwrap();
    assert!(config.connection.host.is_none());
    assert_eq!(config.defaults.timeout, 0);
}

#[test]
#[serial]
fn test_invalid_file_is_an_error() {
    clear_env();
    let file = write_config("[connection\nhost = ");
    let path = file.path().to_path_buf();

    let err = ClientConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
#[serial]
fn test_wsman_config_env_var() {
    clear_env();
    let file = write_config("[connection]\nhost = \"from-env-file\"\n");
    std::env::set_var("WSMAN_CONFIG", file.path());

    let config = ClientConfig::load(None).unwrap();
    assert_eq!(config.connection.host.as_deref(), Some("from-env-file"));
    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let file = write_config(SAMPLE);
    let path: PathBuf = file.path().to_path_buf();
    std::env::set_var("WSMAN_HOST", "override.example.com");
    std::env::set_var("WSMAN_PORT", "5985");
    std::env::set_var("WSMAN_SCHEME", "http");
    std::env::set_var("WSMAN_USER", "operator");
    std::env::set_var("WSMAN_PASSWORD", "s3cret");
    std::env::set_var("WSMAN_TIMEOUT", "1500");

    let config = ClientConfig::load(Some(&path)).unwrap();
    assert_eq!(config.connection.host.as_deref(), Some("override.example.com"));
    assert_eq!(config.connection.port, 5985);
    assert_eq!(config.connection.scheme.as_deref(), Some("http"));
    assert_eq!(config.auth.username.as_deref(), Some("operator"));
    assert_eq!(
        config.auth.password.as_ref().map(|p| p.expose_secret()),
        Some("s3cret")
    );
    assert_eq!(config.defaults.timeout, 1500);
    clear_env();
}

#[test]
#[serial]
fn test_unparsable_port_is_ignored() {
    clear_env();
    std::env::set_var("WSMAN_PORT", "not-a-port");
    let mut config = ClientConfig::default();
    config.apply_env_overrides();
    assert_eq!(config.connection.port, 0);
    clear_env();
}

// ============================================================================
// Mapping
// ============================================================================

#[test]
#[serial]
fn test_action_options_from_defaults() {
    clear_env();
    let file = write_config(SAMPLE);
    let config = ClientConfig::from_file(file.path()).unwrap();

    let options = config.action_options();
    assert_eq!(options.timeout, 60_000);
    assert_eq!(options.cim_ns.as_deref(), Some("root/cimv2"));
    assert_eq!(options.max_envelope_size, Some(512_000));
    assert!(options.selectors.is_none());
}

#[test]
#[serial]
fn test_connect_from_config() {
    clear_env();
    let file = write_config(SAMPLE);
    let config = ClientConfig::from_file(file.path()).unwrap();

    let client = config.connect().unwrap();
    assert_eq!(client.endpoint(), "https://bmc.example.com:5986/wsman-anon");
    assert_eq!(client.credentials().unwrap().username, "admin");
    assert_eq!(client.context().max_envelope_size(), Some(512_000));
}

#[test]
#[serial]
fn test_connect_with_missing_ca_file_fails() {
    clear_env();
    let dir = tempdir().unwrap();
    let mut config = ClientConfig::default();
    config.tls.ca_file = Some(dir.path().join("missing-ca.pem"));

    assert!(config.connect().is_err());
}
