//! Client configuration.
//!
//! Settings are read from the first file found among:
//! - an explicit path
//! - `$WSMAN_CONFIG`
//! - `~/.wsman.toml`
//! - `./wsman.toml`
//!
//! and then overridden by `WSMAN_*` environment variables.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::client::WsManClient;
use crate::context::WsContext;
use crate::options::ActionOptions;
use crate::transport::TlsOptions;

/// Complete client configuration
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Endpoint settings
    pub connection: EndpointConfig,

    /// Credentials
    pub auth: AuthConfig,

    /// TLS material
    pub tls: TlsConfig,

    /// Per-request defaults
    pub defaults: RequestDefaults,
}

/// Where the agent listens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// `http` or `https`
    pub scheme: Option<String>,
    /// Host name or address
    pub host: Option<String>,
    /// Port (0 = scheme default)
    pub port: u16,
    /// Path (default `/wsman`)
    pub path: Option<String>,
}

/// Basic authentication credentials
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// User name
    pub username: Option<String>,
    /// Password, never written back out
    #[serde(deserialize_with = "deserialize_secret", skip_serializing)]
    pub password: Option<SecretString>,
}

/// TLS client settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Client certificate (PEM)
    pub cert_file: Option<PathBuf>,
    /// Client private key (PEM)
    pub key_file: Option<PathBuf>,
    /// Additional root certificate (PEM)
    pub ca_file: Option<PathBuf>,
    /// Verify the server certificate
    pub verify_peer: bool,
}

/// Defaults applied to every request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Operation timeout in milliseconds
    pub timeout: u64,
    /// CIM namespace selector
    pub cim_namespace: Option<String>,
    /// Overrides the default `MaxEnvelopeSize`
    pub max_envelope_size: Option<u32>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.map(|s| SecretString::new(s.into_boxed_str())))
}

impl ClientConfig {
    /// Load configuration from the standard locations plus environment.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = match Self::get_config_paths(config_path)
            .into_iter()
            .find(|p| p.exists())
        {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Candidate configuration files, most specific first.
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();
        if let Ok(env_config) = std::env::var("WSMAN_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".wsman.toml"));
        }
        paths.push(PathBuf::from("wsman.toml"));
        paths
    }

    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("WSMAN_HOST") {
            self.connection.host = Some(host);
        }

        if let Ok(port) = std::env::var("WSMAN_PORT") {
            if let Ok(n) = port.parse() {
                self.connection.port = n;
            }
        }

        if let Ok(scheme) = std::env::var("WSMAN_SCHEME") {
            self.connection.scheme = Some(scheme);
        }

        if let Ok(user) = std::env::var("WSMAN_USER") {
            self.auth.username = Some(user);
        }

        if let Ok(password) = std::env::var("WSMAN_PASSWORD") {
            self.auth.password = Some(SecretString::new(password.into_boxed_str()));
        }

        if let Ok(timeout) = std::env::var("WSMAN_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.defaults.timeout = n;
            }
        }
    }

    /// TLS options for the HTTP transport.
    pub fn tls_options(&self) -> TlsOptions {
        TlsOptions {
            cert_file: self.tls.cert_file.clone(),
            key_file: self.tls.key_file.clone(),
            ca_file: self.tls.ca_file.clone(),
            verify_peer: self.tls.verify_peer,
        }
    }

    /// Request options pre-filled with the configured defaults.
    pub fn action_options(&self) -> ActionOptions {
        ActionOptions {
            timeout: self.defaults.timeout,
            cim_ns: self.defaults.cim_namespace.clone(),
            max_envelope_size: self.defaults.max_envelope_size,
            ..ActionOptions::default()
        }
    }

    /// Connect a client with these settings.
    pub fn connect(&self) -> Result<WsManClient> {
        let ctx = match self.defaults.max_envelope_size {
            Some(size) => WsContext::with_max_envelope_size(Some(size)),
            None => WsContext::new(),
        };
        let password = self.auth.password.as_ref().map(|p| p.expose_secret());
        let client = WsManClient::connect_with_ssl(
            ctx,
            self.connection.host.as_deref(),
            self.connection.port,
            self.connection.path.as_deref(),
            self.connection.scheme.as_deref(),
            self.auth.username.as_deref(),
            password,
            self.tls.cert_file.as_deref().and_then(Path::to_str),
            self.tls.key_file.as_deref().and_then(Path::to_str),
        )
        .context("Failed to create client")?;

        if self.tls.ca_file.is_some() || self.tls.verify_peer {
            return client
                .with_tls(self.tls_options())
                .context("Failed to configure TLS");
        }
        Ok(client)
    }
}
