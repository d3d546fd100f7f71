//! Transport layer.
//!
//! The client hands serialized envelopes to a [`Transport`] and gets the raw
//! response body back. [`HttpTransport`] is the HTTP(S) binding; tests plug in
//! scripted implementations.

mod http;

pub use http::HttpTransport;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::Result;

/// Content type of every WS-Management request.
pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF-8";

/// User credentials for Basic authentication.
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password
    pub password: SecretString,
}

impl Credentials {
    /// Create credentials from a user name and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// TLS client material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Client certificate (PEM)
    pub cert_file: Option<PathBuf>,
    /// Client private key (PEM)
    pub key_file: Option<PathBuf>,
    /// Additional trusted root certificate (PEM)
    pub ca_file: Option<PathBuf>,
    /// Verify the server certificate
    pub verify_peer: bool,
}

/// One request handed to a transport.
#[derive(Debug)]
pub struct TransportRequest<'a> {
    /// Endpoint URL
    pub endpoint: &'a str,
    /// Serialized envelope
    pub body: &'a str,
    /// Advisory timeout
    pub timeout: Option<Duration>,
    /// Credentials, when the client has any
    pub credentials: Option<&'a Credentials>,
}

/// A request/response exchange with a WS-Management agent.
pub trait Transport: Send {
    /// Send `request` and return the response body.
    ///
    /// `Ok(None)` means no response buffer came back (including timeouts).
    fn exchange(&mut self, request: &TransportRequest<'_>) -> Result<Option<String>>;
}

/// Last request and response buffers of a connection.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionBuffers {
    /// Serialized request of the current exchange
    pub request: Option<String>,
    /// Raw response of the current exchange
    pub response: Option<String>,
}

impl ConnectionBuffers {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop both buffers.
    pub fn release(&mut self) {
        self.request = None;
        self.response = None;
    }

    /// Whether both buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.request.is_none() && self.response.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_release_clears_both_buffers() {
        let mut buffers = ConnectionBuffers::new();
        buffers.request = Some("<req/>".to_string());
        buffers.response = Some("<resp/>".to_string());
        buffers.release();
        assert!(buffers.is_empty());
        buffers.release();
        assert!(buffers.is_empty());
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new("wsman", "secret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("wsman"));
        assert!(!debug.contains("secret"));
        assert_eq!(creds.password.expose_secret(), "secret");
    }
}
