//! HTTP(S) transport over a blocking reqwest client.

use std::fs;
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use tracing::{debug, trace, warn};

use super::{TlsOptions, Transport, TransportRequest, SOAP_CONTENT_TYPE};
use crate::error::{Error, Result};

/// Blocking HTTP(S) transport.
pub struct HttpTransport {
    client: Client,
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        Error::Config(format!("Failed to read {} '{}': {}", what, path.display(), e))
    })
}

impl HttpTransport {
    /// Build a transport from TLS material.
    ///
    /// A client identity is configured when both a certificate and a key are
    /// given.
    pub fn new(tls: &TlsOptions) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(!tls.verify_peer);

        if let Some(ca_path) = &tls.ca_file {
            let pem = read_pem(ca_path, "CA certificate")?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| Error::Config(format!("Invalid CA certificate: {}", e)))?;
            builder = builder.add_root_certificate(cert);
        }

        match (&tls.cert_file, &tls.key_file) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_pem(cert_path, "client certificate")?;
                pem.push(b'\n');
                pem.extend(read_pem(key_path, "client key")?);
                let identity = reqwest::Identity::from_pem(&pem)
                    .map_err(|e| Error::Config(format!("Invalid client identity: {}", e)))?;
                builder = builder.identity(identity);
            }
            (Some(_), None) | (None, Some(_)) => {
                warn!("Client certificate and key must both be set; ignoring TLS identity");
            }
            (None, None) => {}
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn exchange(&mut self, request: &TransportRequest<'_>) -> Result<Option<String>> {
        let mut builder = self
            .client
            .post(request.endpoint)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .body(request.body.to_string());
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(creds) = request.credentials {
            builder = builder.basic_auth(&creds.username, Some(creds.password.expose_secret()));
        }

        trace!(endpoint = %request.endpoint, bytes = request.body.len(), "POST");
        let response = match builder.send() {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(endpoint = %request.endpoint, "Request timed out");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::Http {
                    endpoint: request.endpoint.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            debug!(endpoint = %request.endpoint, %status, "Agent returned error status");
        }
        let body = response.text().map_err(|e| Error::Http {
            endpoint: request.endpoint.to_string(),
            message: e.to_string(),
        })?;

        if body.trim().is_empty() {
            debug!(endpoint = %request.endpoint, %status, "Empty response body");
            return Ok(None);
        }
        Ok(Some(body))
    }
}
