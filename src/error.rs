//! Error types for the WS-Management client.
//!
//! SOAP faults returned by the remote agent are *not* errors at this layer:
//! they arrive as well-formed response documents and are classified by the
//! caller (see [`crate::xml::XmlDoc::is_fault`]). The variants below cover
//! failures of the client itself.

use thiserror::Error;

use crate::xml::XmlDoc;

/// Result type alias for WS-Management operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the WS-Management client.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The response did not have the shape the operation expects.
    ///
    /// The offending response is handed back when one was received so the
    /// caller can still inspect it (typically a SOAP fault).
    #[error("Protocol error: {message}")]
    ProtocolError {
        /// Error message
        message: String,
        /// Response that triggered the error
        response: Option<Box<XmlDoc>>,
    },

    /// Pull was called without an enumeration context.
    #[error("No enumeration context")]
    MissingEnumerationContext,

    /// A node the request builder needs is absent from the document.
    #[error("Node '{0}' not found")]
    MissingNode(String),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// The transport returned no response buffer.
    #[error("No response received from '{endpoint}'")]
    TransportFailure {
        /// Endpoint the request was sent to
        endpoint: String,
    },

    /// HTTP-level failure reported by the transport.
    #[error("HTTP request to '{endpoint}' failed: {message}")]
    Http {
        /// Endpoint the request was sent to
        endpoint: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// A URI could not be parsed.
    #[error("Invalid URI '{uri}': {message}")]
    InvalidUri {
        /// The offending URI
        uri: String,
        /// Error message
        message: String,
    },

    /// The response buffer is not well-formed XML.
    #[error("Failed to parse XML document: {0}")]
    XmlParse(#[from] xmltree::ParseError),

    /// A document could not be serialized.
    #[error("Failed to serialize XML document: {0}")]
    XmlWrite(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a protocol error without an attached response.
    pub fn protocol(message: impl Into<String>) -> Self {
        Error::ProtocolError {
            message: message.into(),
            response: None,
        }
    }

    /// Create a protocol error carrying the response that caused it.
    pub fn protocol_with_response(message: impl Into<String>, response: XmlDoc) -> Self {
        Error::ProtocolError {
            message: message.into(),
            response: Some(Box::new(response)),
        }
    }

    /// Take back the response attached to a protocol error, if any.
    pub fn into_response(self) -> Option<XmlDoc> {
        match self {
            Error::ProtocolError { response, .. } => response.map(|doc| *doc),
            _ => None,
        }
    }

    /// Whether the error was raised before or during the network exchange
    /// rather than by the shape of a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::TransportFailure { .. } | Error::Http { .. })
    }
}

impl From<xmltree::Error> for Error {
    fn from(err: xmltree::Error) -> Self {
        Error::XmlWrite(err.to_string())
    }
}
