//! # wsman - A WS-Management Client
//!
//! `wsman` builds, sends and interprets the SOAP envelopes of the
//! WS-Management protocol used by CIM/WMI management agents:
//!
//! - **WS-Transfer**: Get, Put (read-modify-write) and Create of a single
//!   resource instance
//! - **WS-Enumeration**: Enumerate, Pull and Release over a collection, with
//!   the enumeration context threaded from one call to the next
//! - **Custom methods**: `<Method>_INPUT` payloads built from a property map
//! - **Identify**: the protocol handshake
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Client Handle (WsManClient)                      │
//! │             endpoint, credentials, WsManOperations trait             │
//! └─────────────────────────────────────────────────────────────────────┘
//!                  │                                   │
//!                  ▼                                   ▼
//! ┌───────────────────────────────┐   ┌───────────────────────────────┐
//! │   Transfer / Invoke builders  │   │   Enumeration assembler       │
//! └───────────────────────────────┘   └───────────────────────────────┘
//!                  │                                   │
//!                  └─────────────────┬─────────────────┘
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │        Envelope builder (addressing headers, selectors)              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   Dispatcher (handlers, transfer timer) ──► Transport (HTTP/S)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SOAP faults are returned as ordinary response documents; use
//! [`XmlDoc::is_fault`] and [`XmlDoc::fault_subcode`] to classify them.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use wsman::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut client = WsManClient::connect(
//!         WsContext::new(), Some("server"), 0, None, None, Some("wsman"), Some("secret"),
//!     )?;
//!
//!     let identity = client.identify(&ActionOptions::new())?;
//!     println!("{:?}", identity.xpath_value(
//!         "/s:Envelope/s:Body/wsmid:IdentifyResponse/wsmid:ProductVendor",
//!     ));
//!
//!     let fans = client.enumerate_all(
//!         "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_Fan",
//!         10,
//!         &ActionOptions::new(),
//!     )?;
//!     println!("{} fans", fans.len());
//!     client.close();
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod dispatch;
pub mod enumeration;
pub mod envelope;
pub mod error;
pub mod options;
pub mod transfer;
pub mod transport;
pub mod xml;

pub use client::{WsManClient, WsManOperations};
pub use context::WsContext;
pub use error::{Error, Result};
pub use options::{ActionFlags, ActionOptions};
pub use xml::XmlDoc;

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::client::{WsManClient, WsManOperations};
    pub use crate::config::ClientConfig;
    pub use crate::context::WsContext;
    pub use crate::dispatch::Handler;
    pub use crate::error::{Error, Result};
    pub use crate::options::{ActionFlags, ActionOptions, Properties, Selectors};
    pub use crate::transport::{Credentials, HttpTransport, TlsOptions, Transport, TransportRequest};
    pub use crate::xml::XmlDoc;
}

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
