//! WS-Management client handle.
//!
//! [`WsManClient`] owns the endpoint, credentials, transport and connection
//! buffers of one agent. Operations are exposed through the
//! [`WsManOperations`] trait; each performs exactly one blocking round trip
//! (two for Put) and releases the connection buffers afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use wsman::prelude::*;
//!
//! let mut client = WsManClient::connect(
//!     WsContext::new(), Some("server"), 0, None, None, Some("wsman"), Some("secret"),
//! )?;
//!
//! let mut options = ActionOptions::new();
//! options.selectors_from_query_string("CreationClassName=OMC_SystemTimeService&Name=timeservice");
//! options.properties_from_query_string("GetRequest=TRUE");
//!
//! let response = client.invoke(
//!     "http://schemas.omc-project.org/wbem/wscim/1/cim-schema/2/OMC_SystemTimeService",
//!     "ManageSystemTime",
//!     &options,
//! )?;
//! if response.is_fault() {
//!     eprintln!("fault: {:?}", response.fault_subcode());
//! }
//! client.close();
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use xmltree::Element;

use crate::context::WsContext;
use crate::dispatch::{Dispatcher, Handler};
use crate::enumeration::{self, EnumOp};
use crate::envelope::{build_identify_envelope, dump_if_requested};
use crate::error::{Error, Result};
use crate::options::{remove_query_string, ActionOptions};
use crate::transfer;
use crate::transport::{ConnectionBuffers, Credentials, HttpTransport, TlsOptions, Transport};
use crate::xml::XmlDoc;

/// Default scheme when none is given.
pub const DEFAULT_SCHEME: &str = "http";

/// Default host when none is given.
pub const DEFAULT_HOST: &str = "localhost";

/// Default path when none is given.
pub const DEFAULT_PATH: &str = "/wsman";

/// Port used for `http` when the port is 0.
pub const DEFAULT_HTTP_PORT: u16 = 8889;

/// Port used for `https` when the port is 0.
pub const DEFAULT_HTTPS_PORT: u16 = 8888;

/// The operations a WS-Management client offers.
pub trait WsManOperations {
    /// WS-Transfer Get.
    fn get(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc>;

    /// WS-Transfer Put of `options.properties`, as a Get followed by a Put.
    fn put(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc>;

    /// WS-Transfer Create from `options.properties`.
    fn create(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc>;

    /// Invoke a custom method with `options.properties` as input parameters.
    fn invoke(&mut self, resource_uri: &str, method: &str, options: &ActionOptions)
        -> Result<XmlDoc>;

    /// Start an enumeration.
    fn enumerate(
        &mut self,
        resource_uri: &str,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<XmlDoc>;

    /// Pull the next batch. The context is consumed.
    fn pull(
        &mut self,
        resource_uri: &str,
        enum_context: Option<String>,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<XmlDoc>;

    /// Release an enumeration context.
    fn release(
        &mut self,
        resource_uri: &str,
        enum_context: Option<String>,
        options: &ActionOptions,
    ) -> Result<XmlDoc>;

    /// Identify the agent.
    fn identify(&mut self, options: &ActionOptions) -> Result<XmlDoc>;

    /// Release the client and everything it owns.
    fn close(self)
    where
        Self: Sized;
}

/// Client for one WS-Management endpoint.
pub struct WsManClient {
    ctx: Arc<WsContext>,
    scheme: String,
    host: String,
    port: u16,
    endpoint: String,
    credentials: Option<Credentials>,
    tls: TlsOptions,
    transport: Box<dyn Transport>,
    connection: ConnectionBuffers,
    dispatcher: Dispatcher,
}

impl fmt::Debug for WsManClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsManClient")
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("tls", &self.tls)
            .field("connection", &self.connection)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Port used when none is given; https gets 8888 and everything else 8889.
pub fn default_port(scheme: &str) -> u16 {
    if scheme == "https" {
        DEFAULT_HTTPS_PORT
    } else {
        DEFAULT_HTTP_PORT
    }
}

/// `scheme://host:port/path`, with `/wsman` as the default path.
pub fn make_endpoint(scheme: &str, host: &str, port: u16, path: Option<&str>) -> String {
    match path {
        Some(path) if path.starts_with('/') => format!("{scheme}://{host}:{port}{path}"),
        Some(path) => format!("{scheme}://{host}:{port}/{path}"),
        None => format!("{scheme}://{host}:{port}{DEFAULT_PATH}"),
    }
}

impl WsManClient {
    /// Connect without TLS client material.
    #[allow(clippy::too_many_arguments)]
    pub fn connect(
        ctx: Arc<WsContext>,
        host: Option<&str>,
        port: u16,
        path: Option<&str>,
        scheme: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        Self::connect_with_ssl(ctx, host, port, path, scheme, username, password, None, None)
    }

    /// Connect with an optional client certificate and key.
    ///
    /// Missing values default to `http`, `localhost` and the scheme's default
    /// port. Peer verification starts disabled.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_with_ssl(
        ctx: Arc<WsContext>,
        host: Option<&str>,
        port: u16,
        path: Option<&str>,
        scheme: Option<&str>,
        username: Option<&str>,
        password: Option<&str>,
        cert_file: Option<&str>,
        key_file: Option<&str>,
    ) -> Result<Self> {
        let scheme = scheme.unwrap_or(DEFAULT_SCHEME).to_string();
        let host = host.unwrap_or(DEFAULT_HOST).to_string();
        let port = if port == 0 { default_port(&scheme) } else { port };
        let endpoint = make_endpoint(&scheme, &host, port, path);
        debug!(endpoint = %endpoint, "Endpoint");

        let credentials =
            username.map(|user| Credentials::new(user, password.unwrap_or_default()));
        let tls = TlsOptions {
            cert_file: cert_file.map(Into::into),
            key_file: key_file.map(Into::into),
            ca_file: None,
            verify_peer: false,
        };
        let transport = HttpTransport::new(&tls)?;

        Ok(Self {
            ctx,
            scheme,
            host,
            port,
            endpoint,
            credentials,
            tls,
            transport: Box::new(transport),
            connection: ConnectionBuffers::new(),
            dispatcher: Dispatcher::new(),
        })
    }

    /// Replace the TLS material and rebuild the HTTP transport.
    pub fn with_tls(mut self, tls: TlsOptions) -> Result<Self> {
        self.transport = Box::new(HttpTransport::new(&tls)?);
        self.tls = tls;
        Ok(self)
    }

    /// Replace the transport.
    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn tls(&self) -> &TlsOptions {
        &self.tls
    }

    pub fn context(&self) -> &Arc<WsContext> {
        &self.ctx
    }

    /// Connection buffers of the last exchange (empty once released).
    pub fn connection(&self) -> &ConnectionBuffers {
        &self.connection
    }

    /// Register an observer called before every exchange.
    pub fn add_handler(&mut self, handler: Handler) -> u32 {
        self.dispatcher.handlers.add(handler)
    }

    /// Remove an observer. Returns whether it was registered.
    pub fn remove_handler(&mut self, id: u32) -> bool {
        self.dispatcher.handlers.remove(id)
    }

    /// Time spent in handlers and exchanges since the last call.
    pub fn take_transfer_time(&mut self) -> Duration {
        self.dispatcher.timer.take()
    }

    /// Send a request and release the connection buffers afterwards.
    fn send(&mut self, request: &XmlDoc, options: &ActionOptions) -> Result<XmlDoc> {
        let result = self.dispatcher.send(
            self.transport.as_mut(),
            &mut self.connection,
            &self.endpoint,
            self.credentials.as_ref(),
            request,
            options.timeout,
        );
        self.connection.release();
        result
    }

    fn send_enum(
        &mut self,
        op: EnumOp,
        enum_context: Option<&str>,
        resource_uri: &str,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<XmlDoc> {
        let request = enumeration::assemble(
            &self.ctx,
            op,
            enum_context,
            resource_uri,
            &self.endpoint,
            max_elements,
            options,
        )?;
        dump_if_requested(&request, options, op.as_str());
        self.send(&request, options)
    }

    /// Enumerate, pull until the end of the sequence and collect every item.
    ///
    /// Items of an optimized Enumerate response are included. If a Pull
    /// fails the context is released before the error is returned.
    pub fn enumerate_all(
        &mut self,
        resource_uri: &str,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<Vec<Element>> {
        let response = self.enumerate(resource_uri, max_elements, options)?;
        if response.is_fault() {
            return Err(Error::protocol_with_response("Enumerate failed", response));
        }

        let mut items = enumeration::items(&response);
        let mut context = if enumeration::is_end_of_sequence(&response) {
            None
        } else {
            enumeration::extract_context(&response)
        };

        while let Some(current) = context.take() {
            match self.pull(resource_uri, Some(current.clone()), max_elements, options) {
                Ok(doc) => {
                    items.extend(enumeration::items(&doc));
                    if enumeration::is_end_of_sequence(&doc) {
                        break;
                    }
                    context = enumeration::extract_context(&doc);
                    if context.is_none() {
                        debug!("No new enumeration context");
                    }
                }
                Err(e) => {
                    if let Err(release_err) = self.release(resource_uri, Some(current), options)
                    {
                        debug!(error = %release_err, "Release after failed Pull");
                    }
                    return Err(e);
                }
            }
        }

        Ok(items)
    }
}

impl WsManOperations for WsManClient {
    fn get(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc> {
        let request = transfer::get_request(&self.ctx, &self.endpoint, resource_uri, options)?;
        dump_if_requested(&request, options, "Get");
        self.send(&request, options)
    }

    fn put(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc> {
        let (bare, query) = remove_query_string(resource_uri);
        let mut options = options.clone();
        if query.is_some() {
            options.selectors_from_uri(resource_uri);
        }

        let get_request = transfer::get_request(&self.ctx, &self.endpoint, &bare, &options)?;
        let get_response = self.send(&get_request, &options)?;

        let put_request =
            transfer::put_request(&self.ctx, &self.endpoint, &bare, &get_response, &options)?;
        dump_if_requested(&put_request, &options, "Put");
        self.send(&put_request, &options)
    }

    fn create(&mut self, resource_uri: &str, options: &ActionOptions) -> Result<XmlDoc> {
        let request = transfer::create_request(&self.ctx, &self.endpoint, resource_uri, options)?;
        dump_if_requested(&request, options, "Create");
        self.send(&request, options)
    }

    fn invoke(
        &mut self,
        resource_uri: &str,
        method: &str,
        options: &ActionOptions,
    ) -> Result<XmlDoc> {
        let request =
            transfer::invoke_request(&self.ctx, &self.endpoint, resource_uri, method, options)?;
        dump_if_requested(&request, options, "Invoke");
        self.send(&request, options)
    }

    fn enumerate(
        &mut self,
        resource_uri: &str,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<XmlDoc> {
        info!(resource_uri, "Enumerate...");
        let response = self.send_enum(EnumOp::Enumerate, None, resource_uri, max_elements, options)?;
        dump_if_requested(&response, options, "EnumerateResponse");
        Ok(response)
    }

    fn pull(
        &mut self,
        resource_uri: &str,
        enum_context: Option<String>,
        max_elements: u32,
        options: &ActionOptions,
    ) -> Result<XmlDoc> {
        info!(resource_uri, "Pull request...");
        let Some(enum_context) = enum_context else {
            return Err(Error::MissingEnumerationContext);
        };

        let response = self.send_enum(
            EnumOp::Pull,
            Some(&enum_context),
            resource_uri,
            max_elements,
            options,
        )?;
        drop(enum_context);

        if !enumeration::is_pull_response(&response) {
            return Err(Error::protocol_with_response("no Pull response", response));
        }
        if enumeration::is_end_of_sequence(&response) {
            debug!("End of sequence");
        }
        Ok(response)
    }

    fn release(
        &mut self,
        resource_uri: &str,
        enum_context: Option<String>,
        options: &ActionOptions,
    ) -> Result<XmlDoc> {
        self.send_enum(
            EnumOp::Release,
            enum_context.as_deref(),
            resource_uri,
            0,
            options,
        )
    }

    fn identify(&mut self, options: &ActionOptions) -> Result<XmlDoc> {
        let request = build_identify_envelope(&self.ctx)?;
        dump_if_requested(&request, options, "Identify");
        self.send(&request, options)
    }

    fn close(mut self) {
        self.connection.release();
        debug!(endpoint = %self.endpoint, "Client released");
    }
}
