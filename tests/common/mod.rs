//! Shared test utilities for the wsman integration tests.
//!
//! This module provides:
//! - A scripted [`MockTransport`] that records every request body
//! - Response fixtures for the common WS-Management replies
//! - A helper to build a client wired to the mock
//!
//! # Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use wsman::transport::{Transport, TransportRequest};
use wsman::{Error, Result, WsContext, WsManClient, XmlDoc};

pub const FAN_URI: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_Fan";
pub const TIME_SERVICE_URI: &str =
    "http://schemas.omc-project.org/wbem/wscim/1/cim-schema/2/OMC_SystemTimeService";

// ============================================================================
// Mock Transport
// ============================================================================

/// What the mock answers to one exchange.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// A response body
    Body(String),
    /// No response buffer
    Nothing,
    /// A transport error
    Fail,
}

/// One recorded exchange.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub endpoint: String,
    pub body: String,
    pub timeout_ms: Option<u128>,
    pub username: Option<String>,
}

/// Transport that replays scripted responses and records requests.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body.
    pub fn respond(&self, body: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Scripted::Body(body.into()));
        self
    }

    /// Queue an exchange that returns no response.
    pub fn respond_nothing(&self) -> &Self {
        self.responses.lock().unwrap().push_back(Scripted::Nothing);
        self
    }

    /// Queue a transport failure.
    pub fn fail(&self) -> &Self {
        self.responses.lock().unwrap().push_back(Scripted::Fail);
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Parsed body of the `index`-th request.
    pub fn request_doc(&self, index: usize) -> XmlDoc {
        let body = self.requests()[index].body.clone();
        XmlDoc::parse(body.as_bytes()).unwrap()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn exchange(&mut self, request: &TransportRequest<'_>) -> Result<Option<String>> {
        self.requests.lock().unwrap().push(Recorded {
            endpoint: request.endpoint.to_string(),
            body: request.body.to_string(),
            timeout_ms: request.timeout.map(|t| t.as_millis()),
            username: request.credentials.map(|c| c.username.clone()),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Body(body)) => Ok(Some(body)),
            Some(Scripted::Nothing) | None => Ok(None),
            Some(Scripted::Fail) => Err(Error::Http {
                endpoint: request.endpoint.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

/// A client for `http://localhost:8889/wsman` talking to `mock`.
pub fn mock_client(mock: &MockTransport) -> WsManClient {
    WsManClient::connect(WsContext::new(), None, 0, None, None, Some("wsman"), Some("secret"))
        .unwrap()
        .with_transport(Box::new(mock.clone()))
}

// ============================================================================
// Response Fixtures
// ============================================================================

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing"
    xmlns:wsen="http://schemas.xmlsoap.org/ws/2004/09/enumeration"
    xmlns:wsman="http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd"
    xmlns:wsmid="http://schemas.dmtf.org/wbem/wsman/identity/1/wsmanidentity.xsd"
    xmlns:p="{FAN_URI}"
    xmlns:t="{TIME_SERVICE_URI}">
  <s:Header>
    <wsa:To>http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous</wsa:To>
  </s:Header>
  <s:Body>{body}</s:Body>
</s:Envelope>"#
    )
}

fn fan(id: &str) -> String {
    format!("<p:CIM_Fan><p:DeviceID>{id}</p:DeviceID><p:DesiredSpeed>1000</p:DesiredSpeed></p:CIM_Fan>")
}

pub fn identify_response() -> String {
    envelope(
        "<wsmid:IdentifyResponse>\
           <wsmid:ProtocolVersion>http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd</wsmid:ProtocolVersion>\
           <wsmid:ProductVendor>Openwsman Project</wsmid:ProductVendor>\
           <wsmid:ProductVersion>2.6</wsmid:ProductVersion>\
         </wsmid:IdentifyResponse>",
    )
}

pub fn get_fan_response(id: &str) -> String {
    envelope(&fan(id))
}

pub fn enumerate_response(context: &str) -> String {
    envelope(&format!(
        "<wsen:EnumerateResponse><wsen:EnumerationContext>{context}</wsen:EnumerationContext></wsen:EnumerateResponse>"
    ))
}

pub fn optimized_enumerate_response(context: &str, ids: &[&str]) -> String {
    let items: String = ids.iter().map(|id| fan(id)).collect();
    envelope(&format!(
        "<wsen:EnumerateResponse>\
           <wsen:EnumerationContext>{context}</wsen:EnumerationContext>\
           <wsman:Items>{items}</wsman:Items>\
         </wsen:EnumerateResponse>"
    ))
}

pub fn pull_response(context: Option<&str>, ids: &[&str], end: bool) -> String {
    let items: String = ids.iter().map(|id| fan(id)).collect();
    let context = context
        .map(|c| format!("<wsen:EnumerationContext>{c}</wsen:EnumerationContext>"))
        .unwrap_or_default();
    let end = if end { "<wsen:EndOfSequence/>" } else { "" };
    envelope(&format!(
        "<wsen:PullResponse>{context}<wsen:Items>{items}</wsen:Items>{end}</wsen:PullResponse>"
    ))
}

pub fn release_response() -> String {
    envelope("")
}

pub fn fault_response(subcode: &str, reason: &str) -> String {
    envelope(&format!(
        "<s:Fault>\
           <s:Code><s:Value>s:Sender</s:Value><s:Subcode><s:Value>{subcode}</s:Value></s:Subcode></s:Code>\
           <s:Reason><s:Text xml:lang=\"en\">{reason}</s:Text></s:Reason>\
         </s:Fault>"
    ))
}

pub fn manage_system_time_response(return_value: u32) -> String {
    envelope(&format!(
        "<t:ManageSystemTime_OUTPUT>\
           <t:ReturnValue>{return_value}</t:ReturnValue>\
         </t:ManageSystemTime_OUTPUT>"
    ))
}
