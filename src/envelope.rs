//! Request envelope construction.
//!
//! Every request shares the same header block (addressing, resource URI,
//! envelope size and timeout); the per-operation modules add their body
//! payload and selectors on top of [`build_envelope`].

use tracing::{debug, info};
use xmltree::Element;

use crate::constants::{
    CIM_NAMESPACE_SELECTOR, SOAP_MUST_UNDERSTAND, WSA_ACTION, WSA_ADDRESS, WSA_MESSAGE_ID,
    WSA_REPLY_TO, WSA_TO, WSA_TO_ANONYMOUS, WSMID_IDENTIFY, WSM_MAX_ENVELOPE_SIZE, WSM_NAME,
    WSM_OPERATION_TIMEOUT, WSM_RESOURCE_URI, WSM_SELECTOR, WSM_SELECTOR_SET, XML_NS_ADDRESSING,
    XML_NS_WSMAN_ID, XML_NS_WS_MAN,
};
use crate::context::WsContext;
use crate::error::{Error, Result};
use crate::options::{ActionFlags, ActionOptions};
use crate::xml::{add_child, append_element, get_child_mut, set_attr, XmlDoc};

/// Join a namespace or resource URI and an operation name.
pub fn make_action(uri: &str, op: &str) -> String {
    format!("{uri}/{op}")
}

/// Format a millisecond timeout as an `xs:duration`.
pub fn format_timeout(timeout_ms: u64) -> String {
    format!("PT{}.{:03}S", timeout_ms / 1000, timeout_ms % 1000)
}

fn header_mut(doc: &mut XmlDoc) -> Result<&mut Element> {
    doc.header_mut()
        .ok_or_else(|| Error::MissingNode("Header".to_string()))
}

fn body_mut(doc: &mut XmlDoc) -> Result<&mut Element> {
    doc.body_mut()
        .ok_or_else(|| Error::MissingNode("Body".to_string()))
}

/// Build a request envelope with the standard WS-Management headers.
///
/// `reply_to` defaults to the anonymous address. `headers` are deep-copied
/// into the header block after the standard entries.
pub fn build_envelope(
    ctx: &WsContext,
    action: &str,
    reply_to: Option<&str>,
    headers: &[Element],
    resource_uri: Option<&str>,
    endpoint: &str,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let mut doc = ctx.create_envelope();
    let header = header_mut(&mut doc)?;

    add_child(header, Some(XML_NS_ADDRESSING), WSA_TO, Some(endpoint));

    if let Some(uri) = resource_uri {
        let node = add_child(header, Some(XML_NS_WS_MAN), WSM_RESOURCE_URI, Some(uri));
        set_attr(node, SOAP_MUST_UNDERSTAND, "true");
    }

    let reply = add_child(header, Some(XML_NS_ADDRESSING), WSA_REPLY_TO, None);
    add_child(
        reply,
        Some(XML_NS_ADDRESSING),
        WSA_ADDRESS,
        Some(reply_to.unwrap_or(WSA_TO_ANONYMOUS)),
    );

    let node = add_child(header, Some(XML_NS_ADDRESSING), WSA_ACTION, Some(action));
    set_attr(node, SOAP_MUST_UNDERSTAND, "true");

    add_child(
        header,
        Some(XML_NS_ADDRESSING),
        WSA_MESSAGE_ID,
        Some(ctx.message_id().as_str()),
    );

    if let Some(size) = options.max_envelope_size.or(ctx.max_envelope_size()) {
        let node = add_child(
            header,
            Some(XML_NS_WS_MAN),
            WSM_MAX_ENVELOPE_SIZE,
            Some(size.to_string().as_str()),
        );
        set_attr(node, SOAP_MUST_UNDERSTAND, "true");
    }

    if options.timeout > 0 {
        add_child(
            header,
            Some(XML_NS_WS_MAN),
            WSM_OPERATION_TIMEOUT,
            Some(format_timeout(options.timeout).as_str()),
        );
    }

    for extra in headers {
        append_element(header, extra.clone());
    }

    Ok(doc)
}

/// Append one selector to the header's `SelectorSet`, creating the set on
/// first use.
pub fn add_selector(doc: &mut XmlDoc, name: &str, value: &str) -> Result<()> {
    let header = header_mut(doc)?;
    let has_set = get_child_mut(header, 0, Some(XML_NS_WS_MAN), Some(WSM_SELECTOR_SET)).is_some();
    if !has_set {
        add_child(header, Some(XML_NS_WS_MAN), WSM_SELECTOR_SET, None);
    }
    let set = get_child_mut(header, 0, Some(XML_NS_WS_MAN), Some(WSM_SELECTOR_SET))
        .ok_or_else(|| Error::MissingNode(WSM_SELECTOR_SET.to_string()))?;
    let selector = add_child(set, Some(XML_NS_WS_MAN), WSM_SELECTOR, Some(value));
    set_attr(selector, WSM_NAME, name);
    Ok(())
}

/// Insert every selector carried by `options`.
pub fn apply_selectors(doc: &mut XmlDoc, options: &ActionOptions) -> Result<()> {
    if let Some(selectors) = options.selectors.as_ref() {
        for (key, value) in selectors {
            debug!(key = %key, value = %value, "Adding selector");
            add_selector(doc, key, value)?;
        }
    }
    Ok(())
}

/// Insert the `__cimnamespace` selector when a CIM namespace is set.
pub fn apply_cim_namespace(doc: &mut XmlDoc, options: &ActionOptions) -> Result<()> {
    if let Some(ns) = options.cim_ns.as_deref() {
        add_selector(doc, CIM_NAMESPACE_SELECTOR, ns)?;
    }
    Ok(())
}

/// `Identify` request: no addressing headers, empty identify body element.
pub fn build_identify_envelope(ctx: &WsContext) -> Result<XmlDoc> {
    let mut doc = ctx.create_envelope();
    add_child(body_mut(&mut doc)?, Some(XML_NS_WSMAN_ID), WSMID_IDENTIFY, None);
    Ok(doc)
}

/// Log the serialized request when `DUMP_REQUEST` is set.
pub fn dump_if_requested(doc: &XmlDoc, options: &ActionOptions, what: &str) {
    if !options.flags.contains(ActionFlags::DUMP_REQUEST) {
        return;
    }
    match doc.to_pretty_string() {
        Ok(xml) => info!(target: "wsman::dump", kind = what, "\n{}", xml),
        Err(e) => debug!(error = %e, "Could not serialize document for dump"),
    }
}
