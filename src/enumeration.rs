//! WS-Enumeration message assembly and response helpers.

use std::fmt;

use tracing::debug;
use xmltree::{Element, XMLNode};

use crate::constants::{
    CIM_NAMESPACE_SELECTOR, WSA_TO_ANONYMOUS, WSENUM_DIALECT, WSENUM_END_OF_SEQUENCE,
    WSENUM_ENUMERATE, WSENUM_ENUMERATION_CONTEXT, WSENUM_FILTER, WSENUM_ITEMS,
    WSENUM_MAX_ELEMENTS, WSENUM_PULL, WSENUM_PULL_RESP, WSENUM_RELEASE, WSMB_EXCLUDE_SUBCLASS_PROP,
    WSMB_INCLUDE_SUBCLASS_PROP, WSMB_POLYMORPHISM_MODE, WSMB_POLYMORPHISM_NONE, WSM_ENUM_EPR,
    WSM_ENUM_MODE, WSM_ENUM_OBJ_AND_EPR, WSM_ITEMS, WSM_OPTIMIZE_ENUM, WSM_REQUEST_TOTAL,
    XML_NS_CIM_BINDING, XML_NS_ENUMERATION, XML_NS_WS_MAN,
};
use crate::context::WsContext;
use crate::envelope::{add_selector, build_envelope, make_action};
use crate::error::{Error, Result};
use crate::options::{ActionFlags, ActionOptions};
use crate::xml::{add_child, find_descendant, get_child, node_text, set_attr, XmlDoc};

/// The three WS-Enumeration operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumOp {
    Enumerate,
    Pull,
    Release,
}

impl EnumOp {
    /// Element and action name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnumOp::Enumerate => WSENUM_ENUMERATE,
            EnumOp::Pull => WSENUM_PULL,
            EnumOp::Release => WSENUM_RELEASE,
        }
    }

    /// Action URI of the operation.
    pub fn action(&self) -> String {
        make_action(XML_NS_ENUMERATION, self.as_str())
    }
}

impl fmt::Display for EnumOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enumeration-mode header value; EPR wins over object-and-EPR.
fn enumeration_mode(flags: ActionFlags) -> Option<&'static str> {
    if flags.contains(ActionFlags::ENUMERATION_ENUM_EPR) {
        Some(WSM_ENUM_EPR)
    } else if flags.contains(ActionFlags::ENUMERATION_ENUM_OBJ_AND_EPR) {
        Some(WSM_ENUM_OBJ_AND_EPR)
    } else {
        None
    }
}

/// Polymorphism-mode value; first matching flag wins.
fn polymorphism_mode(flags: ActionFlags) -> Option<&'static str> {
    if flags.contains(ActionFlags::INCLUDE_SUBCLASS_PROPERTIES) {
        Some(WSMB_INCLUDE_SUBCLASS_PROP)
    } else if flags.contains(ActionFlags::EXCLUDE_SUBCLASS_PROPERTIES) {
        Some(WSMB_EXCLUDE_SUBCLASS_PROP)
    } else if flags.contains(ActionFlags::POLYMORPHISM_NONE) {
        Some(WSMB_POLYMORPHISM_NONE)
    } else {
        None
    }
}

/// Assemble an Enumerate, Pull or Release request.
///
/// `max_elements` is only emitted for optimized Enumerate and for Pull, and
/// only when non-zero.
pub fn assemble(
    ctx: &WsContext,
    op: EnumOp,
    enum_context: Option<&str>,
    resource_uri: &str,
    endpoint: &str,
    max_elements: u32,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let action = op.action();
    let mut doc = build_envelope(
        ctx,
        &action,
        Some(WSA_TO_ANONYMOUS),
        &[],
        Some(resource_uri),
        endpoint,
        options,
    )?;

    if let Some(ns) = options.cim_ns.as_deref() {
        add_selector(&mut doc, CIM_NAMESPACE_SELECTOR, ns)?;
    }
    if options.flags.contains(ActionFlags::ENUMERATION_COUNT_ESTIMATION) {
        let header = doc
            .header_mut()
            .ok_or_else(|| Error::MissingNode("Header".to_string()))?;
        add_child(header, Some(XML_NS_WS_MAN), WSM_REQUEST_TOTAL, None);
    }

    let body = doc
        .body_mut()
        .ok_or_else(|| Error::MissingNode("Body".to_string()))?;
    let node = add_child(body, Some(XML_NS_ENUMERATION), op.as_str(), None);

    if let Some(context) = enum_context {
        add_child(
            node,
            Some(XML_NS_ENUMERATION),
            WSENUM_ENUMERATION_CONTEXT,
            Some(context),
        );
    }

    if op == EnumOp::Enumerate {
        let flags = options.flags;
        if flags.contains(ActionFlags::ENUMERATION_OPTIMIZATION) {
            add_child(node, Some(XML_NS_WS_MAN), WSM_OPTIMIZE_ENUM, None);
            if max_elements > 0 {
                add_child(
                    node,
                    Some(XML_NS_WS_MAN),
                    WSENUM_MAX_ELEMENTS,
                    Some(max_elements.to_string().as_str()),
                );
            }
        }
        if let Some(mode) = enumeration_mode(flags) {
            add_child(node, Some(XML_NS_WS_MAN), WSM_ENUM_MODE, Some(mode));
        }
        if let Some(mode) = polymorphism_mode(flags) {
            add_child(node, Some(XML_NS_CIM_BINDING), WSMB_POLYMORPHISM_MODE, Some(mode));
        }
    }

    if let Some(filter) = options.filter.as_deref() {
        let elem = add_child(node, Some(XML_NS_WS_MAN), WSENUM_FILTER, Some(filter));
        if let Some(dialect) = options.dialect.as_deref() {
            set_attr(elem, WSENUM_DIALECT, dialect);
        }
    }

    if op == EnumOp::Pull && max_elements > 0 {
        add_child(
            node,
            Some(XML_NS_ENUMERATION),
            WSENUM_MAX_ELEMENTS,
            Some(max_elements.to_string().as_str()),
        );
    }

    Ok(doc)
}

fn non_empty_text(elem: &Element) -> Option<String> {
    node_text(elem).filter(|t| !t.is_empty())
}

/// Enumeration context of an Enumerate or Pull response.
///
/// Searches every descendant of the first body child.
pub fn extract_context(doc: &XmlDoc) -> Option<String> {
    let node = doc.body_first_child()?;
    let context = find_descendant(
        node,
        Some(XML_NS_ENUMERATION),
        Some(WSENUM_ENUMERATION_CONTEXT),
    )?;
    non_empty_text(context)
}

/// Like [`extract_context`] but only looks at direct children of the first
/// body child.
pub fn extract_context_shallow(doc: &XmlDoc) -> Option<String> {
    let node = doc.body_first_child()?;
    let context = get_child(
        node,
        0,
        Some(XML_NS_ENUMERATION),
        Some(WSENUM_ENUMERATION_CONTEXT),
    )?;
    non_empty_text(context)
}

/// Whether the body's first child is `wsen:PullResponse`.
pub fn is_pull_response(doc: &XmlDoc) -> bool {
    doc.body_first_child()
        .map_or(false, |node| node.name == WSENUM_PULL_RESP)
}

/// Whether the response carries `wsen:EndOfSequence` (or the optimized
/// `wsman:EndOfSequence` of an Enumerate response).
pub fn is_end_of_sequence(doc: &XmlDoc) -> bool {
    let Some(node) = doc.body_first_child() else {
        return false;
    };
    get_child(node, 0, Some(XML_NS_ENUMERATION), Some(WSENUM_END_OF_SEQUENCE)).is_some()
        || get_child(node, 0, Some(XML_NS_WS_MAN), Some(WSENUM_END_OF_SEQUENCE)).is_some()
}

/// Items carried by a Pull response or an optimized Enumerate response.
pub fn items(doc: &XmlDoc) -> Vec<Element> {
    let Some(node) = doc.body_first_child() else {
        return Vec::new();
    };
    let container = get_child(node, 0, Some(XML_NS_ENUMERATION), Some(WSENUM_ITEMS))
        .or_else(|| get_child(node, 0, Some(XML_NS_WS_MAN), Some(WSM_ITEMS)));
    let items: Vec<Element> = container
        .map(|items| {
            items
                .children
                .iter()
                .filter_map(XMLNode::as_element)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    debug!(count = items.len(), "Extracted items");
    items
}
