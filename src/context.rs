//! Protocol runtime shared by the client and the request builders.

use std::sync::Arc;

use uuid::Uuid;
use xmltree::{Element, Namespace};

use crate::constants::{SOAP_BODY, SOAP_ENVELOPE, SOAP_HEADER, WELL_KNOWN_PREFIXES, XML_NS_SOAP_1_2};
use crate::xml::{add_child, new_element, XmlDoc};

/// Default maximum envelope size advertised to the agent.
pub const DEFAULT_MAX_ENVELOPE_SIZE: u32 = 153_600;

/// WS-Management protocol context.
#[derive(Debug, Clone)]
pub struct WsContext {
    max_envelope_size: Option<u32>,
}

impl Default for WsContext {
    fn default() -> Self {
        Self {
            max_envelope_size: Some(DEFAULT_MAX_ENVELOPE_SIZE),
        }
    }
}

impl WsContext {
    /// Create a context with default settings.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a context with a custom `MaxEnvelopeSize` (`None` omits the header).
    pub fn with_max_envelope_size(size: Option<u32>) -> Arc<Self> {
        Arc::new(Self {
            max_envelope_size: size,
        })
    }

    /// `MaxEnvelopeSize` sent when the options do not override it.
    pub fn max_envelope_size(&self) -> Option<u32> {
        self.max_envelope_size
    }

    /// A fresh `uuid:` message identifier.
    pub fn message_id(&self) -> String {
        format!("uuid:{}", Uuid::new_v4().hyphenated())
    }

    /// Empty SOAP 1.2 envelope with `Header` and `Body`.
    pub fn create_envelope(&self) -> XmlDoc {
        let mut root: Element = new_element(Some(XML_NS_SOAP_1_2), SOAP_ENVELOPE);
        let mut decl = Namespace::empty();
        for (prefix, uri) in WELL_KNOWN_PREFIXES {
            decl.put(*prefix, *uri);
        }
        root.namespaces = Some(decl);
        add_child(&mut root, Some(XML_NS_SOAP_1_2), SOAP_HEADER, None);
        add_child(&mut root, Some(XML_NS_SOAP_1_2), SOAP_BODY, None);
        XmlDoc::from_root(root)
    }
}
