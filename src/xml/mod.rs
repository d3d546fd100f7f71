//! XML document model.
//!
//! Requests and responses are held as owned [`xmltree::Element`] trees wrapped
//! in [`XmlDoc`]. The free functions in this module provide the
//! namespace-qualified lookups and mutations the envelope builders need;
//! mutations that target an existing node return `Option`/`Result` instead of
//! silently doing nothing when the node is absent.

pub mod xpath;

use std::borrow::Cow;

use xmltree::{Element, EmitterConfig, Namespace, XMLNode};

use crate::constants::{
    prefix_for, SOAP_BODY, SOAP_CODE, SOAP_FAULT, SOAP_HEADER, SOAP_REASON, SOAP_SUBCODE,
    SOAP_TEXT, SOAP_VALUE, XML_NS_SOAP_1_2,
};
use crate::error::Result;

/// An owned XML document (SOAP envelope).
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDoc {
    root: Element,
}

impl XmlDoc {
    /// Wrap an existing root element.
    pub fn from_root(root: Element) -> Self {
        Self { root }
    }

    /// Parse a document from raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let root = Element::parse(bytes)?;
        Ok(Self { root })
    }

    /// Serialize the document, without indentation.
    pub fn to_xml_string(&self) -> Result<String> {
        self.write(false)
    }

    /// Serialize the document with indentation, for dumps and CLI output.
    pub fn to_pretty_string(&self) -> Result<String> {
        self.write(true)
    }

    fn write(&self, indent: bool) -> Result<String> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(true)
            .perform_indent(indent)
            .indent_string("  ");
        self.root.write_with_config(&mut buf, config)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// The document element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Mutable access to the document element.
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Consume the document, returning the root element.
    pub fn into_root(self) -> Element {
        self.root
    }

    /// The SOAP `Header` element.
    pub fn header(&self) -> Option<&Element> {
        get_child(&self.root, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_HEADER))
    }

    /// Mutable access to the SOAP `Header` element.
    pub fn header_mut(&mut self) -> Option<&mut Element> {
        get_child_mut(&mut self.root, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_HEADER))
    }

    /// The SOAP `Body` element.
    pub fn body(&self) -> Option<&Element> {
        get_child(&self.root, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_BODY))
    }

    /// Mutable access to the SOAP `Body` element.
    pub fn body_mut(&mut self) -> Option<&mut Element> {
        get_child_mut(&mut self.root, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_BODY))
    }

    /// First element child of the body, whatever its name.
    pub fn body_first_child(&self) -> Option<&Element> {
        self.body().and_then(|body| get_child(body, 0, None, None))
    }

    /// Whether the body carries a SOAP fault.
    pub fn is_fault(&self) -> bool {
        self.fault().is_some()
    }

    fn fault(&self) -> Option<&Element> {
        self.body()
            .and_then(|body| get_child(body, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_FAULT)))
    }

    /// `Fault/Code/Subcode/Value` text, e.g. `wsman:InvalidSelectors`.
    pub fn fault_subcode(&self) -> Option<String> {
        let code = get_child(self.fault()?, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_CODE))?;
        let subcode = get_child(code, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_SUBCODE))?;
        let value = get_child(subcode, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_VALUE))?;
        node_text(value)
    }

    /// `Fault/Reason/Text` text.
    pub fn fault_reason(&self) -> Option<String> {
        let reason = get_child(self.fault()?, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_REASON))?;
        let text = get_child(reason, 0, Some(XML_NS_SOAP_1_2), Some(SOAP_TEXT))?;
        node_text(text)
    }

    /// Evaluate an XPath location path and return the selected value.
    pub fn xpath_value(&self, expr: &str) -> Option<String> {
        xpath::evaluate(self, expr)
    }
}

/// Whether an element matches an optional namespace and optional local name.
fn matches(elem: &Element, ns: Option<&str>, name: Option<&str>) -> bool {
    let ns_ok = ns.map_or(true, |ns| elem.namespace.as_deref() == Some(ns));
    let name_ok = name.map_or(true, |name| elem.name == name);
    ns_ok && name_ok
}

/// The `index`-th element child matching `ns` and `name` (`None` = any).
pub fn get_child<'a>(
    parent: &'a Element,
    index: usize,
    ns: Option<&str>,
    name: Option<&str>,
) -> Option<&'a Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(|e| matches(e, ns, name))
        .nth(index)
}

/// Mutable variant of [`get_child`].
pub fn get_child_mut<'a>(
    parent: &'a mut Element,
    index: usize,
    ns: Option<&str>,
    name: Option<&str>,
) -> Option<&'a mut Element> {
    parent
        .children
        .iter_mut()
        .filter_map(XMLNode::as_mut_element)
        .filter(|e| matches(e, ns, name))
        .nth(index)
}

/// Depth-first search for the first descendant matching `ns` and `name`.
pub fn find_descendant<'a>(
    parent: &'a Element,
    ns: Option<&str>,
    name: Option<&str>,
) -> Option<&'a Element> {
    for child in parent.children.iter().filter_map(XMLNode::as_element) {
        if matches(child, ns, name) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, ns, name) {
            return Some(found);
        }
    }
    None
}

/// Create a detached element in `ns`.
///
/// Well-known namespaces get their registered prefix; any other namespace is
/// declared as the element's default namespace.
pub fn new_element(ns: Option<&str>, name: &str) -> Element {
    let mut elem = Element::new(name);
    if let Some(ns) = ns {
        elem.namespace = Some(ns.to_string());
        match prefix_for(ns) {
            Some(prefix) => elem.prefix = Some(prefix.to_string()),
            None => {
                let mut decl = Namespace::empty();
                decl.put("", ns);
                elem.namespaces = Some(decl);
            }
        }
    }
    elem
}

/// Append a child element and return it.
pub fn add_child<'a>(
    parent: &'a mut Element,
    ns: Option<&str>,
    name: &str,
    text: Option<&str>,
) -> &'a mut Element {
    let mut child = new_element(ns, name);
    if let Some(text) = text {
        child.children.push(XMLNode::Text(text.to_string()));
    }
    append_element(parent, child)
}

/// Append a child that declares `ns` as its default namespace, whether or
/// not the namespace has a well-known prefix.
pub fn add_child_default_ns<'a>(
    parent: &'a mut Element,
    ns: &str,
    name: &str,
    text: Option<&str>,
) -> &'a mut Element {
    let mut child = Element::new(name);
    child.namespace = Some(ns.to_string());
    let mut decl = Namespace::empty();
    decl.put("", ns);
    child.namespaces = Some(decl);
    if let Some(text) = text {
        child.children.push(XMLNode::Text(text.to_string()));
    }
    append_element(parent, child)
}

/// Append a child in no namespace that inherits the parent's default
/// namespace (used for method and resource property elements).
pub fn add_inherited_child<'a>(
    parent: &'a mut Element,
    name: &str,
    text: Option<&str>,
) -> &'a mut Element {
    let mut child = Element::new(name);
    child.namespace = parent.namespace.clone();
    if let Some(text) = text {
        child.children.push(XMLNode::Text(text.to_string()));
    }
    append_element(parent, child)
}

/// Append an already-built element (e.g. a duplicated subtree) and return it.
pub fn append_element(parent: &mut Element, child: Element) -> &mut Element {
    let idx = parent.children.len();
    parent.children.push(XMLNode::Element(child));
    match &mut parent.children[idx] {
        XMLNode::Element(elem) => elem,
        _ => unreachable!("element was just pushed"),
    }
}

/// Add (or replace) an attribute on an element.
pub fn set_attr(elem: &mut Element, name: &str, value: &str) {
    elem.attributes.insert(name.to_string(), value.to_string());
}

/// Replace the text content of an element.
pub fn set_text(elem: &mut Element, text: &str) {
    elem.children
        .retain(|n| !matches!(n, XMLNode::Text(_) | XMLNode::CData(_)));
    elem.children.push(XMLNode::Text(text.to_string()));
}

/// Text content of an element, `None` when it has none.
pub fn node_text(elem: &Element) -> Option<String> {
    elem.get_text().map(Cow::into_owned)
}

/// Local name of an element.
pub fn local_name(elem: &Element) -> &str {
    &elem.name
}

/// Namespace URI of an element.
pub fn namespace_uri(elem: &Element) -> Option<&str> {
    elem.namespace.as_deref()
}
