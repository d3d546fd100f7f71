//! Minimal XPath evaluation over an [`XmlDoc`].
//!
//! Supports absolute location paths made of child steps, such as
//! `/s:Envelope/s:Body/n1:Method_OUTPUT/n1:ReturnValue`. A step may carry a
//! positional predicate (`[2]`, 1-based); the last step may also be
//! `@attr` or `text()`. Prefixes resolve against the declarations in the
//! document first and the well-known prefix table second. Unprefixed steps
//! match on local name only.

use xmltree::{Element, XMLNode};

use super::{node_text, XmlDoc};
use crate::constants::namespace_for;

#[derive(Debug, PartialEq)]
enum Step<'a> {
    Child {
        prefix: Option<&'a str>,
        name: &'a str,
        position: usize,
    },
    Attribute(&'a str),
    Text,
}

fn parse_step(raw: &str) -> Option<Step<'_>> {
    if raw == "text()" {
        return Some(Step::Text);
    }
    if let Some(attr) = raw.strip_prefix('@') {
        return Some(Step::Attribute(attr));
    }

    let (qname, position) = match raw.find('[') {
        Some(open) => {
            let predicate = raw[open + 1..].strip_suffix(']')?;
            let position: usize = predicate.trim().parse().ok()?;
            if position == 0 {
                return None;
            }
            (&raw[..open], position)
        }
        None => (raw, 1),
    };

    let (prefix, name) = match qname.split_once(':') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, qname),
    };
    if name.is_empty() {
        return None;
    }
    Some(Step::Child {
        prefix,
        name,
        position,
    })
}

/// Resolve a prefix using the declarations on `scope`, then the well-known table.
fn resolve_prefix(scope: &Element, prefix: &str) -> Option<String> {
    scope
        .namespaces
        .as_ref()
        .and_then(|ns| ns.get(prefix))
        .map(str::to_string)
        .or_else(|| namespace_for(prefix).map(str::to_string))
}

fn step_matches(elem: &Element, namespace: Option<&str>, name: &str) -> bool {
    elem.name == name && namespace.map_or(true, |ns| elem.namespace.as_deref() == Some(ns))
}

/// Evaluate `expr` against `doc` and return the string value of the
/// selected node, or `None` when nothing matches.
pub fn evaluate(doc: &XmlDoc, expr: &str) -> Option<String> {
    let path = expr.trim().strip_prefix('/')?;
    let steps = path
        .split('/')
        .map(parse_step)
        .collect::<Option<Vec<_>>>()?;

    let mut current: Option<&Element> = None;
    for (i, step) in steps.iter().enumerate() {
        let last = i + 1 == steps.len();
        match step {
            Step::Child {
                prefix,
                name,
                position,
            } => {
                let scope = current.unwrap_or_else(|| doc.root());
                let namespace = match prefix {
                    Some(prefix) => Some(resolve_prefix(scope, prefix)?),
                    None => None,
                };
                let ns = namespace.as_deref();
                current = match current {
                    None => {
                        let root = doc.root();
                        (*position == 1 && step_matches(root, ns, name)).then_some(root)
                    }
                    Some(parent) => parent
                        .children
                        .iter()
                        .filter_map(XMLNode::as_element)
                        .filter(|e| step_matches(e, ns, name))
                        .nth(position - 1),
                };
                current?;
            }
            Step::Attribute(attr) if last => {
                return current?.attributes.get(*attr).cloned();
            }
            Step::Text if last => {
                return node_text(current?);
            }
            _ => return None,
        }
    }

    current.map(|elem| node_text(elem).unwrap_or_default())
}
