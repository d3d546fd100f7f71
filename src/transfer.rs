//! WS-Transfer (Get/Put/Create) and custom method request builders.
//!
//! These build request envelopes only; [`crate::client::WsManClient`] drives
//! the exchanges.

use xmltree::Element;

use crate::constants::{TRANSFER_CREATE, TRANSFER_GET, TRANSFER_PUT, WSA_TO_ANONYMOUS, XML_NS_TRANSFER};
use crate::context::WsContext;
use crate::envelope::{apply_cim_namespace, apply_selectors, build_envelope, make_action};
use crate::error::{Error, Result};
use crate::options::{remove_query_string, ActionOptions, Properties};
use crate::xml::{
    add_child_default_ns, add_inherited_child, append_element, get_child_mut, set_text, XmlDoc,
};

/// Last `/`-separated segment of a URI or method name, ignoring trailing `/`.
pub fn last_segment(s: &str) -> &str {
    let trimmed = s.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Build the envelope shared by every transfer request: headers, selectors
/// and the CIM namespace selector.
fn base_request(
    ctx: &WsContext,
    endpoint: &str,
    action: &str,
    resource_uri: &str,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let mut doc = build_envelope(
        ctx,
        action,
        Some(WSA_TO_ANONYMOUS),
        &[],
        Some(resource_uri),
        endpoint,
        options,
    )?;
    apply_selectors(&mut doc, options)?;
    apply_cim_namespace(&mut doc, options)?;
    Ok(doc)
}

fn non_empty(props: Option<&Properties>) -> Option<&Properties> {
    props.filter(|p| !p.is_empty())
}

/// Append `<name xmlns="ns">` to the body with one child per property.
fn add_property_element(
    doc: &mut XmlDoc,
    ns: &str,
    name: &str,
    props: &Properties,
) -> Result<()> {
    let body = doc
        .body_mut()
        .ok_or_else(|| Error::MissingNode("Body".to_string()))?;
    let node = add_child_default_ns(body, ns, name, None);
    for (key, value) in props {
        add_inherited_child(node, key, Some(value));
    }
    Ok(())
}

/// WS-Transfer `Get` request.
pub fn get_request(
    ctx: &WsContext,
    endpoint: &str,
    resource_uri: &str,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let action = make_action(XML_NS_TRANSFER, TRANSFER_GET);
    base_request(ctx, endpoint, &action, resource_uri, options)
}

/// WS-Transfer `Put` request built from a previous `Get` response.
///
/// The first child of the Get response body is deep-copied into the Put body
/// and every property in `options.properties` overwrites the text of the
/// same-named child, looked up in the copied node's namespace.
pub fn put_request(
    ctx: &WsContext,
    endpoint: &str,
    resource_uri: &str,
    get_response: &XmlDoc,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let action = make_action(XML_NS_TRANSFER, TRANSFER_PUT);
    let mut doc = base_request(ctx, endpoint, &action, resource_uri, options)?;
    let props = non_empty(options.properties.as_ref());

    let resource: Option<Element> = get_response.body_first_child().cloned();
    let Some(mut resource) = resource else {
        return match props.and_then(|p| p.keys().next()) {
            Some(key) => Err(Error::MissingNode(key.clone())),
            None => Ok(doc),
        };
    };

    if let Some(props) = props {
        let ns = resource.namespace.clone();
        for (key, value) in props {
            let node = get_child_mut(&mut resource, 0, ns.as_deref(), Some(key))
                .ok_or_else(|| Error::MissingNode(key.clone()))?;
            set_text(node, value);
        }
    }

    let body = doc
        .body_mut()
        .ok_or_else(|| Error::MissingNode("Body".to_string()))?;
    append_element(body, resource);
    Ok(doc)
}

/// WS-Transfer `Create` request.
///
/// The body carries an element named after the resource class (the last
/// segment of the resource URI) in the resource URI namespace, with one child
/// per property.
pub fn create_request(
    ctx: &WsContext,
    endpoint: &str,
    resource_uri: &str,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let (bare, _) = remove_query_string(resource_uri);
    let class_name = last_segment(&bare);
    if class_name.is_empty() {
        return Err(Error::InvalidUri {
            uri: resource_uri.to_string(),
            message: "no class name in resource URI".to_string(),
        });
    }
    let action = make_action(XML_NS_TRANSFER, TRANSFER_CREATE);
    let mut doc = base_request(ctx, endpoint, &action, &bare, options)?;
    let empty = Properties::new();
    let props = options.properties.as_ref().unwrap_or(&empty);
    add_property_element(&mut doc, &bare, class_name, props)?;
    Ok(doc)
}

/// Custom method invocation request.
///
/// A method containing `/` is taken as the full action URI; otherwise the
/// action is `<resource_uri>/<method>`. An `<Method>_INPUT` element is only
/// added when at least one property is supplied.
pub fn invoke_request(
    ctx: &WsContext,
    endpoint: &str,
    resource_uri: &str,
    method: &str,
    options: &ActionOptions,
) -> Result<XmlDoc> {
    let (bare, _) = remove_query_string(resource_uri);
    let action = if method.contains('/') {
        method.to_string()
    } else {
        make_action(&bare, method)
    };
    let mut doc = base_request(ctx, endpoint, &action, &bare, options)?;

    if let Some(props) = non_empty(options.properties.as_ref()) {
        let input = format!("{}_INPUT", last_segment(method));
        add_property_element(&mut doc, &bare, &input, props)?;
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{get_child, node_text};
    use pretty_assertions::assert_eq;

    const ENDPOINT: &str = "http://localhost:8889/wsman";
    const FAN: &str = "http://schemas.dmtf.org/wbem/wscim/1/cim-schema/2/CIM_Fan";

    fn get_response() -> XmlDoc {
        let xml = format!(
            r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope" xmlns:p="{FAN}">
  <s:Header/>
  <s:Body>
    <p:CIM_Fan>
      <p:DeviceID>fan0</p:DeviceID>
      <p:DesiredSpeed>1000</p:DesiredSpeed>
    </p:CIM_Fan>
  </s:Body>
</s:Envelope>"#
        );
        XmlDoc::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment(FAN), "CIM_Fan");
        assert_eq!(last_segment("Reboot"), "Reboot");
        assert_eq!(last_segment("http://x/CIM_Fan/"), "CIM_Fan");
        assert_eq!(last_segment("http://x/CIM_Fan//"), "CIM_Fan");
    }

    #[test]
    fn test_create_request_trailing_slash() {
        let uri = format!("{FAN}/");
        let doc = create_request(&WsContext::new(), ENDPOINT, &uri, &ActionOptions::new()).unwrap();
        let body = doc.body_first_child().unwrap();
        assert_eq!(body.name, "CIM_Fan");
        assert_eq!(body.namespace.as_deref(), Some(uri.as_str()));
        assert!(doc.to_pretty_string().is_ok());
    }

    #[test]
    fn test_create_request_without_class_name() {
        for uri in ["/", "///", "?Name=fan0"] {
            let err = create_request(&WsContext::new(), ENDPOINT, uri, &ActionOptions::new())
                .unwrap_err();
            assert!(matches!(err, Error::InvalidUri { .. }), "{uri}");
        }
    }

    #[test]
    fn test_get_request_action() {
        let doc = get_request(&WsContext::new(), ENDPOINT, FAN, &ActionOptions::new()).unwrap();
        assert_eq!(
            doc.xpath_value("/s:Envelope/s:Header/wsa:Action").as_deref(),
            Some("http://schemas.xmlsoap.org/ws/2004/09/transfer/Get")
        );
        assert_eq!(
            doc.xpath_value("/s:Envelope/s:Header/wsman:ResourceURI").as_deref(),
            Some(FAN)
        );
        assert!(doc.body_first_child().is_none());
    }

    #[test]
    fn test_put_request_updates_copy() {
        let response = get_response();
        let mut opts = ActionOptions::new();
        opts.add_property("DesiredSpeed", "2000");

        let put = put_request(&WsContext::new(), ENDPOINT, FAN, &response, &opts).unwrap();
        let resource = put.body_first_child().unwrap();
        let speed = get_child(resource, 0, Some(FAN), Some("DesiredSpeed")).unwrap();
        assert_eq!(node_text(speed).as_deref(), Some("2000"));

        // The Get response is untouched
        let original = response.body_first_child().unwrap();
        let speed = get_child(original, 0, Some(FAN), Some("DesiredSpeed")).unwrap();
        assert_eq!(node_text(speed).as_deref(), Some("1000"));
    }

    #[test]
    fn test_put_request_missing_property() {
        let mut opts = ActionOptions::new();
        opts.add_property("Bogus", "1");
        let err = put_request(&WsContext::new(), ENDPOINT, FAN, &get_response(), &opts).unwrap_err();
        assert!(matches!(err, Error::MissingNode(name) if name == "Bogus"));
    }

    #[test]
    fn test_put_request_without_resource_node() {
        let empty = WsContext::new().create_envelope();
        let mut opts = ActionOptions::new();
        let put = put_request(&WsContext::new(), ENDPOINT, FAN, &empty, &opts).unwrap();
        assert!(put.body_first_child().is_none());

        opts.add_property("DesiredSpeed", "1");
        let err = put_request(&WsContext::new(), ENDPOINT, FAN, &empty, &opts).unwrap_err();
        assert!(matches!(err, Error::MissingNode(_)));
    }

    #[test]
    fn test_create_request() {
        let mut opts = ActionOptions::new();
        opts.add_property("DeviceID", "fan1");
        let doc = create_request(&WsContext::new(), ENDPOINT, FAN, &opts).unwrap();
        let resource = doc.body_first_child().unwrap();
        assert_eq!(resource.name, "CIM_Fan");
        assert_eq!(resource.namespace.as_deref(), Some(FAN));
        let id = get_child(resource, 0, Some(FAN), Some("DeviceID")).unwrap();
        assert_eq!(node_text(id).as_deref(), Some("fan1"));
    }

    #[test]
    fn test_invoke_request_with_properties() {
        let mut opts = ActionOptions::new();
        opts.add_property("GetRequest", "TRUE");
        let uri = format!("{FAN}?DeviceID=fan0");
        let doc =
            invoke_request(&WsContext::new(), ENDPOINT, &uri, "SetSpeed", &opts).unwrap();
        assert_eq!(
            doc.xpath_value("/s:Envelope/s:Header/wsa:Action"),
            Some(format!("{FAN}/SetSpeed"))
        );
        assert_eq!(
            doc.xpath_value("/s:Envelope/s:Header/wsman:ResourceURI"),
            Some(FAN.to_string())
        );
        let input = doc.body_first_child().unwrap();
        assert_eq!(input.name, "SetSpeed_INPUT");
        assert_eq!(input.namespace.as_deref(), Some(FAN));
        assert!(input.prefix.is_none());
        let arg = get_child(input, 0, None, Some("GetRequest")).unwrap();
        assert_eq!(node_text(arg).as_deref(), Some("TRUE"));

        let xml = doc.to_xml_string().unwrap();
        assert!(xml.contains(&format!(r#"<SetSpeed_INPUT xmlns="{FAN}">"#)));
        assert!(xml.contains("<GetRequest>TRUE</GetRequest>"));
    }

    #[test]
    fn test_invoke_request_without_properties() {
        let doc = invoke_request(&WsContext::new(), ENDPOINT, FAN, "Reset", &ActionOptions::new())
            .unwrap();
        assert!(doc.body_first_child().is_none());

        let mut opts = ActionOptions::new();
        opts.properties = Some(Properties::new());
        let doc = invoke_request(&WsContext::new(), ENDPOINT, FAN, "Reset", &opts).unwrap();
        assert!(doc.body_first_child().is_none());
    }

    #[test]
    fn test_invoke_request_qualified_method() {
        let action = "http://example.com/actions/Reset";
        let mut opts = ActionOptions::new();
        opts.add_property("Force", "true");
        let doc = invoke_request(&WsContext::new(), ENDPOINT, FAN, action, &opts).unwrap();
        assert_eq!(
            doc.xpath_value("/s:Envelope/s:Header/wsa:Action").as_deref(),
            Some(action)
        );
        assert_eq!(doc.body_first_child().unwrap().name, "Reset_INPUT");
    }
}
