//! Namespace URIs, action names and element names used on the wire.
//!
//! The values follow the DMTF WS-Management 1.0 standard and the
//! WS-Addressing / WS-Transfer / WS-Enumeration submissions it builds on.

// ============================================================================
// Namespaces
// ============================================================================

/// SOAP 1.2 envelope namespace
pub const XML_NS_SOAP_1_2: &str = "http://www.w3.org/2003/05/soap-envelope";

/// WS-Addressing namespace
pub const XML_NS_ADDRESSING: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";

/// WS-Management namespace
pub const XML_NS_WS_MAN: &str = "http://schemas.dmtf.org/wbem/wsman/1/wsman.xsd";

/// WS-Enumeration namespace
pub const XML_NS_ENUMERATION: &str = "http://schemas.xmlsoap.org/ws/2004/09/enumeration";

/// WS-Transfer namespace
pub const XML_NS_TRANSFER: &str = "http://schemas.xmlsoap.org/ws/2004/09/transfer";

/// WS-Management identity namespace
pub const XML_NS_WSMAN_ID: &str =
    "http://schemas.dmtf.org/wbem/wsman/identity/1/wsmanidentity.xsd";

/// WS-CIM binding namespace (polymorphism modes)
pub const XML_NS_CIM_BINDING: &str = "http://schemas.dmtf.org/wbem/wsman/1/cimbinding.xsd";

/// XML Schema instance namespace
pub const XML_NS_SCHEMA_INSTANCE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Anonymous reply-to address
pub const WSA_TO_ANONYMOUS: &str =
    "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Well-known namespace prefixes, declared on every envelope root.
pub const WELL_KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("s", XML_NS_SOAP_1_2),
    ("wsa", XML_NS_ADDRESSING),
    ("wsman", XML_NS_WS_MAN),
    ("wsen", XML_NS_ENUMERATION),
    ("wxf", XML_NS_TRANSFER),
    ("wsmid", XML_NS_WSMAN_ID),
    ("wsmb", XML_NS_CIM_BINDING),
    ("xsi", XML_NS_SCHEMA_INSTANCE),
];

/// Look up the well-known prefix for a namespace URI.
pub fn prefix_for(namespace: &str) -> Option<&'static str> {
    WELL_KNOWN_PREFIXES
        .iter()
        .find(|(_, uri)| *uri == namespace)
        .map(|(prefix, _)| *prefix)
}

/// Look up the namespace URI bound to a well-known prefix.
pub fn namespace_for(prefix: &str) -> Option<&'static str> {
    WELL_KNOWN_PREFIXES
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, uri)| *uri)
}

// ============================================================================
// SOAP
// ============================================================================

pub const SOAP_ENVELOPE: &str = "Envelope";
pub const SOAP_HEADER: &str = "Header";
pub const SOAP_BODY: &str = "Body";
pub const SOAP_FAULT: &str = "Fault";
pub const SOAP_CODE: &str = "Code";
pub const SOAP_SUBCODE: &str = "Subcode";
pub const SOAP_VALUE: &str = "Value";
pub const SOAP_REASON: &str = "Reason";
pub const SOAP_TEXT: &str = "Text";
pub const SOAP_MUST_UNDERSTAND: &str = "s:mustUnderstand";

// ============================================================================
// WS-Addressing headers
// ============================================================================

pub const WSA_TO: &str = "To";
pub const WSA_ACTION: &str = "Action";
pub const WSA_REPLY_TO: &str = "ReplyTo";
pub const WSA_ADDRESS: &str = "Address";
pub const WSA_MESSAGE_ID: &str = "MessageID";

// ============================================================================
// WS-Management headers
// ============================================================================

pub const WSM_RESOURCE_URI: &str = "ResourceURI";
pub const WSM_SELECTOR_SET: &str = "SelectorSet";
pub const WSM_SELECTOR: &str = "Selector";
pub const WSM_NAME: &str = "Name";
pub const WSM_MAX_ENVELOPE_SIZE: &str = "MaxEnvelopeSize";
pub const WSM_OPERATION_TIMEOUT: &str = "OperationTimeout";
pub const WSM_REQUEST_TOTAL: &str = "RequestTotalItemsCountEstimate";
pub const WSM_OPTIMIZE_ENUM: &str = "OptimizeEnumeration";
pub const WSM_ENUM_MODE: &str = "EnumerationMode";
pub const WSM_ENUM_EPR: &str = "EnumerateEPR";
pub const WSM_ENUM_OBJ_AND_EPR: &str = "EnumerateObjectAndEPR";
pub const WSM_ITEMS: &str = "Items";

/// Selector carrying the CIM namespace of the target instance
pub const CIM_NAMESPACE_SELECTOR: &str = "__cimnamespace";

// ============================================================================
// WS-CIM binding
// ============================================================================

pub const WSMB_POLYMORPHISM_MODE: &str = "PolymorphismMode";
pub const WSMB_INCLUDE_SUBCLASS_PROP: &str = "IncludeSubClassProperties";
pub const WSMB_EXCLUDE_SUBCLASS_PROP: &str = "ExcludeSubClassProperties";
pub const WSMB_POLYMORPHISM_NONE: &str = "None";

// ============================================================================
// WS-Transfer
// ============================================================================

pub const TRANSFER_GET: &str = "Get";
pub const TRANSFER_PUT: &str = "Put";
pub const TRANSFER_CREATE: &str = "Create";

// ============================================================================
// WS-Enumeration
// ============================================================================

pub const WSENUM_ENUMERATE: &str = "Enumerate";
pub const WSENUM_PULL: &str = "Pull";
pub const WSENUM_RELEASE: &str = "Release";
pub const WSENUM_ENUMERATE_RESP: &str = "EnumerateResponse";
pub const WSENUM_PULL_RESP: &str = "PullResponse";
pub const WSENUM_ENUMERATION_CONTEXT: &str = "EnumerationContext";
pub const WSENUM_END_OF_SEQUENCE: &str = "EndOfSequence";
pub const WSENUM_MAX_ELEMENTS: &str = "MaxElements";
pub const WSENUM_ITEMS: &str = "Items";
pub const WSENUM_FILTER: &str = "Filter";
pub const WSENUM_DIALECT: &str = "Dialect";

// ============================================================================
// WS-Management identify
// ============================================================================

pub const WSMID_IDENTIFY: &str = "Identify";
pub const WSMID_IDENTIFY_RESPONSE: &str = "IdentifyResponse";
