//! Per-request options: selectors, properties, flags and filters.

use bitflags::bitflags;
use indexmap::IndexMap;
use tracing::debug;
use url::Url;

/// Selector key/value pairs identifying a resource instance.
pub type Selectors = IndexMap<String, String>;

/// Resource property or method parameter values.
pub type Properties = IndexMap<String, String>;

bitflags! {
    /// Request-shaping flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u32 {
        /// Ask for `wsman:RequestTotalItemsCountEstimate`.
        const ENUMERATION_COUNT_ESTIMATION = 1 << 0;
        /// Ask for optimized enumeration (items in the Enumerate response).
        const ENUMERATION_OPTIMIZATION = 1 << 1;
        /// Enumerate endpoint references only.
        const ENUMERATION_ENUM_EPR = 1 << 2;
        /// Enumerate objects together with their endpoint references.
        const ENUMERATION_ENUM_OBJ_AND_EPR = 1 << 3;
        /// Log the serialized request before it is sent.
        const DUMP_REQUEST = 1 << 4;
        /// Polymorphism mode `IncludeSubClassProperties`.
        const INCLUDE_SUBCLASS_PROPERTIES = 1 << 5;
        /// Polymorphism mode `ExcludeSubClassProperties`.
        const EXCLUDE_SUBCLASS_PROPERTIES = 1 << 6;
        /// Polymorphism mode `None`.
        const POLYMORPHISM_NONE = 1 << 7;
    }
}

/// Options attached to a single WS-Management action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOptions {
    /// Selector set applied to the request header
    pub selectors: Option<Selectors>,
    /// Properties for Put/Create or input parameters for Invoke
    pub properties: Option<Properties>,
    /// Request-shaping flags
    pub flags: ActionFlags,
    /// Enumeration filter expression
    pub filter: Option<String>,
    /// Dialect of the filter expression
    pub dialect: Option<String>,
    /// CIM namespace, sent as the `__cimnamespace` selector
    pub cim_ns: Option<String>,
    /// Operation timeout in milliseconds (0 = none)
    pub timeout: u64,
    /// Overrides the context's `MaxEnvelopeSize`
    pub max_envelope_size: Option<u32>,
}

impl ActionOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the empty state, dropping any selectors and properties.
    pub fn destroy(&mut self) {
        *self = Self::default();
    }

    /// Set a flag.
    pub fn with_flags(mut self, flags: ActionFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Set the operation timeout in milliseconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the CIM namespace.
    pub fn with_cim_namespace(mut self, ns: impl Into<String>) -> Self {
        self.cim_ns = Some(ns.into());
        self
    }

    /// Set an enumeration filter and its dialect.
    pub fn with_filter(mut self, filter: impl Into<String>, dialect: Option<String>) -> Self {
        self.filter = Some(filter.into());
        self.dialect = dialect;
        self
    }

    /// Add a single selector.
    pub fn add_selector(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.selectors
            .get_or_insert_with(Selectors::new)
            .insert(name.into(), value.into());
    }

    /// Add a single property.
    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(name.into(), value.into());
    }

    /// Replace the selectors with those parsed from `query` (`k=v&k2=v2`).
    ///
    /// An empty query leaves the current selectors untouched.
    pub fn selectors_from_query_string(&mut self, query: &str) {
        if let Some(map) = parse_query(query) {
            debug!(count = map.len(), "Selectors from query string");
            self.selectors = Some(map);
        }
    }

    /// Replace the selectors with those in the query component of `uri`.
    ///
    /// No-op when the URI does not parse or has no query.
    pub fn selectors_from_uri(&mut self, uri: &str) {
        let query = match Url::parse(uri) {
            Ok(url) => url.query().map(str::to_string),
            Err(e) => {
                debug!(uri, error = %e, "Could not parse resource URI");
                None
            }
        };
        if let Some(query) = query {
            self.selectors_from_query_string(&query);
        }
    }

    /// Replace the properties with those parsed from `query`.
    pub fn properties_from_query_string(&mut self, query: &str) {
        if let Some(map) = parse_query(query) {
            self.properties = Some(map);
        }
    }
}

/// Decode a `k=v&k2=v2` query string. Returns `None` for an empty string.
///
/// Only `%XX` escapes are decoded; a literal `+` stays a `+`.
pub fn parse_query(query: &str) -> Option<IndexMap<String, String>> {
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        return None;
    }
    let query = query.replace('+', "%2B");
    let map: IndexMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(k, _)| !k.is_empty())
        .collect();
    Some(map)
}

/// Split a resource URI into its bare form and its query string, if any.
pub fn remove_query_string(uri: &str) -> (String, Option<String>) {
    match uri.split_once('?') {
        Some((bare, query)) => (bare.to_string(), Some(query.to_string())),
        None => (uri.to_string(), None),
    }
}
