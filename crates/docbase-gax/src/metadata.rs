//! Outgoing call metadata.
//!
//! Two kinds of metadata ride along with every call:
//!
//! - client identity (`x-goog-api-client`), computed once per client by
//!   [`ClientInfo`]
//! - request routing (`x-goog-request-params`), derived per call from the
//!   request's [`RoutingParams`]

/// Header carrying client and library identity.
pub const API_CLIENT_HEADER: &str = "x-goog-api-client";

/// Header carrying request routing parameters.
pub const REQUEST_PARAMS_HEADER: &str = "x-goog-request-params";

/// Version of this invocation layer.
pub const GAX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported Rust version the workspace is built against.
pub const RUST_VERSION: &str = env!("CARGO_PKG_RUST_VERSION");

/// Ordered multimap of lower-cased header names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pairs: Vec<(String, String)>,
}

impl Metadata {
    /// Empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut md = Self::new();
        for (k, v) in pairs {
            md.insert(k, v);
        }
        md
    }

    /// Appends a pair. Keys are lower-cased.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs
            .push((key.into().to_ascii_lowercase(), value.into()));
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Appends all pairs of `other`.
    pub fn extend(&mut self, other: &Metadata) {
        self.pairs.extend(other.pairs.iter().cloned());
    }

    /// Iterates over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Client and library identity, rendered into [`API_CLIENT_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pairs: Vec<(String, String)>,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientInfo {
    /// Identity starting with the Rust toolchain and this layer's version.
    pub fn new() -> Self {
        Self {
            pairs: vec![("gl-rust".to_string(), RUST_VERSION.to_string())],
        }
    }

    /// Adds a `name/version` tag.
    pub fn with(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.pairs.push((name.into(), version.into()));
        self
    }

    /// The header value: space-separated `name/version` tags, with the
    /// `gax` tag last.
    pub fn header_value(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("gax", GAX_VERSION)))
            .map(|(k, v)| format!("{k}/{v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Metadata carrying the identity header.
    pub fn metadata(&self) -> Metadata {
        Metadata::from_pairs([(API_CLIENT_HEADER, self.header_value())])
    }
}

/// Requests that name the resource the server should route on.
pub trait RoutingParams {
    /// `(field, value)` pairs, e.g. `("database", "projects/p/databases/d")`.
    fn routing_params(&self) -> Vec<(&'static str, String)>;
}

/// Builds the routing metadata for a request.
///
/// Values are query-escaped; fields with empty values are skipped. Returns
/// empty metadata when there is nothing to route on.
pub fn routing_metadata<R: RoutingParams + ?Sized>(request: &R) -> Metadata {
    let params: Vec<String> = request
        .routing_params()
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={}", query_escape(&v)))
        .collect();

    if params.is_empty() {
        return Metadata::new();
    }
    Metadata::from_pairs([(REQUEST_PARAMS_HEADER, params.join("&"))])
}

/// Escapes `value` for use as a URL query component.
///
/// Unreserved characters are kept, space becomes `+`, everything else is
/// percent-encoded with upper-case hex.
pub fn query_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
