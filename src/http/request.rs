//! Inbound request abstraction.
//!
//! The filter only needs to read the method, path and cookies of a request
//! and to attach headers to it. [`EdgeRequest`] captures exactly that, so an
//! edge runtime can plug in its own request type.

/// Capabilities the authorizer needs from an inbound request.
pub trait EdgeRequest {
    /// HTTP method, e.g. `GET`.
    fn method(&self) -> &str;

    /// Request path, e.g. `/product-a/content/123`.
    fn path(&self) -> &str;

    /// Raw `Cookie` header values, in arrival order.
    fn cookie_headers(&self) -> Vec<&str>;

    /// First header with `name`, ignoring case.
    fn header(&self, name: &str) -> Option<&str>;

    /// Set a header, replacing every existing header with the same name.
    fn set_header(&mut self, name: &str, value: String);

    /// All cookies as `(name, value)` pairs across every `Cookie` header.
    fn cookies(&self) -> Vec<(&str, &str)> {
        self.cookie_headers()
            .into_iter()
            .flat_map(|header| parse_cookie_header(header))
            .collect()
    }
}

/// Split a `Cookie` header value into `(name, value)` pairs.
///
/// Pairs are separated by `;` and trimmed. Entries without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> impl Iterator<Item = (&str, &str)> {
    header.split(';').filter_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        Some((name.trim(), value.trim()))
    })
}

/// Owned request as handed over by the edge runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRequest {
    /// HTTP method.
    pub method: String,

    /// Request path without host.
    pub path: String,

    /// Raw `Cookie` header values.
    pub cookies: Vec<String>,

    /// Other headers as `(name, value)`; names are compared case-insensitively.
    pub headers: Vec<(String, String)>,
}

impl ResourceRequest {
    /// Create a request with no cookies or headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a raw `Cookie` header value.
    pub fn with_cookie(mut self, cookie_header: impl Into<String>) -> Self {
        self.cookies.push(cookie_header.into());
        self
    }

    /// Add a header without replacing existing ones.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl EdgeRequest for ResourceRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn cookie_headers(&self) -> Vec<&str> {
        self.cookies.iter().map(String::as_str).collect()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_ascii_lowercase(), value));
    }
}
