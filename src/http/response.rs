//! Terminal responses generated at the edge.

/// Body returned for every rejected request.
pub const UNAUTHORIZED_BODY: &str = "Unauthorized. Please sign in to access this content.";

/// A response returned instead of forwarding the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeResponse {
    /// HTTP status code.
    pub status: u16,

    /// Reason phrase.
    pub status_description: &'static str,

    /// Response headers as `(name, value)`.
    pub headers: Vec<(&'static str, &'static str)>,

    /// Plain-text body.
    pub body: &'static str,
}

impl EdgeResponse {
    /// The fixed 401 response. Identical for every rejection cause.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            status_description: "Unauthorized",
            headers: vec![
                ("content-type", "text/plain; charset=utf-8"),
                ("cache-control", "no-store"),
            ],
            body: UNAUTHORIZED_BODY,
        }
    }

    /// First header with `name`, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}
