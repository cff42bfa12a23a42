//! Typed request and response abstraction for the edge runtime.

pub mod request;
pub mod response;

pub use request::{parse_cookie_header, EdgeRequest, ResourceRequest};
pub use response::EdgeResponse;
