//! HTTP layer module
//!
//! Transport-neutral request and response types, plus the conversion of a
//! finalized response into a hyper response.

pub mod mime;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use request::Request;
pub use response::{
    build_400_response, build_413_response, build_500_response, build_response, Response,
    WireResponse, NOT_FOUND_BODY,
};
