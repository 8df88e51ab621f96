//! HTTP protocol layer module
//!
//! Protocol helpers with no knowledge of registries: content types,
//! conditional and range requests, URL paths and response builders.

pub mod cache;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{resolve_range, ByteRange};
pub use response::{
    build_400_response, build_403_response, build_404_response, build_405_response,
    build_500_response, build_json_response, build_redirect_response, without_body, HttpResponse,
    ResponseBody,
};
