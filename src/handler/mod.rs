//! Request handler module
//!
//! Responsible for request routing dispatch and the registry endpoints:
//! static registry content plus the JSON convenience endpoints.

pub mod endpoints;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::{handle_request, RequestContext, Router};
