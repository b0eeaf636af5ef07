//! HTTP protocol layer module
//!
//! Protocol helpers shared by static file serving and the upstream proxy.

pub mod cache;
pub mod cors;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_501_response, build_json_error,
    build_options_response, build_redirect_response,
};
