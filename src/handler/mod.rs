//! Request handler module
//!
//! Request dispatch plus its two behaviors: static file serving and the
//! upstream proxy for the reserved prefix.

pub mod proxy;
pub mod router;
pub mod static_files;

// Re-export main entry points
pub use proxy::{ProxyError, Upstream, UpstreamResponse};
pub use router::Dispatcher;
pub use static_files::{DirectoryFiles, StaticFiles};
