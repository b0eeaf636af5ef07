//! Dashboard gateway
//!
//! A single-port HTTP front door for the GPU dashboard: static files from
//! the frontend build directory, with `/api/` requests relayed to the local
//! backend. Every response carries permissive CORS headers.

pub mod cli;
pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

#[cfg(test)]
mod test_support;
