//! Logger module
//!
//! Provides logging utilities for the gateway:
//! - Startup banner and shutdown notice
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{version_label, AccessLogEntry};

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(
        config.access_log_file.as_deref(),
        config.error_log_file.as_deref(),
    )
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let port = addr.port();
    let hostname = config
        .tunnel
        .hostname
        .as_deref()
        .unwrap_or("<your-hostname>");

    write_info(&format!("Dashboard gateway running on http://localhost:{port}"));
    write_info(&format!("  Listening on: {addr}"));
    write_info(&format!(
        "  Frontend: static files from {}/",
        config.static_files.root.trim_end_matches('/')
    ));
    write_info(&format!(
        "  API proxy: {}* -> {}",
        config.upstream.prefix, config.upstream.base_url
    ));
    if let Some(workers) = config.server.workers {
        write_info(&format!("  Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("  Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("  Error log: {path}"));
    }
    write_info(&format!("\nUse this port in your tunnel: {port}"));
    write_info(&format!("  {hostname}/* -> localhost:{port}"));
    write_info("");
}

pub fn log_shutdown() {
    write_info("\nShutting down...");
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    write_error(&format!("[ERROR] Failed to serve connection: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}
