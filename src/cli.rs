//! Command-line arguments.

use clap::Parser;

use crate::config::DEFAULT_CONFIG_PATH;

/// Serve the dashboard build and proxy API calls to the backend.
#[derive(Parser, Debug)]
#[command(name = "dashboard-gateway")]
#[command(version, about = "Serve the dashboard build and proxy /api/ requests to the backend")]
pub struct Cli {
    /// Port to listen on (default 8011)
    pub port: Option<u16>,

    /// Configuration file, extension optional; a missing file is not an error
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}
