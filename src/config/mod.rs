// Configuration module entry point
// Loads the immutable startup configuration: defaults, optional file, environment, CLI

mod types;

use hyper::Uri;
use std::net::SocketAddr;
use std::time::Duration;

pub use types::{
    Config, LoggingConfig, ServerConfig, StaticFilesConfig, TunnelConfig, UpstreamConfig,
};

/// Default configuration file name (extension optional)
pub const DEFAULT_CONFIG_PATH: &str = "gateway";

impl Config {
    /// Load configuration from the given file path (without extension).
    ///
    /// Sources, lowest priority first: built-in defaults, the file (optional),
    /// `GATEWAY_*` environment variables, then `port_override` from the command line.
    pub fn load_from(config_path: &str, port_override: Option<u16>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("GATEWAY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8011)?
            .set_default("static_files.root", "dist")?
            .set_default(
                "static_files.index_files",
                vec!["index.html".to_string(), "index.htm".to_string()],
            )?
            .set_default("upstream.base_url", "http://127.0.0.1:8010")?
            .set_default("upstream.prefix", "/api/")?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "default")?
            .set_override_option("server.port", port_override)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the dispatcher cannot work with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let uri: Uri = self.upstream.base_url.parse().map_err(|e| {
            config::ConfigError::Message(format!(
                "upstream.base_url '{}' is not a valid URL: {e}",
                self.upstream.base_url
            ))
        })?;
        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(config::ConfigError::Message(format!(
                "upstream.base_url '{}' must be an absolute http:// URL",
                self.upstream.base_url
            )));
        }
        if (uri.path() != "/" && !uri.path().is_empty()) || uri.query().is_some() {
            return Err(config::ConfigError::Message(format!(
                "upstream.base_url '{}' must not carry a path or query",
                self.upstream.base_url
            )));
        }

        let prefix = &self.upstream.prefix;
        if !prefix.starts_with('/') || !prefix.ends_with('/') || prefix.len() < 2 {
            return Err(config::ConfigError::Message(format!(
                "upstream.prefix '{prefix}' must start and end with '/'"
            )));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be greater than zero".to_string(),
            ));
        }

        if self.static_files.index_files.is_empty() {
            return Err(config::ConfigError::Message(
                "static_files.index_files must name at least one file".to_string(),
            ));
        }

        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl UpstreamConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn missing_file() -> String {
        let dir = tempfile::tempdir().unwrap();
        dir.path().join("absent").to_string_lossy().into_owned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::load_from(&missing_file(), None).unwrap();
        assert_eq!(cfg.server.port, 8011);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.static_files.root, "dist");
        assert_eq!(cfg.static_files.index_files, vec!["index.html", "index.htm"]);
        assert_eq!(cfg.upstream.base_url, "http://127.0.0.1:8010");
        assert_eq!(cfg.upstream.prefix, "/api/");
        assert_eq!(cfg.upstream.timeout(), Duration::from_secs(30));
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "default");
        assert!(cfg.tunnel.hostname.is_none());
    }

    #[test]
    fn test_port_override() {
        let cfg = Config::load_from(&missing_file(), Some(9100)).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9100);
    }

    #[test]
    fn test_file_values_and_cli_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9000

[static_files]
root = "/srv/dashboard"

[upstream]
base_url = "http://10.0.0.5:9999"
timeout_secs = 5

[tunnel]
hostname = "dash.example.com"
"#
        )
        .unwrap();

        let base = dir.path().join("gateway").to_string_lossy().into_owned();
        let cfg = Config::load_from(&base, None).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.static_files.root, "/srv/dashboard");
        assert_eq!(cfg.upstream.base_url, "http://10.0.0.5:9999");
        assert_eq!(cfg.upstream.timeout_secs, 5);
        assert_eq!(cfg.upstream.prefix, "/api/");
        assert_eq!(cfg.tunnel.hostname.as_deref(), Some("dash.example.com"));

        let cfg = Config::load_from(&base, Some(8123)).unwrap();
        assert_eq!(cfg.server.port, 8123);
    }

    #[test]
    fn test_validate_rejects_bad_upstream() {
        let mut cfg = Config::load_from(&missing_file(), None).unwrap();
        cfg.upstream.base_url = "not a url".to_string();
        assert!(cfg.validate().is_err());

        cfg.upstream.base_url = "https://127.0.0.1:8010".to_string();
        assert!(cfg.validate().is_err());

        cfg.upstream.base_url = "http://127.0.0.1:8010/v1".to_string();
        assert!(cfg.validate().is_err());

        cfg.upstream.base_url = "http://127.0.0.1:8010/".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_prefix_and_timeout() {
        let mut cfg = Config::load_from(&missing_file(), None).unwrap();
        cfg.upstream.prefix = "api/".to_string();
        assert!(cfg.validate().is_err());
        cfg.upstream.prefix = "/api".to_string();
        assert!(cfg.validate().is_err());
        cfg.upstream.prefix = "/".to_string();
        assert!(cfg.validate().is_err());
        cfg.upstream.prefix = "/backend/".to_string();
        assert!(cfg.validate().is_ok());

        cfg.upstream.timeout_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut cfg = Config::load_from(&missing_file(), None).unwrap();
        cfg.server.workers = Some(0);
        assert!(cfg.validate().is_err());
        cfg.server.workers = Some(4);
        assert!(cfg.validate().is_ok());
    }
}
