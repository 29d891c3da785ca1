//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default deploy version; bump it to force clients onto a fresh asset snapshot.
pub const DEFAULT_VERSION: &str = "894.0";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deploy version string naming the static asset partition
    pub version: String,
    /// Origin (scheme://host:port) the app is served from
    pub origin: String,
    /// HTTP server port
    pub server_port: u16,
    /// Directory holding the static assets listed in the manifest
    pub asset_dir: PathBuf,
    /// Directory for persisted records and cache partitions; `None` keeps
    /// both in memory
    pub data_dir: Option<PathBuf>,
    /// Observation search endpoint
    pub observations_url: String,
    /// Plant identification endpoint (API key appended as query parameter)
    pub plantnet_url: String,
    /// Plant identification API key
    pub plantnet_api_key: String,
    /// Outbound HTTP timeout in seconds
    pub http_timeout: u64,
    /// Interval in seconds between discovery image repair runs
    pub repair_interval: u64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_VERSION` - Asset cache version (default: 894.0)
    /// - `APP_ORIGIN` - Public origin (default: http://localhost:3000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `ASSET_DIR` - Static asset directory (default: ./public)
    /// - `DATA_DIR` - Record and cache directory, empty for in-memory (default: ./data)
    /// - `OBSERVATIONS_URL`, `PLANTNET_URL`, `PLANTNET_API_KEY`
    /// - `HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 30)
    /// - `REPAIR_INTERVAL_SECS` - Image repair interval (default: 3600)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let data_dir = match env::var("DATA_DIR") {
            Ok(dir) if dir.trim().is_empty() => None,
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => defaults.data_dir,
        };

        Self {
            version: var_or("APP_VERSION", &defaults.version),
            origin: var_or("APP_ORIGIN", &defaults.origin),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            asset_dir: env::var("ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.asset_dir),
            data_dir,
            observations_url: var_or("OBSERVATIONS_URL", &defaults.observations_url),
            plantnet_url: var_or("PLANTNET_URL", &defaults.plantnet_url),
            plantnet_api_key: var_or("PLANTNET_API_KEY", &defaults.plantnet_api_key),
            http_timeout: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout),
            repair_interval: env::var("REPAIR_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.repair_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            origin: "http://localhost:3000".to_string(),
            server_port: 3000,
            asset_dir: PathBuf::from("./public"),
            data_dir: Some(PathBuf::from("./data")),
            observations_url: "https://api.inaturalist.org/v1/observations".to_string(),
            plantnet_url: "https://my-api.plantnet.org/v2/identify/all".to_string(),
            plantnet_api_key: String::new(),
            http_timeout: 30,
            repair_interval: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.version, "894.0");
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.asset_dir, PathBuf::from("./public"));
        assert_eq!(config.data_dir, Some(PathBuf::from("./data")));
        assert_eq!(config.http_timeout, 30);
        assert_eq!(config.repair_interval, 3600);
    }

    #[test]
    fn test_config_from_env() {
        // Single test touching the environment to avoid races between tests
        env::remove_var("APP_VERSION");
        env::remove_var("SERVER_PORT");
        env::remove_var("HTTP_TIMEOUT_SECS");
        env::set_var("DATA_DIR", "");

        let config = Config::from_env();
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.http_timeout, 30);
        assert!(config.data_dir.is_none());

        env::set_var("APP_VERSION", "895.0");
        env::set_var("DATA_DIR", "/tmp/bq");
        let config = Config::from_env();
        assert_eq!(config.version, "895.0");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/bq")));

        env::remove_var("APP_VERSION");
        env::remove_var("DATA_DIR");
    }
}
