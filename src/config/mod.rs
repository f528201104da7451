// Configuration module entry point
// Loads startup configuration and holds the shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Base name of the optional configuration file (`dirserve.toml`, `dirserve.yaml`, ...)
pub const CONFIG_FILE: &str = "dirserve";

/// Prefix for environment overrides, e.g. `DIRSERVE_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "DIRSERVE";

impl Config {
    /// Load configuration from the default file name plus environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is not an error: every key has a default, and the
    /// defaults serve `./static` on `0.0.0.0:80`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, ENV_PREFIX)
    }

    /// Load from a file plus environment variables named `<env_prefix>_<SECTION>__<KEY>`
    fn load_with_env(config_path: &str, env_prefix: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 80)?
            .set_default("server.root", "static")?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 0)?
            .set_default("http.index_files", vec!["index.html"])?
            .set_default("http.directory_listing", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address '{}:{}': {e}", self.server.host, self.server.port))
    }

    /// Runtime worker threads, `None` (CPU cores) when unset or `0`
    pub fn worker_threads(&self) -> Option<usize> {
        self.server.workers.filter(|&n| n > 0)
    }

    /// Per-connection timeout, `None` when disabled
    pub const fn connection_timeout(&self) -> Option<Duration> {
        match self.performance.connection_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("this-file-does-not-exist").unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 80);
        assert_eq!(cfg.server.root, "static");
        assert_eq!(cfg.server.workers, None);
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.connection_timeout(), None);
        assert_eq!(cfg.http.index_files, vec!["index.html".to_string()]);
        assert!(cfg.http.directory_listing);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8081\nroot = \"public\"\n\n[performance]\nconnection_timeout = 30\n",
        )
        .unwrap();

        let base = dir.path().join("custom");
        let cfg = Config::load_from(base.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8081);
        assert_eq!(cfg.server.root, "public");
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.connection_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_env_overrides_file_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layered.toml");
        std::fs::write(&path, "[server]\nport = 8081\nroot = \"public\"\n").unwrap();

        // Own prefix so parallel tests never see these variables
        std::env::set_var("DIRSERVE_LAYERTEST_SERVER__PORT", "8082");
        std::env::set_var("DIRSERVE_LAYERTEST_HTTP__DIRECTORY_LISTING", "false");

        let base = dir.path().join("layered");
        let cfg = Config::load_with_env(base.to_str().unwrap(), "DIRSERVE_LAYERTEST").unwrap();
        assert_eq!(cfg.server.port, 8082);
        assert_eq!(cfg.server.root, "public");
        assert!(!cfg.http.directory_listing);
        assert_eq!(cfg.server.host, "0.0.0.0");

        std::env::remove_var("DIRSERVE_LAYERTEST_SERVER__PORT");
        std::env::remove_var("DIRSERVE_LAYERTEST_HTTP__DIRECTORY_LISTING");
    }

    #[test]
    fn test_zero_workers_means_default() {
        let mut cfg = Config::load_from("this-file-does-not-exist").unwrap();
        assert_eq!(cfg.worker_threads(), None);

        cfg.server.workers = Some(0);
        assert_eq!(cfg.worker_threads(), None);

        cfg.server.workers = Some(4);
        assert_eq!(cfg.worker_threads(), Some(4));
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("this-file-does-not-exist").unwrap();
        assert_eq!(cfg.socket_addr().unwrap(), "0.0.0.0:80".parse().unwrap());

        cfg.server.host = "not an address".to_string();
        assert!(cfg.socket_addr().is_err());
    }
}
