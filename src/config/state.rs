// Application state module
// Built once at startup and shared read-only with every connection

use std::path::PathBuf;

use super::types::Config;
use crate::handler::router::Router;
use crate::handler::static_files::FileServer;

/// Application state
pub struct AppState {
    pub config: Config,
    pub router: Router,
    /// Write an access log line per request
    pub access_log: bool,
}

impl AppState {
    /// Build state with the single catch-all route: `/` mapped onto the root
    /// directory with the leading slash stripped.
    pub fn new(config: Config) -> Self {
        let files = FileServer::new(PathBuf::from(&config.server.root), &config.http);

        let mut router = Router::new();
        router.route("/", Some("/"), files);

        Self {
            access_log: config.logging.access_log,
            config,
            router,
        }
    }
}
