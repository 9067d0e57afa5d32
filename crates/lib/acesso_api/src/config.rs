//! API server configuration.

use acesso_core::config::FlowConfig;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3100";

/// Default PostgreSQL connection URL.
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/acesso";

/// Default mount point for every route.
pub const DEFAULT_URL_PATH_PREFIX: &str = "ege/acesso/";

/// Header the fronting proxy sets to the authenticated username.
pub const DEFAULT_REMOTE_USER_HEADER: &str = "x-remote-user";

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Path prefix all routes are nested under, e.g. `ege/acesso/`.
    pub url_path_prefix: String,
    /// Request header carrying the authenticated username.
    pub remote_user_header: String,
    /// Authorization flow switches.
    pub flow: FlowConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            pg_connection_url: DEFAULT_DATABASE_URL.into(),
            url_path_prefix: DEFAULT_URL_PATH_PREFIX.into(),
            remote_user_header: DEFAULT_REMOTE_USER_HEADER.into(),
            flow: FlowConfig::default(),
        }
    }
}

impl ApiConfig {
    /// The prefix as an axum nest path (`/ege/acesso`), or `None` for root.
    pub fn nest_path(&self) -> Option<String> {
        let trimmed = self.url_path_prefix.trim().trim_matches('/');
        (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
    }
}
