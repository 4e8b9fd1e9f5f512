//! HTTP server configuration

use std::path::PathBuf;

use serde::Deserialize;

/// HTTP server configuration
///
/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"          # default
/// port = 6969               # default
/// static_dir = "public"     # optional, no static files by default
/// trust_forwarded = true    # default
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    /// Default: "0.0.0.0"
    pub host: String,

    /// Port to listen on
    /// Default: 6969
    pub port: u16,

    /// Directory served for paths no route claims (dashboard assets)
    /// Default: none
    pub static_dir: Option<PathBuf>,

    /// Prefer `X-Forwarded-For` / `X-Real-IP` over the TCP peer address
    /// when attributing a request to a client.
    /// Default: true
    pub trust_forwarded: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6969,
            static_dir: None,
            trust_forwarded: true,
        }
    }
}

impl ServerConfig {
    /// Address string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
