use std::time::Duration;

use serde::Deserialize;

/// Transport connection parameters.
///
/// Constructed once and never mutated for the lifetime of the node that owns
/// it. Credentials are carried opaquely; how the broker checks them is the
/// transport's concern.
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub client_id: Option<String>,
    pub connect_timeout_secs: u64,
}

impl ConnectionConfig {
    /// WebSocket URL for the configured broker.
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Upper bound for `join` to confirm the connection.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Provides default values for `ConnectionConfig`.
///
/// Ensures a usable local setup when no configuration is provided.
impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            username: None,
            password: None,
            use_tls: false,
            client_id: None,
            connect_timeout_secs: 10,
        }
    }
}

/// Partial settings loaded from files or environment.
///
/// Allows partial specification; missing values are filled from defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub connection: Option<PartialConnectionConfig>,
}

/// Partial connection settings with every field optional.
#[derive(Debug, Deserialize)]
pub struct PartialConnectionConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: Option<bool>,
    pub client_id: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}
