//! The `config` module handles connection configuration for a node.

mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::ConnectionConfig;

/// Loads the connection configuration from the default file and environment
/// variables (e.g. `CONNECTION_HOST`), merged over built-in defaults.
pub fn load_config() -> Result<ConnectionConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("_"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = ConnectionConfig::default();
    let connection = partial.connection;

    Ok(ConnectionConfig {
        host: connection
            .as_ref()
            .and_then(|c| c.host.clone())
            .unwrap_or(default.host),
        port: connection
            .as_ref()
            .and_then(|c| c.port)
            .unwrap_or(default.port),
        username: connection
            .as_ref()
            .and_then(|c| c.username.clone())
            .or(default.username),
        password: connection
            .as_ref()
            .and_then(|c| c.password.clone())
            .or(default.password),
        use_tls: connection
            .as_ref()
            .and_then(|c| c.use_tls)
            .unwrap_or(default.use_tls),
        client_id: connection
            .as_ref()
            .and_then(|c| c.client_id.clone())
            .or(default.client_id),
        connect_timeout_secs: connection
            .as_ref()
            .and_then(|c| c.connect_timeout_secs)
            .unwrap_or(default.connect_timeout_secs),
    })
}

#[cfg(test)]
mod tests;
