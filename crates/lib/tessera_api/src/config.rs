//! API server configuration.

use std::sync::Arc;

use tessera_core::config::{AuthConfig, ConfigError};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Token and hashing settings, validated at startup.
    pub auth: Arc<AuthConfig>,
}

impl ApiConfig {
    /// Reads configuration from environment variables.
    ///
    /// | Variable     | Default                          |
    /// |--------------|----------------------------------|
    /// | `BIND_ADDR`  | `127.0.0.1:3100`                 |
    /// | `JWT_SECRET` etc. | see [`AuthConfig::from_env`] |
    ///
    /// Fails if the auth settings are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            auth: Arc::new(AuthConfig::from_env()?),
        })
    }
}
