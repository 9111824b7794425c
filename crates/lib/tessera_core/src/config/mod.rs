//! Process-wide authentication configuration.
//!
//! Built once at startup, validated, and then shared read-only (usually
//! behind an `Arc`) with the session manager and the access guard.

pub mod validation;

use chrono::Duration;
use thiserror::Error;
use tracing::{info, warn};

use self::validation::{parse_cost, parse_ttl};

/// Default access token lifetime: 24 hours.
pub const DEFAULT_ACCESS_TTL: &str = "24h";

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL: &str = "7d";

/// Default bcrypt work factor.
pub const DEFAULT_HASH_COST: u32 = 12;

/// Secrets shorter than this are accepted but logged as a warning.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

/// Configuration errors. Any of these should abort startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable is required")]
    MissingSecret,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Authentication settings: signing secret, token lifetimes and hash cost.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC signing secret for all tokens.
    pub jwt_secret: String,
    /// Access token lifetime.
    pub access_ttl: Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: Duration,
    /// bcrypt cost factor.
    pub hash_cost: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Build a config with default lifetimes and cost, then validate it.
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            jwt_secret: jwt_secret.into(),
            access_ttl: Duration::hours(24),
            refresh_ttl: Duration::days(7),
            hash_cost: DEFAULT_HASH_COST,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                   | Default    |
    /// |----------------------------|------------|
    /// | `JWT_SECRET`               | (required) |
    /// | `JWT_EXPIRES_IN`           | `24h`      |
    /// | `REFRESH_TOKEN_EXPIRES_IN` | `7d`       |
    /// | `BCRYPT_ROUNDS`            | `12`       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").unwrap_or_default();

        let access_raw = lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_ACCESS_TTL.into());
        let access_ttl = parse_ttl(&access_raw).ok_or(ConfigError::InvalidValue {
            key: "JWT_EXPIRES_IN",
            value: access_raw.clone(),
        })?;

        let refresh_raw =
            lookup("REFRESH_TOKEN_EXPIRES_IN").unwrap_or_else(|| DEFAULT_REFRESH_TTL.into());
        let refresh_ttl = parse_ttl(&refresh_raw).ok_or(ConfigError::InvalidValue {
            key: "REFRESH_TOKEN_EXPIRES_IN",
            value: refresh_raw.clone(),
        })?;

        let hash_cost = match lookup("BCRYPT_ROUNDS") {
            None => DEFAULT_HASH_COST,
            Some(raw) => parse_cost(&raw).ok_or(ConfigError::InvalidValue {
                key: "BCRYPT_ROUNDS",
                value: raw,
            })?,
        };

        let config = Self {
            jwt_secret,
            access_ttl,
            refresh_ttl,
            hash_cost,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail-fast checks. Also warns when the secret is shorter than
    /// [`RECOMMENDED_SECRET_LEN`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if !validation::ttl_in_range(self.access_ttl) {
            return Err(ConfigError::InvalidValue {
                key: "JWT_EXPIRES_IN",
                value: self.access_ttl.to_string(),
            });
        }
        if !validation::ttl_in_range(self.refresh_ttl) {
            return Err(ConfigError::InvalidValue {
                key: "REFRESH_TOKEN_EXPIRES_IN",
                value: self.refresh_ttl.to_string(),
            });
        }
        if !validation::cost_in_range(self.hash_cost) {
            return Err(ConfigError::InvalidValue {
                key: "BCRYPT_ROUNDS",
                value: self.hash_cost.to_string(),
            });
        }

        let len = self.jwt_secret.chars().count();
        if len < RECOMMENDED_SECRET_LEN {
            warn!(
                length = len,
                recommended = RECOMMENDED_SECRET_LEN,
                "JWT_SECRET is shorter than recommended"
            );
        }
        info!("authentication configuration validated");
        Ok(())
    }

    /// Override the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Override the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Override the bcrypt cost.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_secret_fails_fast() {
        let err = AuthConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[test]
    fn empty_secret_fails_fast() {
        let err = AuthConfig::from_lookup(lookup_from(&[("JWT_SECRET", "")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingSecret);
    }

    #[test]
    fn defaults_apply() {
        let config =
            AuthConfig::from_lookup(lookup_from(&[("JWT_SECRET", "short-but-accepted")])).unwrap();
        assert_eq!(config.access_ttl, Duration::hours(24));
        assert_eq!(config.refresh_ttl, Duration::days(7));
        assert_eq!(config.hash_cost, 12);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("JWT_EXPIRES_IN", "15m"),
            ("REFRESH_TOKEN_EXPIRES_IN", "30d"),
            ("BCRYPT_ROUNDS", "10"),
        ]))
        .unwrap();
        assert_eq!(config.access_ttl, Duration::minutes(15));
        assert_eq!(config.refresh_ttl, Duration::days(30));
        assert_eq!(config.hash_cost, 10);
    }

    #[test]
    fn bad_ttl_is_rejected() {
        let err = AuthConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRES_IN", "forever"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "JWT_EXPIRES_IN",
                value: "forever".into()
            }
        );
    }

    #[test]
    fn unrepresentable_ttl_fails_fast() {
        let err = AuthConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("JWT_EXPIRES_IN", "9000000000000s"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "JWT_EXPIRES_IN",
                ..
            }
        ));

        let err = AuthConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("REFRESH_TOKEN_EXPIRES_IN", "3651d"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "REFRESH_TOKEN_EXPIRES_IN",
                ..
            }
        ));

        let config = AuthConfig::new("secret")
            .unwrap()
            .with_access_ttl(Duration::days(100_000));
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        let err = AuthConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "secret"),
            ("BCRYPT_ROUNDS", "3"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "BCRYPT_ROUNDS",
                ..
            }
        ));
    }

    #[test]
    fn builder_overrides_are_validated() {
        let config = AuthConfig::new("secret").unwrap().with_hash_cost(40);
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig::new("super-secret-value").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
