//! Runtime configuration
//!
//! Loaded from an optional TOML file, then overridden by the environment
//! variables `PORT`, `DATABASE_PATH`, `AUTH0_DOMAIN` and `AUTH0_AUDIENCE`.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 3001
//!
//! [database]
//! path = "data/foundit.db"
//! pool_size = 8
//!
//! [auth]
//! domain = "tenant.eu.auth0.com"
//! audience = "https://api.foundit.example.com"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::auth::{AuthSettings, JwksOptions};
use crate::repository::DbOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("missing required setting {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: usize,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("foundit.db"),
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn options(&self) -> DbOptions {
        DbOptions {
            pool_size: self.pool_size,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Identity provider tenant, e.g. `tenant.eu.auth0.com`
    pub domain: String,
    pub audience: String,
    pub roles_claim: String,
    pub jwks_requests_per_minute: u32,
    pub jwks_timeout_secs: u64,
    pub jwks_cache_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            audience: String::new(),
            roles_claim: "http://foundit.example.com/roles".to_string(),
            jwks_requests_per_minute: 5,
            jwks_timeout_secs: 10,
            jwks_cache_ttl_secs: 600,
        }
    }
}

impl AuthConfig {
    fn domain(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain())
    }

    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            issuer: self.issuer(),
            audience: self.audience.clone(),
            roles_claim: self.roles_claim.clone(),
        }
    }

    pub fn jwks_url(&self) -> String {
        crate::auth::JwksCache::jwks_url(self.domain())
    }

    pub fn jwks_options(&self) -> JwksOptions {
        JwksOptions {
            requests_per_minute: self.jwks_requests_per_minute,
            timeout: Duration::from_secs(self.jwks_timeout_secs),
            cache_ttl: Duration::from_secs(self.jwks_cache_ttl_secs),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// File (if any) + process environment, validated
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(domain) = lookup("AUTH0_DOMAIN") {
            self.auth.domain = domain;
        }
        if let Some(audience) = lookup("AUTH0_AUDIENCE") {
            self.auth.audience = audience;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.domain().trim().is_empty() {
            return Err(ConfigError::Missing("auth.domain (AUTH0_DOMAIN)"));
        }
        if self.auth.audience.trim().is_empty() {
            return Err(ConfigError::Missing("auth.audience (AUTH0_AUDIENCE)"));
        }
        if self.auth.roles_claim.trim().is_empty() {
            return Err(ConfigError::Missing("auth.roles_claim"));
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "database.pool_size",
                value: "0".to_string(),
            });
        }
        if self.auth.jwks_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "auth.jwks_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
