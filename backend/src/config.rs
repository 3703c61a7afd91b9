use std::env;
use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "SANTA_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        source: AddrParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn parse(bind_addr: &str) -> Result<Self, ConfigError> {
        let bind_addr = bind_addr
            .trim()
            .parse()
            .map_err(|source| ConfigError::BindAddr {
                value: bind_addr.to_string(),
                source,
            })?;
        Ok(Self { bind_addr })
    }

    /// Reads `SANTA_BIND_ADDR`, falling back to port 5000 on all interfaces.
    pub fn from_env() -> Result<Self, ConfigError> {
        let value = env::var(BIND_ADDR_VAR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        Self::parse(&value)
    }

    /// An explicit `--bind` wins over the environment.
    pub fn resolve(bind_override: Option<&str>) -> Result<Self, ConfigError> {
        match bind_override {
            Some(value) => Self::parse(value),
            None => Self::from_env(),
        }
    }
}
