//! Server configuration from the environment.

use crate::error::ServerError;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8787";
pub const DEFAULT_POLICY_PATH: &str = "ai.txt";
/// One day
pub const DEFAULT_MAX_AGE: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Policy document to serve; `.json` files are read as ai.json
    pub policy_path: PathBuf,
    /// `Cache-Control` max-age in seconds
    pub max_age: u64,
}

impl ServerConfig {
    /// Read `AITXT_ADDR`, `AITXT_POLICY` and `AITXT_MAX_AGE`
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let addr = lookup("AITXT_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr
            .parse()
            .map_err(|_| ServerError::Config(format!("AITXT_ADDR '{}' is not a socket address", addr)))?;

        let policy_path = lookup("AITXT_POLICY")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_POLICY_PATH.to_string())
            .into();

        let max_age = match lookup("AITXT_MAX_AGE") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ServerError::Config(format!("AITXT_MAX_AGE '{}' is not a number of seconds", raw))
            })?,
            None => DEFAULT_MAX_AGE,
        };

        Ok(Self {
            addr,
            policy_path,
            max_age,
        })
    }
}
