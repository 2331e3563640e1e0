//! Server configuration from the environment
//!
//! Everything deployable is an environment variable; defaults suit local
//! runs. `FABLED_GAMES_DIR` points at a directory of Z-machine story files;
//! without it the library holds only the built-in games.

use fabled_error::{Error, ErrorKind, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind address (`FABLED_ADDR`)
    pub addr: String,
    /// Bind port (`FABLED_PORT`)
    pub port: u16,
    /// Story file directory (`FABLED_GAMES_DIR`)
    pub games_dir: Option<PathBuf>,
    /// Save-slot persistence root (`FABLED_SAVE_DIR`); in-memory slots if unset
    pub save_dir: Option<PathBuf>,
    /// Bound on one engine call (`FABLED_STEP_TIMEOUT_SECS`)
    pub step_timeout: Duration,
    /// Session idle expiry (`FABLED_IDLE_TIMEOUT_SECS`)
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 8000,
            games_dir: None,
            save_dir: None,
            step_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(3600),
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (tests inject maps)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("FABLED_ADDR") {
            config.addr = addr;
        }
        if let Some(port) = lookup("FABLED_PORT") {
            config.port = port.parse().map_err(|_| {
                Error::new(ErrorKind::ConfigInvalid, format!("invalid FABLED_PORT '{}'", port))
            })?;
        }
        if let Some(dir) = lookup("FABLED_GAMES_DIR") {
            config.games_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = lookup("FABLED_SAVE_DIR") {
            config.save_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = lookup("FABLED_STEP_TIMEOUT_SECS") {
            config.step_timeout = Duration::from_secs(parse_secs("FABLED_STEP_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("FABLED_IDLE_TIMEOUT_SECS") {
            config.idle_timeout = Duration::from_secs(parse_secs("FABLED_IDLE_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }

    /// The socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value
        .parse()
        .map_err(|_| Error::new(ErrorKind::ConfigInvalid, format!("invalid {} '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("FABLED_ADDR", "127.0.0.1"),
            ("FABLED_PORT", "9100"),
            ("FABLED_GAMES_DIR", "/srv/games"),
            ("FABLED_STEP_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.games_dir, Some(PathBuf::from("/srv/games")));
        assert_eq!(config.step_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let err = ServerConfig::from_lookup(|k| {
            (k == "FABLED_PORT").then(|| "teapot".to_string())
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
