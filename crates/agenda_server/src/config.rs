//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve bind address, database path, logging and body limits.
//! - Report malformed values by variable name instead of silently defaulting.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_BIND_ADDR: &str = "AGENDA_BIND_ADDR";
pub const ENV_DB_PATH: &str = "AGENDA_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "AGENDA_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "AGENDA_LOG_DIR";
pub const ENV_MAX_BODY_BYTES: &str = "AGENDA_MAX_BODY_BYTES";

const DEFAULT_BIND_IP: [u8; 4] = [127, 0, 0, 1];
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "agenda.sqlite3";
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {}=`{}`: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when unset.
    pub log_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = match read(ENV_BIND_ADDR) {
            Some(value) => value.parse().map_err(|err: std::net::AddrParseError| ConfigError {
                variable: ENV_BIND_ADDR,
                value: value.clone(),
                reason: err.to_string(),
            })?,
            None => SocketAddr::from((DEFAULT_BIND_IP, DEFAULT_PORT)),
        };

        let max_body_bytes = match read(ENV_MAX_BODY_BYTES) {
            Some(value) => match value.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError {
                        variable: ENV_MAX_BODY_BYTES,
                        value,
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(bytes) => bytes,
                Err(err) => {
                    return Err(ConfigError {
                        variable: ENV_MAX_BODY_BYTES,
                        value,
                        reason: err.to_string(),
                    })
                }
            },
            None => DEFAULT_MAX_BODY_BYTES,
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            Some(value) => agenda_core::normalize_level(&value).map_err(|reason| ConfigError {
                variable: ENV_LOG_LEVEL,
                value: value.clone(),
                reason,
            })?,
            None => agenda_core::default_log_level(),
        };

        let log_dir = match read(ENV_LOG_DIR) {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError {
                        variable: ENV_LOG_DIR,
                        value,
                        reason: "must be an absolute path".to_string(),
                    });
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            db_path: read(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: log_level.to_string(),
            log_dir,
            max_body_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, ENV_BIND_ADDR, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_MAX_BODY_BYTES};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, super::ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.db_path, PathBuf::from("agenda.sqlite3"));
        assert_eq!(config.log_level, agenda_core::default_log_level());
        assert_eq!(config.log_dir, None);
        assert_eq!(config.max_body_bytes, 16 * 1024);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config_from(&[(ENV_BIND_ADDR, "  ")]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = config_from(&[(ENV_BIND_ADDR, "not-an-addr")]).unwrap_err();
        assert_eq!(err.variable, ENV_BIND_ADDR);

        let err = config_from(&[(ENV_MAX_BODY_BYTES, "0")]).unwrap_err();
        assert_eq!(err.variable, ENV_MAX_BODY_BYTES);

        let err = config_from(&[(ENV_LOG_DIR, "relative/logs")]).unwrap_err();
        assert_eq!(err.variable, ENV_LOG_DIR);
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn log_level_is_normalized_or_rejected() {
        let config = config_from(&[(ENV_LOG_LEVEL, " WARNING ")]).unwrap();
        assert_eq!(config.log_level, "warn");

        let err = config_from(&[(ENV_LOG_LEVEL, "verbose")]).unwrap_err();
        assert_eq!(err.variable, ENV_LOG_LEVEL);
        assert_eq!(err.value, "verbose");
    }
}
