//! Server configuration, read from `FRONTDESK_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use frontdesk_core::auth::DEFAULT_ITERATIONS;

pub const APP_NAME: &str = "frontdesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_DB_PATH: &str = "frontdesk.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hospital.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_NAME: &str = "System Administrator";

/// Log filter used when neither `RUST_LOG` nor `FRONTDESK_LOG` is set.
pub fn default_log_filter() -> &'static str {
    "frontdesk=info,frontdesk_api=info,frontdesk_core=info"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Bootstrap administrator, created on startup when its email is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub admin: AdminAccount,
    pub password_iterations: u32,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset and empty values take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind = get("FRONTDESK_BIND", DEFAULT_BIND);
        let bind = bind.parse().map_err(|_| ConfigError::Invalid {
            key: "FRONTDESK_BIND",
            value: bind.clone(),
        })?;

        let iterations = get("FRONTDESK_PASSWORD_ITERATIONS", &DEFAULT_ITERATIONS.to_string());
        let password_iterations = match iterations.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "FRONTDESK_PASSWORD_ITERATIONS",
                    value: iterations,
                })
            }
        };

        Ok(Self {
            db_path: PathBuf::from(get("FRONTDESK_DB_PATH", DEFAULT_DB_PATH)),
            bind,
            admin: AdminAccount {
                email: get("FRONTDESK_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
                password: get("FRONTDESK_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
                name: get("FRONTDESK_ADMIN_NAME", DEFAULT_ADMIN_NAME),
            },
            password_iterations,
            log_filter: get("FRONTDESK_LOG", default_log_filter()),
        })
    }
}
