use std::env;

use log::LevelFilter;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://hostelwash.db";
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hostel.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "password";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to parse PORT enviroment variable: {0:?} is not a valid port")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub port: u16,
    pub admin_email: String,
    pub admin_password: String,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to the
    /// defaults above for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.into()),
            port,
            admin_email: lookup("ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.into()),
            admin_password: lookup("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
            log_level: parse_log_level(lookup("LOG_LEVEL").as_deref()),
        })
    }
}

pub fn parse_log_level(value: Option<&str>) -> LevelFilter {
    match value {
        None => LevelFilter::Warn,
        Some(value) => match value.to_uppercase().as_str() {
            "ERROR" => LevelFilter::Error,
            "WARNING" => LevelFilter::Warn,
            "INFO" => LevelFilter::Info,
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            "OFF" => LevelFilter::Off,
            _ => LevelFilter::Warn,
        },
    }
}
