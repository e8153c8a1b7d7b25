use std::env;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: `{value}`")]
    InvalidVar { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    // Any origin is accepted when unset
    pub allowed_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let host = lookup("OPENSPLIT_HOST")
            .filter(|host| !host.trim().is_empty())
            .unwrap_or(defaults.host);
        let port = match lookup("OPENSPLIT_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidVar {
                    name: "OPENSPLIT_PORT",
                    value,
                })?,
            None => defaults.port,
        };
        let allowed_origin = lookup("OPENSPLIT_ALLOWED_ORIGIN").filter(|origin| !origin.is_empty());

        Ok(Config {
            host,
            port,
            allowed_origin,
        })
    }
}
