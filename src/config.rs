//! Environment Configuration
//!
//! Shared helpers for reading typed settings from environment variables.

use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that does not parse.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value found.
        value: String,
    },

    /// Parsed values are inconsistent with each other.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Read and parse `key`, falling back to `default` when unset.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Parse a raw setting value.
pub fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value::<u16>("PORT", " 8080 "), Ok(8080));
        assert_eq!(
            parse_value::<u16>("PORT", "eighty"),
            Err(ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: "eighty".to_string(),
            })
        );
    }

    #[test]
    fn test_env_or_default_when_unset() {
        let value = env_or("COIN_GRID_TEST_SURELY_UNSET_KEY", 17u32).unwrap();
        assert_eq!(value, 17);
    }
}
