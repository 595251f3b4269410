//! Environment-driven configuration
//!
//! Values come from the process environment, after `.env` has been loaded by
//! `dotenvy` in `main`.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `8080` |
//! | `CODE_LENGTH` | `8` |
//! | `CODE_STRATEGY` | `random` (or `hash`) |
//! | `CODE_MAX_ATTEMPTS` | `64` |
//! | `HASH_KEY_COUNT` | `200` |
//! | `SESSION_SECRET` | random per process |
//! | `ADMIN_TOKEN` | unset, `/urls.json` open |

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::allocator::{CodeStrategy, DEFAULT_MAX_ATTEMPTS};
use crate::hash::{DEFAULT_HASH_LENGTH, DEFAULT_KEY_COUNT};

/// Signed cookie keys need at least this many bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is not a valid value: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("SESSION_SECRET must be at least {MIN_SESSION_SECRET_LEN} bytes")]
    ShortSessionSecret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub code_length: usize,
    pub strategy: CodeStrategy,
    pub max_attempts: u32,
    pub hash_key_count: usize,
    pub session_secret: Option<String>,
    /// Required value of the `Authorization` header on `/urls.json`
    pub admin_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            code_length: DEFAULT_HASH_LENGTH,
            strategy: CodeStrategy::Random {
                length: DEFAULT_HASH_LENGTH,
            },
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            hash_key_count: DEFAULT_KEY_COUNT,
            session_secret: None,
            admin_token: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = parse_or("PORT", var("PORT"), defaults.port)?;
        let code_length = parse_or("CODE_LENGTH", var("CODE_LENGTH"), defaults.code_length)?;
        let max_attempts = parse_or(
            "CODE_MAX_ATTEMPTS",
            var("CODE_MAX_ATTEMPTS"),
            defaults.max_attempts,
        )?;
        let hash_key_count = parse_or(
            "HASH_KEY_COUNT",
            var("HASH_KEY_COUNT"),
            defaults.hash_key_count,
        )?;

        let strategy = match var("CODE_STRATEGY").as_deref().map(str::trim) {
            None | Some("random") => CodeStrategy::Random {
                length: code_length,
            },
            Some("hash") => CodeStrategy::Hash,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CODE_STRATEGY",
                    value: other.to_string(),
                })
            }
        };

        let session_secret = var("SESSION_SECRET");
        if session_secret
            .as_ref()
            .is_some_and(|s| s.len() < MIN_SESSION_SECRET_LEN)
        {
            return Err(ConfigError::ShortSessionSecret);
        }

        Ok(Self {
            port,
            code_length,
            strategy,
            max_attempts,
            hash_key_count,
            session_secret,
            admin_token: var("ADMIN_TOKEN"),
        })
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let secret = "s".repeat(64);
        let cfg = config(&[
            ("PORT", "8000"),
            ("CODE_LENGTH", "6"),
            ("CODE_STRATEGY", "hash"),
            ("CODE_MAX_ATTEMPTS", "10"),
            ("HASH_KEY_COUNT", "50"),
            ("SESSION_SECRET", secret.as_str()),
            ("ADMIN_TOKEN", "letmein"),
        ])
        .unwrap();

        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.code_length, 6);
        assert_eq!(cfg.strategy, CodeStrategy::Hash);
        assert_eq!(cfg.max_attempts, 10);
        assert_eq!(cfg.hash_key_count, 50);
        assert_eq!(cfg.session_secret, Some(secret));
        assert_eq!(cfg.admin_token.as_deref(), Some("letmein"));
    }

    #[test]
    fn test_random_strategy_uses_code_length() {
        let cfg = config(&[("CODE_LENGTH", "6"), ("CODE_STRATEGY", "random")]).unwrap();
        assert_eq!(cfg.strategy, CodeStrategy::Random { length: 6 });
    }

    #[test]
    fn test_empty_values_are_unset() {
        let cfg = config(&[("PORT", ""), ("ADMIN_TOKEN", "  ")]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.admin_token, None);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            })
        );
        assert!(matches!(
            config(&[("CODE_STRATEGY", "sequential")]),
            Err(ConfigError::Invalid { name: "CODE_STRATEGY", .. })
        ));
        assert_eq!(
            config(&[("SESSION_SECRET", "short")]),
            Err(ConfigError::ShortSessionSecret)
        );
    }
}
