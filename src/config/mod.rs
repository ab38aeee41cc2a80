//! # Configuration
//!
//! A few knobs read from the environment, everything else is hardcoded per exercise.
//!
//! - `SYNC_EXERCISES_LOG` - trace, debug, info, warn or error; `warn` if unset
//! - `SYNC_EXERCISES_ROUNDS` - how many times looping exercises go around; 3 if unset
//! - `SYNC_EXERCISES_ITEMS` - items per producer; producers never stop if unset

use std::{env, str::FromStr};

use thiserror::Error;
use tracing::Level;

pub const LOG_VAR: &str = "SYNC_EXERCISES_LOG";
pub const ROUNDS_VAR: &str = "SYNC_EXERCISES_ROUNDS";
pub const ITEMS_VAR: &str = "SYNC_EXERCISES_ITEMS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} should be one of trace, debug, info, warn, error; got `{value}'")]
    BadLevel { var: &'static str, value: String },
    #[error("{var} should be a positive number, got `{value}'")]
    BadNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_level: Level,
    pub rounds: usize,
    /// `None` => producer/consumer runs forever
    pub items: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Level::WARN,
            rounds: 3,
            items: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// same as [Config::from_env] with a custom source of variables
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(LOG_VAR) {
            config.log_level = Level::from_str(value.trim())
                .map_err(|_| ConfigError::BadLevel { var: LOG_VAR, value })?;
        }
        if let Some(value) = lookup(ROUNDS_VAR) {
            config.rounds = positive(ROUNDS_VAR, value)?;
        }
        if let Some(value) = lookup(ITEMS_VAR) {
            config.items = Some(positive(ITEMS_VAR, value)?);
        }

        Ok(config)
    }
}

fn positive(var: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::BadNumber { var, value }),
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |var: &str| vars.get(var).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn test_all_set() {
        let config = Config::from_lookup(lookup(&[
            (LOG_VAR, "debug"),
            (ROUNDS_VAR, "5"),
            (ITEMS_VAR, " 100 "),
        ]))
        .unwrap();
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.rounds, 5);
        assert_eq!(config.items, Some(100));
    }

    #[test]
    fn test_bad_values() {
        assert_eq!(
            Config::from_lookup(lookup(&[(LOG_VAR, "loud")])).unwrap_err(),
            ConfigError::BadLevel {
                var: LOG_VAR,
                value: "loud".to_string()
            }
        );
        assert_eq!(
            Config::from_lookup(lookup(&[(ROUNDS_VAR, "0")])).unwrap_err(),
            ConfigError::BadNumber {
                var: ROUNDS_VAR,
                value: "0".to_string()
            }
        );
        assert!(Config::from_lookup(lookup(&[(ITEMS_VAR, "-3")])).is_err());
    }
}
