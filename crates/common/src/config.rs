use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Process-level settings loaded from environment variables at startup.
/// Tunable thresholds live in the TOML ensemble config pointed to by
/// `signal_config_path`.
#[derive(Debug, Clone)]
pub struct Config {
    // Evaluation target
    pub symbol: String,
    pub timeframe: String,
    pub candle_limit: usize,
    pub candles_path: PathBuf,

    // Ensemble config file (optional, defaults apply when absent)
    pub signal_config_path: Option<PathBuf>,

    // Tie-break models
    pub model_dir: PathBuf,
    pub model_base_url: Option<String>,
    pub model_load_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables, reading `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let candle_limit = parse_env("CANDLE_LIMIT", 200usize)?;
        let timeout_secs = parse_env("MODEL_LOAD_TIMEOUT_SECS", 10u64)?;

        Ok(Config {
            symbol: required_env("SYMBOL")?,
            timeframe: optional_env("TIMEFRAME").unwrap_or_else(|| "1min".to_string()),
            candle_limit,
            candles_path: PathBuf::from(required_env("CANDLES_PATH")?),
            signal_config_path: optional_env("SIGNAL_CONFIG_PATH").map(PathBuf::from),
            model_dir: PathBuf::from(
                optional_env("MODEL_DIR").unwrap_or_else(|| "models".to_string()),
            ),
            model_base_url: optional_env("MODEL_BASE_URL"),
            model_load_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        assert_eq!(parse_env("SIGNALBOT_TEST_UNSET_KEY", 42usize).unwrap(), 42);
    }

    #[test]
    fn parse_env_reports_bad_values() {
        std::env::set_var("SIGNALBOT_TEST_BAD_LIMIT", "lots");
        let err = parse_env("SIGNALBOT_TEST_BAD_LIMIT", 1usize).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        std::env::remove_var("SIGNALBOT_TEST_BAD_LIMIT");
    }
}
