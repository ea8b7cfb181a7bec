use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid candle at {timestamp}: {reason}")]
    InvalidCandle { timestamp: i64, reason: String },

    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
