use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::{Candle, CandleSeries, Error, Result};

/// Source of candle history for one instrument and interval.
///
/// Implementations own their retry/backoff policy. The ensemble treats any
/// error as "no signal, data unavailable".
#[async_trait]
pub trait MarketDataSupplier: Send + Sync {
    /// Return up to `limit` of the most recent candles, oldest first.
    async fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<CandleSeries>;
}

/// Reads a JSON array of candles from disk. Used by the binary and in tests.
#[derive(Debug, Clone)]
pub struct FileMarketData {
    path: PathBuf,
}

impl FileMarketData {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MarketDataSupplier for FileMarketData {
    async fn fetch(&self, symbol: &str, interval: &str, limit: usize) -> Result<CandleSeries> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::DataUnavailable(format!("{}: {e}", self.path.display()))
        })?;
        let candles: Vec<Candle> = serde_json::from_str(&raw)?;
        let series = CandleSeries::new(candles)?;
        let trimmed = series.tail(limit);
        debug!(symbol, interval, candles = trimmed.len(), "Loaded candles from file");
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_supplier_trims_to_limit() {
        let path = std::env::temp_dir().join(format!("candles-{}.json", uuid::Uuid::new_v4()));
        let candles: Vec<Candle> = (0..10)
            .map(|i| Candle::new(i * 60, 1.0, 1.1, 0.9, 1.0, 5.0))
            .collect();
        std::fs::write(&path, serde_json::to_string(&candles).unwrap()).unwrap();

        let supplier = FileMarketData::new(&path);
        let series = supplier.fetch("EURUSD", "1min", 4).await.unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series[0].timestamp, 6 * 60);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_file_is_data_unavailable() {
        let supplier = FileMarketData::new("/nonexistent/candles.json");
        let err = supplier.fetch("EURUSD", "1min", 10).await.unwrap_err();
        assert!(matches!(err, Error::DataUnavailable(_)));
    }
}
