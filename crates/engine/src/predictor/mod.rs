//! Tie-break predictor: a per-instrument classifier consulted when the
//! strategy vote is split.

pub mod cache;
pub mod model;

pub use cache::{LocalModelSource, ModelCache, ModelSource, RemoteModelSource};
pub use model::{feature_vector, model_file_name, normalize_timeframe, FeatureVector, LinearModel};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use common::{CandleSeries, Direction};
use strategy::StandardIndicatorBank;

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("No model available: {0}")]
    ModelUnavailable(String),

    #[error("Model load timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model fetch failed: {0}")]
    Fetch(String),

    #[error("Model decode failed: {0}")]
    Decode(String),

    #[error("Model needs feature '{0}' which cannot be computed")]
    FeatureMismatch(String),
}

/// Directional classifier used to break ties and sanity-check the majority.
#[async_trait]
pub trait TieBreakPredictor: Send + Sync {
    /// `Ok(None)` means the predictor abstains.
    async fn predict(
        &self,
        symbol: &str,
        timeframe: &str,
        series: &CandleSeries,
    ) -> Result<Option<Direction>, PredictorError>;
}

/// `[predictor]` table of the ensemble config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Trailing candles the features are computed over.
    pub min_candles: usize,
    /// Abstain when the up-probability is within this distance of 0.5.
    pub abstain_margin: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_candles: 70,
            abstain_margin: 0.0,
        }
    }
}

/// Logistic-regression predictor backed by a [`ModelCache`].
pub struct LinearPredictor {
    cache: ModelCache,
    bank: StandardIndicatorBank,
    config: PredictorConfig,
}

impl LinearPredictor {
    pub fn new(source: Arc<dyn ModelSource>, load_timeout: Duration, config: PredictorConfig) -> Self {
        Self {
            cache: ModelCache::new(source, load_timeout),
            bank: StandardIndicatorBank::default(),
            config,
        }
    }

    pub fn cache(&self) -> &ModelCache {
        &self.cache
    }
}

#[async_trait]
impl TieBreakPredictor for LinearPredictor {
    async fn predict(
        &self,
        symbol: &str,
        timeframe: &str,
        series: &CandleSeries,
    ) -> Result<Option<Direction>, PredictorError> {
        if series.is_empty() {
            return Ok(None);
        }
        if series.len() < self.config.min_candles {
            debug!(
                symbol,
                candles = series.len(),
                recommended = self.config.min_candles,
                "Predicting on a short history"
            );
        }

        let model = self.cache.get(&model_file_name(symbol, timeframe)).await?;
        let window = series.tail(self.config.min_candles);
        let features = feature_vector(&window, &self.bank);
        let p_up = model.probability_up(&features)?;

        if (p_up - 0.5).abs() < self.config.abstain_margin {
            info!(symbol, timeframe, p_up, "Predictor abstains");
            return Ok(None);
        }
        let direction = if p_up > 0.5 { Direction::Up } else { Direction::Down };
        debug!(symbol, timeframe, p_up, direction = %direction, "Predictor decided");
        Ok(Some(direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Candle;

    fn series(n: usize, close: f64) -> CandleSeries {
        let candles = (0..n)
            .map(|i| Candle::new(i as i64 * 60, close, close + 0.001, close - 0.001, close, 100.0))
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    fn predictor_with(model: &str, margin: f64) -> (LinearPredictor, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("predictor-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("model_eurusd_m1.json"), model).unwrap();
        let predictor = LinearPredictor::new(
            Arc::new(LocalModelSource::new(&dir)),
            Duration::from_secs(5),
            PredictorConfig {
                min_candles: 70,
                abstain_margin: margin,
            },
        );
        (predictor, dir)
    }

    #[tokio::test]
    async fn sign_of_the_score_picks_the_direction() {
        let (up, dir) = predictor_with(r#"{"features":["close"],"weights":[10.0],"bias":-10.0}"#, 0.0);
        let got = up.predict("EURUSD", "1min", &series(80, 1.1)).await.unwrap();
        assert_eq!(got, Some(Direction::Up));
        assert!(up.cache().is_loaded("model_eurusd_m1.json").await);
        std::fs::remove_dir_all(&dir).ok();

        let (down, dir) = predictor_with(r#"{"features":["close"],"weights":[10.0],"bias":-12.0}"#, 0.0);
        let got = down.predict("EURUSD", "1min", &series(80, 1.1)).await.unwrap();
        assert_eq!(got, Some(Direction::Down));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn uncertain_prediction_abstains() {
        let (predictor, dir) =
            predictor_with(r#"{"features":["close"],"weights":[10.0],"bias":-10.0}"#, 0.3);
        let got = predictor.predict("EURUSD", "1min", &series(80, 1.1)).await.unwrap();
        assert_eq!(got, None);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_model_is_an_error() {
        let (predictor, dir) = predictor_with(r#"{"features":[],"weights":[]}"#, 0.0);
        let err = predictor.predict("USDJPY", "1min", &series(10, 150.0)).await.unwrap_err();
        assert!(matches!(err, PredictorError::ModelUnavailable(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn empty_series_abstains() {
        let (predictor, dir) = predictor_with(r#"{"features":[],"weights":[]}"#, 0.0);
        let got = predictor.predict("EURUSD", "1min", &CandleSeries::default()).await.unwrap();
        assert_eq!(got, None);
        std::fs::remove_dir_all(&dir).ok();
    }
}
