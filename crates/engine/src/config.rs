use std::path::Path;

use serde::{Deserialize, Serialize};

use common::Result;
use filter::FilterConfig;
use strategy::registry::STRATEGY_TYPES;
use strategy::StrategyConfig;

use crate::predictor::PredictorConfig;
use crate::projector::ProjectorConfig;

/// Ensemble config file (TOML). Every table is optional.
///
/// Example `config/ensemble.toml`:
/// ```toml
/// [filter]
/// min_confidence = 40
/// allowed_risk = ["low", "moderate"]
///
/// [projector]
/// lookahead = 5
///
/// [projector.expiry]
/// mode = "fixed"
/// candles = 1
///
/// [predictor]
/// min_candles = 70
///
/// [[strategy]]
/// type = "rsi"
///
/// [strategy.params]
/// period = 14
/// ```
///
/// Without any `[[strategy]]` entry every built-in strategy runs with its
/// default parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub filter: FilterConfig,
    pub projector: ProjectorConfig,
    pub predictor: PredictorConfig,
    #[serde(rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            projector: ProjectorConfig::default(),
            predictor: PredictorConfig::default(),
            strategies: STRATEGY_TYPES.iter().map(|t| StrategyConfig::new(t)).collect(),
        }
    }
}

impl EnsembleConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::ExpiryPolicy;
    use common::RiskLevel;

    #[test]
    fn empty_file_keeps_every_default() {
        let cfg = EnsembleConfig::from_toml("").unwrap();
        assert_eq!(cfg.strategies.len(), STRATEGY_TYPES.len());
        assert_eq!(cfg.filter, FilterConfig::default());
        assert_eq!(cfg.projector.lookahead, 5);
        assert_eq!(cfg.projector.expiry, ExpiryPolicy::Fixed { candles: 1 });
        assert_eq!(cfg.predictor.min_candles, 70);
    }

    #[test]
    fn tables_override_defaults() {
        let cfg = EnsembleConfig::from_toml(
            r#"
            [filter]
            min_confidence = 40
            allowed_risk = ["low"]

            [predictor]
            abstain_margin = 0.05

            [[strategy]]
            type = "rsi"
            name = "RSI 9"

            [strategy.params]
            period = 9

            [[strategy]]
            type = "ema"
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.filter.min_confidence, 40);
        assert_eq!(cfg.filter.allowed_risk, vec![RiskLevel::Low]);
        assert_eq!(cfg.filter.rsi_upper, 80.0);
        assert_eq!(cfg.predictor.abstain_margin, 0.05);
        assert_eq!(cfg.strategies.len(), 2);
        assert_eq!(cfg.strategies[0].display_name(), "RSI 9");
        assert!(!cfg.strategies[1].enabled);
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let err = EnsembleConfig::from_toml("[filter\nmin_confidence = ").unwrap_err();
        assert!(matches!(err, common::Error::Toml(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EnsembleConfig::load("/nonexistent/ensemble.toml").unwrap_err();
        assert!(matches!(err, common::Error::Io(_)));
    }
}
