use serde::{Deserialize, Serialize};

use common::{RiskLevel, VolatilityLevel};

/// Thresholds of the acceptance filter. Every field can be overridden from the
/// `[filter]` table of the ensemble config; missing fields keep these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Final confidence below this is rejected.
    pub min_confidence: u8,
    /// Minimum high-low range of the composite signal, which spans the whole
    /// evaluated history.
    pub min_volatility: f64,
    /// Minimum summed volume of the composite signal.
    pub min_volume: f64,
    pub allowed_risk: Vec<RiskLevel>,
    pub allowed_volatility: Vec<VolatilityLevel>,
    /// Minimum distance between price and the level it is heading into.
    pub min_level_distance: f64,
    /// Summed contrary pattern strength at or above this is rejected.
    pub pattern_reject_strength: f64,
    /// Confidence points lost per unit of contrary pattern strength.
    pub pattern_penalty_factor: f64,
    /// Contrary strength a plain doji adds in either direction.
    pub doji_penalty: f64,

    /// Body-to-range ratio under which the latest candle is low quality.
    pub min_body_ratio: f64,
    pub quality_penalty: u8,
    pub quality_boost: u8,
    /// Confidence at which a quality candle makes the signal strong.
    pub strong_at: u8,
    /// Penalties never take confidence below this.
    pub confidence_floor: u8,
    /// Penalty for each disagreeing indicator (MACD, Bollinger, ratings).
    pub disagreement_penalty: u8,

    /// RSI above this rejects an up signal.
    pub rsi_upper: f64,
    /// RSI below this rejects a down signal.
    pub rsi_lower: f64,
    /// Absolute percent change of the last candle above this is rejected.
    pub max_variation_pct: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_confidence: 30,
            min_volatility: 0.00001,
            min_volume: 100.0,
            allowed_risk: vec![RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High],
            allowed_volatility: vec![
                VolatilityLevel::Low,
                VolatilityLevel::Moderate,
                VolatilityLevel::High,
            ],
            min_level_distance: 0.00005,
            pattern_reject_strength: 0.99,
            pattern_penalty_factor: 6.0,
            doji_penalty: 0.15,
            min_body_ratio: 0.2,
            quality_penalty: 20,
            quality_boost: 10,
            strong_at: 80,
            confidence_floor: 10,
            disagreement_penalty: 10,
            rsi_upper: 80.0,
            rsi_lower: 20.0,
            max_variation_pct: 3.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: FilterConfig = toml::from_str(
            r#"
            min_confidence = 55
            allowed_risk = ["low"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.min_confidence, 55);
        assert_eq!(cfg.allowed_risk, vec![RiskLevel::Low]);
        assert_eq!(cfg.pattern_reject_strength, 0.99);
        assert_eq!(cfg.allowed_volatility.len(), 3);
    }
}
