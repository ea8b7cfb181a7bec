use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use common::patterns::total_strength;
use common::{CandleSeries, PatternTag, Rating, Sentiment, VolatilityLevel, VolumeStatus};
use strategy::indicators::sma;
use strategy::{patterns, IndicatorBank, StandardIndicatorBank};

use super::PredictorError;

/// Candles used to detect the pattern flags of the last bar.
const PATTERN_LOOKBACK: usize = 4;

/// Pattern tags exposed to the model as 0/1 flags.
const PATTERN_FLAGS: [(&str, PatternTag); 5] = [
    ("bullish_engulfing", PatternTag::BullishEngulfing),
    ("bearish_engulfing", PatternTag::BearishEngulfing),
    ("hammer", PatternTag::Hammer),
    ("shooting_star", PatternTag::ShootingStar),
    ("doji", PatternTag::Doji),
];

/// Logistic-regression artifact, stored as JSON.
///
/// ```json
/// { "features": ["close", "rsi_14"], "weights": [0.8, -0.02], "bias": 0.1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub features: Vec<String>,
    pub weights: Vec<f64>,
    #[serde(default)]
    pub bias: f64,
}

impl LinearModel {
    pub fn from_json(raw: &str) -> Result<Self, PredictorError> {
        let model: LinearModel =
            serde_json::from_str(raw).map_err(|e| PredictorError::Decode(e.to_string()))?;
        if model.features.len() != model.weights.len() {
            return Err(PredictorError::Decode(format!(
                "{} features but {} weights",
                model.features.len(),
                model.weights.len()
            )));
        }
        Ok(model)
    }

    /// Probability that the next move is up.
    pub fn probability_up(&self, features: &FeatureVector) -> Result<f64, PredictorError> {
        let mut z = self.bias;
        for (name, weight) in self.features.iter().zip(&self.weights) {
            let value = features
                .get(name.as_str())
                .ok_or_else(|| PredictorError::FeatureMismatch(name.clone()))?;
            z += weight * value;
        }
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

pub type FeatureVector = HashMap<&'static str, f64>;

/// Engineered features of the last candle of `series`.
///
/// Features whose indicator cannot be computed on the series are left out;
/// a model that needs them fails with [`PredictorError::FeatureMismatch`].
pub fn feature_vector(series: &CandleSeries, bank: &StandardIndicatorBank) -> FeatureVector {
    let mut features = FeatureVector::new();
    let Some(last) = series.last() else {
        return features;
    };
    let closes = series.closes();
    let snapshot = bank.snapshot(series);

    features.insert("open", last.open);
    features.insert("high", last.high);
    features.insert("low", last.low);
    features.insert("close", last.close);
    features.insert("volume", last.volume);

    let mut optional = |name: &'static str, value: Option<f64>| {
        if let Some(v) = value.filter(|v| v.is_finite()) {
            features.insert(name, v);
        }
    };
    optional("sma_5", sma(&closes, 5));
    optional("sma_10", sma(&closes, 10));
    optional("rsi_14", snapshot.rsi.map(|r| r.value));
    optional("macd", snapshot.macd.map(|m| m.value));
    optional("macd_signal", snapshot.macd.map(|m| m.signal));
    optional("atr", snapshot.atr);
    optional("adx", snapshot.adx);
    optional("bb_width", snapshot.bollinger.map(|b| b.width));
    optional("bb_pos", snapshot.bollinger.map(|b| b.position));
    optional("ma_rating", snapshot.moving_averages.map(rating_value));
    optional("osc_rating", snapshot.oscillators.map(rating_value));
    optional(
        "volatility",
        snapshot.volatility.map(|v| if v == VolatilityLevel::High { 1.0 } else { 0.0 }),
    );
    optional(
        "volume_status",
        snapshot.volume_status.map(|v| match v {
            VolumeStatus::Spiked => 2.0,
            VolumeStatus::Normal => 1.0,
            VolumeStatus::Low => 0.0,
        }),
    );
    optional(
        "sentiment",
        snapshot.sentiment.map(|s| match s {
            Sentiment::Optimistic => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Pessimistic => -1.0,
        }),
    );
    optional("support_distance", snapshot.support.map(|s| last.close - s));
    optional("resistance_distance", snapshot.resistance.map(|r| r - last.close));
    optional("variation", snapshot.variation);

    let tags = patterns::detect(series.trailing(PATTERN_LOOKBACK));
    for (name, tag) in PATTERN_FLAGS {
        features.insert(name, if tags.contains(&tag) { 1.0 } else { 0.0 });
    }
    features.insert("pattern_strength", total_strength(&tags));

    features
}

fn rating_value(rating: Rating) -> f64 {
    match rating {
        Rating::Buy => 1.0,
        Rating::Neutral => 0.0,
        Rating::Sell => -1.0,
    }
}

/// Short timeframe code used in model file names (`1min` → `m1`).
pub fn normalize_timeframe(timeframe: &str) -> String {
    let tf = timeframe.trim().to_lowercase();
    match tf.as_str() {
        "1min" => "m1".into(),
        "5min" => "m5".into(),
        "15min" => "m15".into(),
        "30min" => "m30".into(),
        "1h" => "h1".into(),
        "4h" => "h4".into(),
        _ => tf,
    }
}

/// File name of the model for one instrument and timeframe.
pub fn model_file_name(symbol: &str, timeframe: &str) -> String {
    let symbol: String = symbol
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    format!("model_{symbol}_{}.json", normalize_timeframe(timeframe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Candle;

    fn series(n: usize) -> CandleSeries {
        let candles = (0..n)
            .map(|i| {
                let base = 1.1 + (i as f64 * 0.3).sin() * 0.002;
                Candle::new(i as i64 * 60, base, base + 0.0008, base - 0.0008, base + 0.0003, 100.0 + i as f64)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    #[test]
    fn file_names_are_normalised() {
        assert_eq!(model_file_name("EUR/USD", "1min"), "model_eurusd_m1.json");
        assert_eq!(model_file_name("gbpjpy", "15min"), "model_gbpjpy_m15.json");
        assert_eq!(model_file_name("USDCHF", "4H"), "model_usdchf_h4.json");
        assert_eq!(normalize_timeframe("s1"), "s1");
    }

    #[test]
    fn decode_rejects_mismatched_lengths() {
        let err = LinearModel::from_json(r#"{"features":["close"],"weights":[]}"#).unwrap_err();
        assert!(matches!(err, PredictorError::Decode(_)));
        assert!(LinearModel::from_json("not json").is_err());
    }

    #[test]
    fn probability_is_a_sigmoid_of_the_weighted_sum() {
        let model = LinearModel {
            features: vec!["close".into()],
            weights: vec![2.0],
            bias: -2.0,
        };
        let mut features = FeatureVector::new();
        features.insert("close", 1.0);
        let p = model.probability_up(&features).unwrap();
        assert!((p - 0.5).abs() < 1e-12);

        features.insert("close", 2.0);
        assert!(model.probability_up(&features).unwrap() > 0.8);
    }

    #[test]
    fn missing_feature_is_a_mismatch() {
        let model = LinearModel {
            features: vec!["adx".into()],
            weights: vec![1.0],
            bias: 0.0,
        };
        let err = model.probability_up(&FeatureVector::new()).unwrap_err();
        assert!(matches!(err, PredictorError::FeatureMismatch(name) if name == "adx"));
    }

    #[test]
    fn feature_vector_covers_the_core_columns() {
        let features = feature_vector(&series(70), &StandardIndicatorBank::default());
        for name in [
            "open", "high", "low", "close", "volume", "sma_5", "sma_10", "rsi_14", "macd",
            "macd_signal", "support_distance", "resistance_distance", "variation", "doji",
            "hammer", "pattern_strength",
        ] {
            assert!(features.contains_key(name), "missing {name}");
        }
        assert!(features["support_distance"] >= 0.0);
        assert!(features["resistance_distance"] >= 0.0);
    }

    #[test]
    fn short_series_only_gets_raw_columns() {
        let features = feature_vector(&series(3), &StandardIndicatorBank::default());
        assert!(features.contains_key("close"));
        assert!(!features.contains_key("rsi_14"));
        assert!(feature_vector(&CandleSeries::default(), &StandardIndicatorBank::default()).is_empty());
    }
}
