use common::{boost, CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::{reverses_prior_move, trailing_patterns, TREND_CONFIRMATION_BONUS};
use crate::bank::prior_volume_mean;
use crate::boost::{self as pattern_boost, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::Strategy;

/// Wick rejection: a long lower wick rejects lower prices (up), a long upper
/// wick rejects higher prices (down).
#[derive(Debug, Clone)]
pub struct WickReversalStrategy {
    pub name: String,
    /// Minimum wick length as a multiple of the body.
    pub wick_ratio: f64,
    /// Minimum body as a share of the candle range.
    pub min_body_ratio: f64,
    /// Volume above this multiple of the prior average adds confidence.
    pub volume_multiplier: f64,
    pub volume_window: usize,
    pub trend_lookback: usize,
    pub confidence: u8,
    pub boost_factor: f64,
}

impl Default for WickReversalStrategy {
    fn default() -> Self {
        Self {
            name: "wick_reversal".into(),
            wick_ratio: 2.0,
            min_body_ratio: 0.1,
            volume_multiplier: 1.5,
            volume_window: 20,
            trend_lookback: 5,
            confidence: 80,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for WickReversalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), 1)?;
        let last = series[series.len() - 1];
        let body = last.body();
        if body == 0.0 {
            return Err(StrategyError::Degenerate("zero body"));
        }
        if body / last.range() < self.min_body_ratio {
            return Ok(None);
        }

        let direction = if last.lower_wick() > body * self.wick_ratio {
            Direction::Up
        } else if last.upper_wick() > body * self.wick_ratio {
            Direction::Down
        } else {
            return Ok(None);
        };

        let mut confidence = self.confidence;
        let volumes = series.volumes();
        if let Some(avg) = prior_volume_mean(&volumes, self.volume_window) {
            if avg > 0.0 && last.volume > avg * self.volume_multiplier {
                confidence = boost(confidence, 10);
            }
        }
        if reverses_prior_move(series, self.trend_lookback, direction) {
            confidence = boost(confidence, TREND_CONFIRMATION_BONUS);
        }

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("upper_wick", last.upper_wick())
            .with_detail("lower_wick", last.lower_wick())
            .with_detail("body", body);
        let patterns = trailing_patterns(series, features);
        Ok(Some(pattern_boost::apply(
            opinion,
            &patterns,
            BoostFamily::Reversal,
            self.boost_factor,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::from_candles;
    use common::Candle;

    #[test]
    fn long_lower_wick_calls_up() {
        let series = from_candles(vec![Candle::new(0, 1.000, 1.0025, 0.990, 1.002, 100.0)]);
        let opinion = WickReversalStrategy::default().generate(&series, None).unwrap();
        assert_eq!(opinion.direction, Direction::Up);
        assert!(opinion.confidence.unwrap() >= 80);
    }

    #[test]
    fn long_upper_wick_after_rally_is_confirmed() {
        let mut candles: Vec<Candle> = (0..6)
            .map(|i| {
                let o = 1.0 + i as f64 * 0.002;
                Candle::new(i * 60, o, o + 0.0025, o - 0.0005, o + 0.002, 100.0)
            })
            .collect();
        candles.push(Candle::new(360, 1.012, 1.022, 1.0098, 1.010, 100.0));
        let opinion = WickReversalStrategy::default()
            .generate(&from_candles(candles), None)
            .unwrap();
        assert_eq!(opinion.direction, Direction::Down);
        assert!(opinion.confidence.unwrap() >= 85);
    }

    #[test]
    fn zero_body_is_degenerate() {
        let series = from_candles(vec![Candle::new(0, 1.0, 1.01, 0.99, 1.0, 100.0)]);
        assert_eq!(
            WickReversalStrategy::default().evaluate(&series, None),
            Err(StrategyError::Degenerate("zero body"))
        );
    }

    #[test]
    fn volume_spike_adds_confidence() {
        let mut candles: Vec<Candle> = (0..5)
            .map(|i| Candle::new(i * 60, 1.0, 1.001, 0.999, 1.0005, 100.0))
            .collect();
        candles.push(Candle::new(300, 1.000, 1.0025, 0.990, 1.002, 500.0));
        let quiet = {
            let mut c = candles.clone();
            c[5].volume = 100.0;
            c
        };
        let s = WickReversalStrategy::default();
        let loud = s.generate(&from_candles(candles), None).unwrap().confidence.unwrap();
        let calm = s.generate(&from_candles(quiet), None).unwrap().confidence.unwrap();
        assert_eq!(loud, calm + 10);
    }
}
