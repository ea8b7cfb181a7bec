use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion, MAX_CONFIDENCE};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::{atr, sma};
use crate::Strategy;

/// Range breakout: a body larger than `multiplier` × ATR follows its own
/// direction. Confidence starts at 70 (up) or 75 (down), grows with the body
/// to ATR ratio (up to 20) and with volume confirmation (10). Reversal
/// patterns in the trailing window add the usual pattern boost.
#[derive(Debug, Clone)]
pub struct AtrBreakoutStrategy {
    pub name: String,
    pub period: usize,
    pub multiplier: f64,
    pub require_volume: bool,
    pub volume_threshold: f64,
    pub min_confidence: u8,
    pub boost_factor: f64,
}

impl Default for AtrBreakoutStrategy {
    fn default() -> Self {
        Self {
            name: "atr".into(),
            period: 14,
            multiplier: 1.2,
            require_volume: true,
            volume_threshold: 1.5,
            min_confidence: 65,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for AtrBreakoutStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), self.period + 5)?;
        let atr = atr(series, self.period).ok_or(StrategyError::Degenerate("atr unavailable"))?;
        if atr <= 0.0 {
            return Err(StrategyError::Degenerate("zero atr"));
        }

        let last = series[series.len() - 1];
        let body = last.body();
        if body <= atr * self.multiplier {
            return Ok(None);
        }
        let direction = if last.is_bullish() { Direction::Up } else { Direction::Down };

        let avg_volume = sma(&series.volumes(), self.period).unwrap_or(0.0);
        let volume_ok = !self.require_volume || last.volume > avg_volume * self.volume_threshold;

        let base = if direction == Direction::Up { 70.0 } else { 75.0 };
        let size_factor = ((body / atr - 1.0) * 10.0).min(20.0);
        let volume_factor = if volume_ok { 10.0 } else { 0.0 };
        let confidence = (base + size_factor + volume_factor).min(MAX_CONFIDENCE as f64) as u8;

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("atr", atr)
            .with_detail("body_ratio", body / atr);
        let patterns = trailing_patterns(series, features);
        let opinion = boost::apply(opinion, &patterns, BoostFamily::Reversal, self.boost_factor);

        Ok(opinion
            .confidence
            .filter(|c| *c >= self.min_confidence)
            .map(|_| opinion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Candle, PatternTag};

    fn quiet(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i as i64 * 60, 1.0, 1.001, 0.999, 1.0002, 100.0))
            .collect()
    }

    #[test]
    fn big_bearish_body_with_volume_calls_down() {
        let mut candles = quiet(20);
        candles.push(Candle::new(1200, 1.0, 1.0005, 0.993, 0.994, 400.0));
        let series = CandleSeries::new(candles).unwrap();
        let opinion = AtrBreakoutStrategy::default().generate(&series, None).unwrap();
        assert_eq!(opinion.direction, Direction::Down);
        assert!(opinion.confidence.unwrap() >= 85);
    }

    #[test]
    fn ordinary_candle_is_absent() {
        let series = CandleSeries::new(quiet(20)).unwrap();
        assert!(AtrBreakoutStrategy::default().generate(&series, None).is_none());
    }

    #[test]
    fn short_history_is_absent() {
        let series = CandleSeries::new(quiet(18)).unwrap();
        assert_eq!(
            AtrBreakoutStrategy::default().evaluate(&series, None),
            Err(StrategyError::InsufficientHistory { needed: 19, got: 18 })
        );
    }

    #[test]
    fn boost_comes_from_reversal_patterns() {
        let mut candles = quiet(20);
        candles.push(Candle::new(1200, 1.0, 1.0036, 0.9998, 1.0035, 100.0));
        let series = CandleSeries::new(candles).unwrap();
        let strategy = AtrBreakoutStrategy::default();
        let with = |patterns: Vec<PatternTag>| {
            let features = FeatureSnapshot {
                patterns,
                ..Default::default()
            };
            strategy.generate(&series, Some(&features)).unwrap()
        };

        let plain = with(vec![]);
        assert_eq!(plain.direction, Direction::Up);
        let base = plain.confidence.unwrap();
        assert!(base < 90);

        let hammer = with(vec![PatternTag::Hammer]);
        assert_eq!(hammer.confidence, Some(base + 3));
        assert_eq!(hammer.patterns, vec![PatternTag::Hammer]);

        let continuation = with(vec![PatternTag::RisingThreeMethods]);
        assert_eq!(continuation.confidence, Some(base));
        assert!(continuation.patterns.is_empty());
    }
}
