use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::{sma, RsiIndicator};
use crate::Strategy;

/// Momentum crossover: oversold RSI with price already back above its short
/// SMA calls up, overbought RSI with price under the SMA calls down.
#[derive(Debug, Clone)]
pub struct RsiMaStrategy {
    pub name: String,
    pub rsi_period: usize,
    pub ma_period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub confidence: u8,
    pub boost_factor: f64,
}

impl Default for RsiMaStrategy {
    fn default() -> Self {
        Self {
            name: "rsi_ma".into(),
            rsi_period: 10,
            ma_period: 3,
            overbought: 70.0,
            oversold: 30.0,
            confidence: 95,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for RsiMaStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        let rsi = RsiIndicator::new(self.rsi_period);
        require_history(series.len(), (rsi.period + 1).max(self.ma_period))?;

        let closes = series.closes();
        let value = rsi
            .compute(&closes)
            .ok_or(StrategyError::Degenerate("rsi unavailable"))?;
        let ma = sma(&closes, self.ma_period).ok_or(StrategyError::Degenerate("ma unavailable"))?;
        let price = closes[closes.len() - 1];

        let direction = if value < self.oversold && price > ma {
            Direction::Up
        } else if value > self.overbought && price < ma {
            Direction::Down
        } else {
            return Ok(None);
        };

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(self.confidence)
            .with_detail("rsi", value)
            .with_detail("ma", ma);
        let patterns = trailing_patterns(series, features);
        Ok(Some(boost::apply(opinion, &patterns, BoostFamily::Reversal, self.boost_factor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::from_closes;

    #[test]
    fn short_series_is_an_error() {
        let s = RsiMaStrategy::default();
        let series = from_closes(&[1.0; 5]);
        assert!(matches!(
            s.evaluate(&series, None),
            Err(StrategyError::InsufficientHistory { needed: 11, got: 5 })
        ));
        assert!(s.generate(&series, None).is_none());
    }

    #[test]
    fn oversold_bounce_calls_up() {
        let mut closes: Vec<f64> = (0..14).map(|i| 1.10 - i as f64 * 0.002).collect();
        closes.push(1.0760);
        let opinion = RsiMaStrategy::default()
            .generate(&from_closes(&closes), None)
            .expect("opinion");
        assert_eq!(opinion.direction, Direction::Up);
        assert!(opinion.confidence.unwrap() >= 95);
    }

    #[test]
    fn quiet_market_has_no_opinion() {
        let closes: Vec<f64> = (0..30).map(|i| 1.1 + if i % 2 == 0 { 0.001 } else { -0.001 }).collect();
        assert!(RsiMaStrategy::default().generate(&from_closes(&closes), None).is_none());
    }
}
