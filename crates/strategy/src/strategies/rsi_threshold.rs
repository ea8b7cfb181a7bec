use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::RsiIndicator;
use crate::Strategy;

/// Plain RSI threshold: overbought calls down, oversold calls up. Confidence
/// grows with the overshoot past the threshold.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    pub name: String,
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub base_confidence: u8,
    pub boost_factor: f64,
}

impl Default for RsiStrategy {
    fn default() -> Self {
        Self {
            name: "rsi".into(),
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
            base_confidence: 65,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        let rsi = RsiIndicator::new(self.period);
        require_history(series.len(), rsi.period + 1)?;
        let value = rsi
            .compute(&series.closes())
            .ok_or(StrategyError::Degenerate("rsi unavailable"))?;

        let (direction, overshoot) = if value > self.overbought {
            (Direction::Down, value - self.overbought)
        } else if value < self.oversold {
            (Direction::Up, self.oversold - value)
        } else {
            return Ok(None);
        };
        let confidence = self.base_confidence.saturating_add(overshoot.round().min(25.0) as u8);

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("rsi", value);
        let patterns = trailing_patterns(series, features);
        Ok(Some(boost::apply(opinion, &patterns, BoostFamily::Reversal, self.boost_factor)))
    }
}
