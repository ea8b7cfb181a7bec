use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::dmi;
use crate::Strategy;

/// Trend strength: with ADX above `threshold`, follow the dominant DI when the
/// last close moved the same way.
#[derive(Debug, Clone)]
pub struct AdxTrendStrategy {
    pub name: String,
    pub period: usize,
    pub threshold: f64,
    pub base_confidence: u8,
    pub boost_factor: f64,
}

impl Default for AdxTrendStrategy {
    fn default() -> Self {
        Self {
            name: "adx".into(),
            period: 14,
            threshold: 25.0,
            base_confidence: 60,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for AdxTrendStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), (2 * self.period).max(2))?;
        let reading = dmi(series, self.period).ok_or(StrategyError::Degenerate("adx unavailable"))?;
        if reading.adx <= self.threshold {
            return Ok(None);
        }

        let (prev, last) = (series[series.len() - 2], series[series.len() - 1]);
        let direction = if reading.plus_di > reading.minus_di && last.close > prev.close {
            Direction::Up
        } else if reading.minus_di > reading.plus_di && last.close < prev.close {
            Direction::Down
        } else {
            return Ok(None);
        };

        let excess = (reading.adx - self.threshold).round().clamp(0.0, 30.0) as u8;
        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(self.base_confidence.saturating_add(excess))
            .with_detail("adx", reading.adx)
            .with_detail("plus_di", reading.plus_di)
            .with_detail("minus_di", reading.minus_di);
        let patterns = trailing_patterns(series, features);
        Ok(Some(boost::apply(opinion, &patterns, BoostFamily::Trend, self.boost_factor)))
    }
}
