use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::sma_series;
use crate::Strategy;

/// Fast SMA against slow SMA. The relation has to hold on the last
/// `confirmation` bars before it counts.
#[derive(Debug, Clone)]
pub struct MaCrossoverStrategy {
    pub name: String,
    pub fast: usize,
    pub slow: usize,
    pub min_history: usize,
    pub confirmation: usize,
    pub confidence: u8,
    pub boost_factor: f64,
}

impl Default for MaCrossoverStrategy {
    fn default() -> Self {
        Self {
            name: "ma_crossover".into(),
            fast: 5,
            slow: 10,
            min_history: 20,
            confirmation: 2,
            confidence: 60,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for MaCrossoverStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        let confirmation = self.confirmation.max(1);
        require_history(
            series.len(),
            self.min_history.max(self.slow + confirmation - 1),
        )?;
        let closes = series.closes();
        let fast = sma_series(&closes, self.fast);
        let slow = sma_series(&closes, self.slow);
        if fast.len() < confirmation || slow.len() < confirmation {
            return Err(StrategyError::Degenerate("moving averages unavailable"));
        }

        let diffs: Vec<f64> = fast[fast.len() - confirmation..]
            .iter()
            .zip(&slow[slow.len() - confirmation..])
            .map(|(f, s)| f - s)
            .collect();
        let direction = if diffs.iter().all(|d| *d > 0.0) {
            Direction::Up
        } else if diffs.iter().all(|d| *d < 0.0) {
            Direction::Down
        } else {
            return Ok(None);
        };

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(self.confidence)
            .with_detail("fast_ma", fast[fast.len() - 1])
            .with_detail("slow_ma", slow[slow.len() - 1]);
        let patterns = trailing_patterns(series, features);
        Ok(Some(boost::apply(opinion, &patterns, BoostFamily::Trend, self.boost_factor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::from_closes;

    #[test]
    fn uptrend_calls_up() {
        let closes: Vec<f64> = (0..25).map(|i| 1.0 + i as f64 * 0.001).collect();
        let opinion = MaCrossoverStrategy::default().generate(&from_closes(&closes), None).unwrap();
        assert_eq!(opinion.direction, Direction::Up);
    }

    #[test]
    fn fresh_cross_is_not_yet_confirmed() {
        // Falling, then one sharp bar that lifts the fast average over the slow one.
        let mut closes: Vec<f64> = (0..24).map(|i| 1.1 - i as f64 * 0.001).collect();
        closes.push(1.2);
        let s = MaCrossoverStrategy::default();
        let series = from_closes(&closes);
        let closes = series.closes();
        let fast = sma_series(&closes, 5);
        let slow = sma_series(&closes, 10);
        assert!(fast[fast.len() - 1] > slow[slow.len() - 1]);
        assert!(fast[fast.len() - 2] < slow[slow.len() - 2]);
        assert!(s.generate(&series, None).is_none());
    }

    #[test]
    fn requires_minimum_history() {
        let closes: Vec<f64> = (0..19).map(|i| 1.0 + i as f64 * 0.001).collect();
        assert!(MaCrossoverStrategy::default().generate(&from_closes(&closes), None).is_none());
    }
}
