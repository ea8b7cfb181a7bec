use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::ema_series;
use crate::Strategy;

/// Trend following on a short/long EMA crossover that happens on the last bar.
#[derive(Debug, Clone)]
pub struct EmaTrendStrategy {
    pub name: String,
    pub short_period: usize,
    pub long_period: usize,
    pub confidence: u8,
    pub boost_factor: f64,
}

impl Default for EmaTrendStrategy {
    fn default() -> Self {
        Self {
            name: "ema".into(),
            short_period: 9,
            long_period: 21,
            confidence: 70,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for EmaTrendStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), self.short_period.max(self.long_period) + 1)?;
        let closes = series.closes();
        let short = ema_series(&closes, self.short_period)
            .ok_or(StrategyError::Degenerate("short ema unavailable"))?;
        let long = ema_series(&closes, self.long_period)
            .ok_or(StrategyError::Degenerate("long ema unavailable"))?;
        let (&[.., s_prev, s_last], &[.., l_prev, l_last]) = (short.as_slice(), long.as_slice()) else {
            return Err(StrategyError::Degenerate("ema too short"));
        };

        let direction = if s_prev < l_prev && s_last > l_last {
            Direction::Up
        } else if s_prev > l_prev && s_last < l_last {
            Direction::Down
        } else {
            return Ok(None);
        };

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(self.confidence)
            .with_detail("short_ema", s_last)
            .with_detail("long_ema", l_last);
        let patterns = trailing_patterns(series, features);
        Ok(Some(boost::apply(opinion, &patterns, BoostFamily::Trend, self.boost_factor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::test_support::from_closes;

    #[test]
    fn crossover_on_last_bar_calls_up() {
        let mut closes: Vec<f64> = (0..30).map(|i| 1.1 - i as f64 * 0.001).collect();
        let s = EmaTrendStrategy::default();
        let mut found = None;
        for i in 0..30 {
            closes.push(1.071 + i as f64 * 0.004);
            if let Some(op) = s.generate(&from_closes(&closes), None) {
                found = Some(op);
                break;
            }
        }
        let opinion = found.expect("crossover during the rally");
        assert_eq!(opinion.direction, Direction::Up);
        assert!(opinion.confidence.unwrap() >= 70);
    }

    #[test]
    fn no_cross_no_opinion() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0 + i as f64 * 0.001).collect();
        assert!(EmaTrendStrategy::default().generate(&from_closes(&closes), None).is_none());
    }
}
