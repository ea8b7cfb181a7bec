use common::{boost, CandleSeries, Direction, FeatureSnapshot, StrategyOpinion, MAX_CONFIDENCE};

use super::trailing_patterns;
use crate::bank::prior_volume_mean;
use crate::boost::{self as pattern_boost, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::{sma, MacdIndicator};
use crate::Strategy;

/// MACD histogram reversal: the histogram crossing zero, or recovering from
/// beyond `threshold` to within half of it, calls a turn.
///
/// A call in line with price against its slow SMA starts at 85, otherwise 70.
/// The histogram size adds up to 20, a MACD line on the right side of its
/// signal adds 10, and a volume spike adds 10 to the weaker calls.
#[derive(Debug, Clone)]
pub struct MacdReversalStrategy {
    pub name: String,
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub threshold: f64,
    pub volume_spike: f64,
    pub boost_factor: f64,
}

impl Default for MacdReversalStrategy {
    fn default() -> Self {
        Self {
            name: "macd_reversal".into(),
            fast: 10,
            slow: 21,
            signal: 7,
            threshold: 0.15,
            volume_spike: 1.5,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl MacdReversalStrategy {
    fn min_history(&self) -> usize {
        self.slow.max(self.signal) + 10
    }
}

impl Strategy for MacdReversalStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), self.min_history())?;
        let closes = series.closes();
        let readings = MacdIndicator::new(self.fast, self.slow, self.signal)
            .series(&closes)
            .ok_or(StrategyError::Degenerate("macd unavailable"))?;
        let [.., prev, curr] = readings.as_slice() else {
            return Err(StrategyError::InsufficientHistory {
                needed: self.min_history() + 1,
                got: series.len(),
            });
        };
        let (prev_hist, hist) = (prev.histogram, curr.histogram);
        let th = self.threshold;

        let direction = if (prev_hist < 0.0 && hist > 0.0) || (prev_hist < -th && hist > -th / 2.0) {
            Direction::Up
        } else if (prev_hist > 0.0 && hist < 0.0) || (prev_hist > th && hist < th / 2.0) {
            Direction::Down
        } else {
            return Ok(None);
        };

        let price = closes[closes.len() - 1];
        let slow_ma = sma(&closes, self.slow).ok_or(StrategyError::Degenerate("ma unavailable"))?;
        let aligned = match direction {
            Direction::Up => price > slow_ma,
            _ => price < slow_ma,
        };
        let line_agrees = match direction {
            Direction::Up => curr.value > curr.signal,
            _ => curr.value < curr.signal,
        };

        let base: f64 = if aligned { 85.0 } else { 70.0 };
        let hist_boost = (hist.abs() * 100.0).min(20.0);
        let line_boost = if line_agrees { 10.0 } else { 0.0 };
        let mut confidence = (base + hist_boost + line_boost).min(MAX_CONFIDENCE as f64) as u8;

        if !aligned {
            let volumes = series.volumes();
            let spike = prior_volume_mean(&volumes, 4)
                .map(|avg| avg > 0.0 && volumes[volumes.len() - 1] > avg * self.volume_spike)
                .unwrap_or(false);
            if spike {
                confidence = boost(confidence, 10);
            }
        }

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("macd", curr.value)
            .with_detail("signal_line", curr.signal)
            .with_detail("histogram", hist);
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
    use crate::strategies::test_support::from_closes;

    #[test]
    fn needs_history() {
        let s = MacdReversalStrategy::default();
        let series = from_closes(&[1.0; 30]);
        assert!(matches!(
            s.evaluate(&series, None),
            Err(StrategyError::InsufficientHistory { needed: 31, .. })
        ));
    }

    #[test]
    fn histogram_zero_cross_calls_up() {
        let s = MacdReversalStrategy::default();
        let mut closes: Vec<f64> = (0..40).map(|i| 1.2 - i as f64 * 0.002).collect();
        // Rally until the histogram turns positive, then stop on the crossing bar.
        let mut found = None;
        for i in 0..30 {
            closes.push(1.122 + i as f64 * 0.004);
            let series = from_closes(&closes);
            if let Some(op) = s.generate(&series, None) {
                found = Some(op);
                break;
            }
        }
        let opinion = found.expect("a reversal within the rally");
        assert_eq!(opinion.direction, Direction::Up);
        assert!(opinion.confidence.unwrap() >= 70);
        assert!(opinion.details["histogram"] > 0.0);
    }

    #[test]
    fn steady_trend_has_no_opinion() {
        let closes: Vec<f64> = (0..60).map(|i| 1.0 + i as f64 * 0.001).collect();
        assert!(MacdReversalStrategy::default()
            .generate(&from_closes(&closes), None)
            .is_none());
    }
}
