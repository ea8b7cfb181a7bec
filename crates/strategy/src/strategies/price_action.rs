use tracing::trace;

use common::{boost, CandleSeries, Direction, FeatureSnapshot, PatternTag, StrategyOpinion};

use super::{reverses_prior_move, trailing_patterns, TREND_CONFIRMATION_BONUS};
use crate::bank::prior_volume_mean;
use crate::boost::{self as pattern_boost, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::Strategy;

/// Formations checked before single-candle pin bars, strongest first.
const FORMATIONS: [(PatternTag, Direction, u8); 6] = [
    (PatternTag::MorningStar, Direction::Up, 80),
    (PatternTag::EveningStar, Direction::Down, 80),
    (PatternTag::ThreeWhiteSoldiers, Direction::Up, 80),
    (PatternTag::ThreeBlackCrows, Direction::Down, 80),
    (PatternTag::BullishEngulfing, Direction::Up, 75),
    (PatternTag::BearishEngulfing, Direction::Down, 75),
];

const PIN_BAR_CONFIDENCE: u8 = 70;

/// Multi-bar price action: stars, soldiers/crows, engulfing, then pin bars.
#[derive(Debug, Clone)]
pub struct PriceActionStrategy {
    pub name: String,
    /// Minimum rejection wick as a multiple of the body for a pin bar.
    pub min_wick_ratio: f64,
    pub volume_multiplier: f64,
    pub trend_lookback: usize,
    pub boost_factor: f64,
}

impl Default for PriceActionStrategy {
    fn default() -> Self {
        Self {
            name: "price_action".into(),
            min_wick_ratio: 2.5,
            volume_multiplier: 2.0,
            trend_lookback: 5,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

impl Strategy for PriceActionStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), 2)?;
        let patterns = trailing_patterns(series, features);
        let last = series[series.len() - 1];

        let formation = FORMATIONS
            .iter()
            .find(|(tag, _, _)| patterns.contains(tag))
            .map(|&(tag, dir, conf)| (tag.as_str(), dir, conf));

        let (setup, direction, mut confidence) = match formation {
            Some(found) => found,
            None => {
                let body = last.body();
                if body / last.range() < 0.1 {
                    // Doji: indecision.
                    return Ok(None);
                }
                let (upper, lower) = (last.upper_wick(), last.lower_wick());
                if lower > body * self.min_wick_ratio && upper < body * 0.3 {
                    ("pinbar_bottom", Direction::Up, PIN_BAR_CONFIDENCE)
                } else if upper > body * self.min_wick_ratio && lower < body * 0.3 {
                    ("pinbar_top", Direction::Down, PIN_BAR_CONFIDENCE)
                } else {
                    return Ok(None);
                }
            }
        };

        let volumes = series.volumes();
        if let Some(avg) = prior_volume_mean(&volumes, self.trend_lookback) {
            if avg > 0.0 && last.volume > avg * self.volume_multiplier {
                confidence = boost(confidence, 5);
            }
        }
        if reverses_prior_move(series, self.trend_lookback, direction) {
            confidence = boost(confidence, TREND_CONFIRMATION_BONUS);
        }

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("body_ratio", last.body() / last.range());
        trace!(strategy = %self.name, setup, "Price action setup");
        Ok(Some(pattern_boost::apply(
            opinion,
            &patterns,
            BoostFamily::Reversal,
            self.boost_factor,
        )))
    }
}
