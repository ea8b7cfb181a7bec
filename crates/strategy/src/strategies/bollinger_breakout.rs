use common::{CandleSeries, Direction, FeatureSnapshot, StrategyOpinion};

use super::trailing_patterns;
use crate::boost::{self, BoostFamily, DEFAULT_BOOST_FACTOR};
use crate::error::{require_history, StrategyError};
use crate::indicators::BollingerBands;
use crate::Strategy;

/// Volatility breakout against the bands: a close below the lower band calls
/// a bounce up, a close above the upper band calls a pullback down. Bands
/// narrower than `min_band_pct` of the middle are ignored.
#[derive(Debug, Clone)]
pub struct BollingerBreakoutStrategy {
    pub name: String,
    pub period: usize,
    pub std_dev: f64,
    pub min_band_pct: f64,
    pub min_confidence: u8,
    pub boost_factor: f64,
}

impl Default for BollingerBreakoutStrategy {
    fn default() -> Self {
        Self {
            name: "bollinger_breakout".into(),
            period: 20,
            std_dev: 2.0,
            min_band_pct: 0.01,
            min_confidence: 65,
            boost_factor: DEFAULT_BOOST_FACTOR,
        }
    }
}

/// Confidence from the breakout distance: one point per 0.1% beyond the band,
/// at most 20.
fn distance_bonus(distance: f64, band: f64) -> u8 {
    if band <= 0.0 {
        return 0;
    }
    (distance / band * 1000.0).floor().clamp(0.0, 20.0) as u8
}

impl Strategy for BollingerBreakoutStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), self.period + 3)?;
        let closes = series.closes();
        let bands = BollingerBands::new(self.period, self.std_dev)
            .compute(&closes)
            .ok_or(StrategyError::Degenerate("bands unavailable"))?;
        if bands.middle <= 0.0 {
            return Err(StrategyError::Degenerate("non-positive middle band"));
        }
        let band_pct = bands.width / bands.middle;
        if band_pct <= self.min_band_pct {
            return Ok(None);
        }

        let close = closes[closes.len() - 1];
        let (direction, confidence, distance) = if close < bands.lower {
            let d = bands.lower - close;
            (Direction::Up, 70 + distance_bonus(d, bands.lower), d)
        } else if close > bands.upper {
            let d = close - bands.upper;
            (Direction::Down, 75 + distance_bonus(d, bands.upper), d)
        } else {
            return Ok(None);
        };

        let opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(confidence)
            .with_detail("upper_band", bands.upper)
            .with_detail("middle_band", bands.middle)
            .with_detail("lower_band", bands.lower)
            .with_detail("band_width", bands.width)
            .with_detail("distance", distance);
        let patterns = trailing_patterns(series, features);
        let opinion = boost::apply(opinion, &patterns, BoostFamily::Reversal, self.boost_factor);

        Ok(opinion
            .confidence
            .filter(|c| *c >= self.min_confidence)
            .map(|_| opinion))
    }
}
