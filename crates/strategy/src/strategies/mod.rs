//! The built-in strategy set.

mod adx_trend;
mod atr_breakout;
mod bollinger_breakout;
mod candlestick;
mod ema_trend;
mod ma_crossover;
mod macd_reversal;
mod price_action;
mod rsi_ma;
mod rsi_threshold;
mod wick_reversal;

pub use adx_trend::AdxTrendStrategy;
pub use atr_breakout::AtrBreakoutStrategy;
pub use bollinger_breakout::BollingerBreakoutStrategy;
pub use candlestick::CandlestickStrategy;
pub use ema_trend::EmaTrendStrategy;
pub use ma_crossover::MaCrossoverStrategy;
pub use macd_reversal::MacdReversalStrategy;
pub use price_action::PriceActionStrategy;
pub use rsi_ma::RsiMaStrategy;
pub use rsi_threshold::RsiStrategy;
pub use wick_reversal::WickReversalStrategy;

use common::{CandleSeries, Direction, FeatureSnapshot, PatternTag};

use crate::patterns;

/// Confidence added when a reversal signal follows a move in the opposite
/// direction.
pub(crate) const TREND_CONFIRMATION_BONUS: u8 = 5;

/// Patterns on the trailing window, taken from the snapshot when one exists.
pub(crate) fn trailing_patterns(
    series: &CandleSeries,
    features: Option<&FeatureSnapshot>,
) -> Vec<PatternTag> {
    match features {
        Some(f) => f.patterns.clone(),
        None => patterns::detect(series),
    }
}

/// True when the `lookback` closes before the last candle moved against
/// `direction`, i.e. there is something to reverse.
pub(crate) fn reverses_prior_move(series: &CandleSeries, lookback: usize, direction: Direction) -> bool {
    let n = series.len();
    if lookback == 0 || n < lookback + 2 {
        return false;
    }
    let change = series[n - 2].close - series[n - 2 - lookback].close;
    match direction {
        Direction::Up => change < 0.0,
        Direction::Down => change > 0.0,
        Direction::Neutral => false,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use common::{Candle, CandleSeries};

    /// Series of candles with the given closes, each opening at the previous
    /// close and a small symmetric wick.
    pub fn from_closes(closes: &[f64]) -> CandleSeries {
        let mut prev = closes.first().copied().unwrap_or(1.0);
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = prev;
                prev = close;
                let high = open.max(close) + 0.0005;
                let low = open.min(close) - 0.0005;
                Candle::new(i as i64 * 60, open, high, low, close, 1000.0)
            })
            .collect();
        CandleSeries::new(candles).unwrap()
    }

    pub fn from_candles(candles: Vec<Candle>) -> CandleSeries {
        CandleSeries::new(candles).unwrap()
    }
}
