//! Feature/indicator bank: one pass over a candle series producing every
//! reading the strategies, the aggregator and the filter consume.

use common::{
    CandleSeries, FeatureSnapshot, Rating, RiskLevel, RsiReading, Sentiment, VolatilityLevel,
    VolumeStatus,
};

use crate::indicators::{atr, dmi, mean, sma, std_dev, BollingerBands, MacdIndicator, RsiIndicator};
use crate::patterns;

/// Source of indicator readings for an evaluation.
pub trait IndicatorBank: Send + Sync {
    fn snapshot(&self, series: &CandleSeries) -> FeatureSnapshot;
}

/// Indicator set with the conventional periods.
#[derive(Debug, Clone)]
pub struct StandardIndicatorBank {
    pub rsi: RsiIndicator,
    pub macd: MacdIndicator,
    pub bollinger: BollingerBands,
    pub atr_period: usize,
    pub adx_period: usize,
    pub fast_ma: usize,
    pub slow_ma: usize,
    pub volatility_window: usize,
    pub volume_window: usize,
    /// Candles scanned for support and resistance.
    pub level_lookback: usize,
}

impl Default for StandardIndicatorBank {
    fn default() -> Self {
        Self {
            rsi: RsiIndicator::new(14),
            macd: MacdIndicator::default(),
            bollinger: BollingerBands::default(),
            atr_period: 14,
            adx_period: 14,
            fast_ma: 5,
            slow_ma: 20,
            volatility_window: 14,
            volume_window: 20,
            level_lookback: 10,
        }
    }
}

impl IndicatorBank for StandardIndicatorBank {
    fn snapshot(&self, series: &CandleSeries) -> FeatureSnapshot {
        let closes = series.closes();
        let volumes = series.volumes();

        let rsi = self.rsi.compute(&closes).map(RsiReading::new);
        let macd = self.macd.compute(&closes);
        let oscillators = match (rsi, macd) {
            (Some(r), Some(m)) => Some(oscillator_rating(r.value, m.histogram)),
            _ => None,
        };

        let recent = series.trailing(self.level_lookback);
        let support = recent.iter().map(|c| c.low).reduce(f64::min);
        let resistance = recent.iter().map(|c| c.high).reduce(f64::max);

        FeatureSnapshot {
            rsi,
            macd,
            bollinger: self.bollinger.compute(&closes),
            atr: atr(series, self.atr_period),
            adx: dmi(series, self.adx_period).map(|d| d.adx),
            moving_averages: ma_rating(&closes, self.fast_ma, self.slow_ma),
            oscillators,
            volatility: volatility_level(&closes, self.volatility_window),
            volume_status: volume_status(&volumes, self.volume_window),
            sentiment: sentiment(&closes),
            support,
            resistance,
            variation: variation(&closes),
            patterns: patterns::detect(series),
        }
    }
}

/// Buy when the fast SMA is above the slow one, sell when below.
pub fn ma_rating(closes: &[f64], fast: usize, slow: usize) -> Option<Rating> {
    let f = sma(closes, fast)?;
    let s = sma(closes, slow)?;
    Some(if f > s {
        Rating::Buy
    } else if f < s {
        Rating::Sell
    } else {
        Rating::Neutral
    })
}

/// Overbought with a falling histogram sells, oversold with a rising one buys.
pub fn oscillator_rating(rsi: f64, histogram: f64) -> Rating {
    if rsi > 70.0 && histogram < 0.0 {
        Rating::Sell
    } else if rsi < 30.0 && histogram > 0.0 {
        Rating::Buy
    } else {
        Rating::Neutral
    }
}

/// High when the current rolling standard deviation of closes exceeds the
/// median of all rolling standard deviations over the series.
pub fn volatility_level(closes: &[f64], window: usize) -> Option<VolatilityLevel> {
    if window < 2 || closes.len() < window {
        return None;
    }
    let mut stds: Vec<f64> = closes.windows(window).filter_map(std_dev).collect();
    let current = *stds.last()?;
    stds.sort_by(|a, b| a.total_cmp(b));
    let mid = stds.len() / 2;
    let median = if stds.len() % 2 == 0 {
        (stds[mid - 1] + stds[mid]) / 2.0
    } else {
        stds[mid]
    };
    Some(if current > median {
        VolatilityLevel::High
    } else {
        VolatilityLevel::Low
    })
}

/// Last volume against its moving average: spiked above 1.5×, low under 0.7×.
pub fn volume_status(volumes: &[f64], window: usize) -> Option<VolumeStatus> {
    let last = *volumes.last()?;
    let avg = sma(volumes, window)?;
    Some(if last > avg * 1.5 {
        VolumeStatus::Spiked
    } else if last < avg * 0.7 {
        VolumeStatus::Low
    } else {
        VolumeStatus::Normal
    })
}

/// Direction of the last three closes.
pub fn sentiment(closes: &[f64]) -> Option<Sentiment> {
    match closes {
        [.., a, b, c] if a < b && b < c => Some(Sentiment::Optimistic),
        [.., a, b, c] if a > b && b > c => Some(Sentiment::Pessimistic),
        [.., _, _, _] => Some(Sentiment::Neutral),
        _ => None,
    }
}

/// Percent change of the last close against the one before it.
pub fn variation(closes: &[f64]) -> Option<f64> {
    match closes {
        [.., prev, last] if *prev != 0.0 => Some((last - prev) / prev * 100.0),
        _ => None,
    }
}

/// Low when volatility is low and the trend is weak, otherwise high.
pub fn risk_level(features: &FeatureSnapshot) -> Option<RiskLevel> {
    let volatility = features.volatility?;
    let adx = features.adx.unwrap_or(0.0);
    Some(if volatility == VolatilityLevel::Low && adx < 25.0 {
        RiskLevel::Low
    } else {
        RiskLevel::High
    })
}

/// Mean volume of the `window` candles before the last one.
pub fn prior_volume_mean(volumes: &[f64], window: usize) -> Option<f64> {
    let (_, before) = volumes.split_last()?;
    let start = before.len().saturating_sub(window);
    mean(&before[start..])
}
