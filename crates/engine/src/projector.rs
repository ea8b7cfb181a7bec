//! Entry/expiry projection.
//!
//! Instead of always recommending the latest candle, the projector scores a
//! short trailing window and picks the candle that looks like the best entry,
//! then places the expiry a number of candles after it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use common::{Candle, FeatureSnapshot, PatternCategory, VolatilityLevel};

pub const DEFAULT_LOOKAHEAD: usize = 5;

// ─── Configuration ───────────────────────────────────────────────────────────

/// How many candles after the entry the expiry sits.
///
/// ```toml
/// [projector.expiry]
/// mode = "dynamic"
/// min = 1
/// max = 5
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpiryPolicy {
    Fixed { candles: usize },
    Dynamic(DynamicExpiry),
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        ExpiryPolicy::Fixed { candles: 1 }
    }
}

/// Expiry chosen from market conditions: short in choppy or reversing
/// markets, long in a strong, orderly trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicExpiry {
    pub min: usize,
    pub max: usize,
    /// Used when no condition applies.
    pub fallback: usize,
    /// ADX above this counts as a strong trend.
    pub strong_trend_adx: f64,
    /// ATR above this shortens a long expiry by one candle.
    pub high_atr: f64,
}

impl Default for DynamicExpiry {
    fn default() -> Self {
        Self {
            min: 1,
            max: 5,
            fallback: 2,
            strong_trend_adx: 30.0,
            high_atr: 2.0,
        }
    }
}

impl DynamicExpiry {
    pub fn candles(&self, features: &FeatureSnapshot) -> usize {
        let max = self.max.max(self.min);
        let high_volatility = features.volatility == Some(VolatilityLevel::High);
        let strong_trend = features.adx.unwrap_or(25.0) > self.strong_trend_adx;
        let reversal = features.patterns.iter().any(|p| {
            p.in_category(PatternCategory::ReversalUp) || p.in_category(PatternCategory::ReversalDown)
        });
        let atr = features.atr.unwrap_or(0.0);

        let candles = if high_volatility && !strong_trend {
            self.min
        } else if strong_trend && !high_volatility {
            max
        } else if reversal {
            self.min
        } else if atr > self.high_atr {
            (self.min + 2).max(max.saturating_sub(1))
        } else {
            self.fallback
        };
        candles.clamp(self.min, max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorConfig {
    /// Candles searched for an entry, not counting the latest one.
    pub lookahead: usize,
    pub expiry: ExpiryPolicy,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            expiry: ExpiryPolicy::default(),
        }
    }
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Recommended entry and expiry points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub entry_index: usize,
    /// `None` when the expiry falls past the end of the series and the
    /// expiry point is synthetic.
    pub expiry_index: Option<usize>,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub expiry_time: DateTime<Utc>,
    pub expiry_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Projector {
    config: ProjectorConfig,
}

impl Projector {
    pub fn new(config: ProjectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    /// Expiry offset in candles for the given market conditions.
    pub fn expiry_offset(&self, features: &FeatureSnapshot) -> usize {
        match self.config.expiry {
            ExpiryPolicy::Fixed { candles } => candles,
            ExpiryPolicy::Dynamic(dynamic) => dynamic.candles(features),
        }
    }

    /// Pick entry and expiry. Returns `None` only for an empty series.
    pub fn project(&self, candles: &[Candle], features: &FeatureSnapshot) -> Option<Projection> {
        let entry_index = select_entry(candles, self.config.lookahead)?;
        let entry = &candles[entry_index];
        let offset = self.expiry_offset(features);

        let target = entry_index + offset;
        let projection = match candles.get(target) {
            Some(expiry) => Projection {
                entry_index,
                expiry_index: Some(target),
                entry_time: entry.time(),
                entry_price: entry.close,
                expiry_time: expiry.time(),
                expiry_price: expiry.close,
            },
            None => Projection {
                entry_index,
                expiry_index: None,
                entry_time: entry.time(),
                entry_price: entry.close,
                expiry_time: entry.time() + Duration::minutes(offset as i64),
                expiry_price: entry.close,
            },
        };
        Some(projection)
    }
}

/// Index of the best entry candle.
///
/// Candidates are the `lookahead` candles before the latest one. With fewer
/// than `lookahead + 2` candles the search is skipped and the second-to-last
/// candle is used. Equal scores go to the most recent candidate.
pub fn select_entry(candles: &[Candle], lookahead: usize) -> Option<usize> {
    let n = candles.len();
    if n == 0 {
        return None;
    }
    if lookahead == 0 || n < lookahead + 2 {
        return Some(n.saturating_sub(2));
    }
    (n - 1 - lookahead..n - 1).max_by_key(|&i| entry_score(&candles[i], &candles[i - 1]))
}

/// One point each for a strong body, a higher close and higher volume than
/// the previous candle.
pub fn entry_score(candle: &Candle, prev: &Candle) -> u8 {
    let strong_body = candle.body() > 0.5 * (candle.high - candle.low);
    let rising = candle.close > prev.close;
    let volume_up = candle.volume > prev.volume;
    strong_body as u8 + rising as u8 + volume_up as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PatternTag;

    fn flat(ts: i64, price: f64) -> Candle {
        Candle::new(ts, price, price + 0.001, price - 0.001, price, 100.0)
    }

    fn series(n: usize) -> Vec<Candle> {
        (0..n).map(|i| flat(i as i64 * 60, 1.1)).collect()
    }

    #[test]
    fn short_series_falls_back_to_second_to_last() {
        assert_eq!(select_entry(&series(6), 5), Some(4));
        assert_eq!(select_entry(&series(1), 5), Some(0));
        assert_eq!(select_entry(&[], 5), None);
    }

    #[test]
    fn equal_scores_prefer_the_latest_candidate() {
        assert_eq!(select_entry(&series(10), 5), Some(8));
    }

    #[test]
    fn best_scoring_candle_wins() {
        let mut candles = series(10);
        // Strong rising candle on rising volume at index 5.
        candles[5] = Candle::new(300, 1.1, 1.103, 1.0995, 1.1028, 500.0);
        // Later candles fall back below it.
        candles[6] = flat(360, 1.1);
        assert_eq!(entry_score(&candles[5], &candles[4]), 3);
        assert_eq!(select_entry(&candles, 5), Some(5));
    }

    #[test]
    fn expiry_inside_series_uses_the_real_candle() {
        let candles = series(10);
        let p = Projector::default().project(&candles, &FeatureSnapshot::default()).unwrap();
        assert_eq!(p.entry_index, 8);
        assert_eq!(p.expiry_index, Some(9));
        assert_eq!(p.expiry_time, candles[9].time());
    }

    #[test]
    fn expiry_past_the_end_is_synthetic() {
        let candles = series(10);
        let projector = Projector::new(ProjectorConfig {
            lookahead: 5,
            expiry: ExpiryPolicy::Fixed { candles: 3 },
        });
        let p = projector.project(&candles, &FeatureSnapshot::default()).unwrap();
        assert_eq!(p.expiry_index, None);
        assert_eq!(p.expiry_price, p.entry_price);
        assert_eq!(p.expiry_time - p.entry_time, Duration::minutes(3));
    }

    #[test]
    fn dynamic_expiry_follows_market_conditions() {
        let dynamic = DynamicExpiry::default();
        let mut features = FeatureSnapshot::default();
        assert_eq!(dynamic.candles(&features), 2);

        features.volatility = Some(VolatilityLevel::High);
        features.adx = Some(20.0);
        assert_eq!(dynamic.candles(&features), 1);

        features.volatility = Some(VolatilityLevel::Moderate);
        features.adx = Some(35.0);
        assert_eq!(dynamic.candles(&features), 5);

        features.adx = Some(20.0);
        features.patterns = vec![PatternTag::BullishEngulfing];
        assert_eq!(dynamic.candles(&features), 1);

        features.patterns.clear();
        features.atr = Some(3.0);
        assert_eq!(dynamic.candles(&features), 4);
    }

    #[test]
    fn expiry_policy_reads_from_toml() {
        let cfg: ProjectorConfig = toml::from_str(
            r#"
            lookahead = 3
            [expiry]
            mode = "dynamic"
            max = 4
            "#,
        )
        .unwrap();
        assert_eq!(cfg.lookahead, 3);
        match cfg.expiry {
            ExpiryPolicy::Dynamic(d) => {
                assert_eq!(d.max, 4);
                assert_eq!(d.min, 1);
            }
            other => panic!("unexpected policy {other:?}"),
        }
    }
}
