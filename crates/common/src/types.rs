use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, PatternTag, Result};

/// Stand-in for a zero high-low range so ratios never divide by zero.
pub const RANGE_EPSILON: f64 = 1e-8;

pub const MAX_CONFIDENCE: u8 = 100;

/// One OHLCV bar. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self { timestamp, open, high, low, close, volume }
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// High-low range, floored at [`RANGE_EPSILON`].
    pub fn range(&self) -> f64 {
        (self.high - self.low).max(RANGE_EPSILON)
    }

    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Midpoint of the real body.
    pub fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }

    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp, 0)
            .single()
            .unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidCandle {
            timestamp: self.timestamp,
            reason: reason.to_string(),
        };
        let values = [self.open, self.high, self.low, self.close, self.volume];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("non-finite value"));
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(invalid("high below open/close/low"));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(invalid("low above open/close/high"));
        }
        if self.volume < 0.0 {
            return Err(invalid("negative volume"));
        }
        Ok(())
    }
}

/// Chronological, duplicate-free sequence of candles (oldest first).
///
/// Built once per evaluation and shared read-only by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Validate, sort and de-duplicate raw candles. When two candles share a
    /// timestamp the one that appears later in the input wins.
    pub fn new(mut candles: Vec<Candle>) -> Result<Self> {
        for candle in &candles {
            candle.validate()?;
        }
        // Stable sort keeps input order among equal timestamps.
        candles.sort_by_key(|c| c.timestamp);
        let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
        for candle in candles {
            match deduped.last_mut() {
                Some(last) if last.timestamp == candle.timestamp => *last = candle,
                _ => deduped.push(candle),
            }
        }
        Ok(Self { candles: deduped })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// The most recent `n` candles (or all of them when fewer exist).
    pub fn trailing(&self, n: usize) -> &[Candle] {
        let start = self.candles.len().saturating_sub(n);
        &self.candles[start..]
    }

    /// Owned copy of the most recent `n` candles.
    pub fn tail(&self, n: usize) -> Self {
        Self { candles: self.trailing(n).to_vec() }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

impl std::ops::Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &[Candle] {
        &self.candles
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        CandleSeries::new(candles).map_err(serde::de::Error::custom)
    }
}

/// Directional opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

impl Direction {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Direction::Neutral)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// `Strong` at or above `strong_at`, `Moderate` otherwise.
    pub fn from_confidence(confidence: u8, strong_at: u8) -> Self {
        if confidence >= strong_at {
            Strength::Strong
        } else {
            Strength::Moderate
        }
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::Weak => write!(f, "weak"),
            Strength::Moderate => write!(f, "moderate"),
            Strength::Strong => write!(f, "strong"),
        }
    }
}

/// Lower `confidence` by `amount`, never below `floor`, never above 100.
pub fn penalize(confidence: u8, amount: u8, floor: u8) -> u8 {
    confidence.saturating_sub(amount).max(floor).min(MAX_CONFIDENCE)
}

/// Raise `confidence` by `amount`, capped at 100.
pub fn boost(confidence: u8, amount: u8) -> u8 {
    confidence.saturating_add(amount).min(MAX_CONFIDENCE)
}

/// Convert a raw score into a confidence, clamped to `[0, 100]`. Halves
/// round to the even neighbour, so 62.5 becomes 62.
pub fn to_confidence(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    score.round_ties_even().clamp(0.0, MAX_CONFIDENCE as f64) as u8
}

// ─── Qualitative labels ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeStatus {
    Low,
    Normal,
    Spiked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Pessimistic,
    Neutral,
    Optimistic,
}

/// Buy/sell/neutral rating, as used for the moving-average and oscillator summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Sell,
    Neutral,
    Buy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

macro_rules! label_display {
    ($ty:ident { $($variant:ident => $label:literal),* $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($ty::$variant => write!(f, $label),)*
                }
            }
        }
    };
}

label_display!(RiskLevel { Low => "low", Moderate => "moderate", High => "high" });
label_display!(VolatilityLevel { Low => "low", Moderate => "moderate", High => "high" });
label_display!(VolumeStatus { Low => "low", Normal => "normal", Spiked => "spiked" });
label_display!(Sentiment { Pessimistic => "pessimistic", Neutral => "neutral", Optimistic => "optimistic" });
label_display!(Rating { Sell => "sell", Neutral => "neutral", Buy => "buy" });
label_display!(RsiZone { Oversold => "oversold", Neutral => "neutral", Overbought => "overbought" });

// ─── Indicator readings ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiReading {
    pub value: f64,
    pub zone: RsiZone,
}

impl RsiReading {
    pub fn new(value: f64) -> Self {
        let zone = if value > 70.0 {
            RsiZone::Overbought
        } else if value < 30.0 {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        };
        Self { value, zone }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub width: f64,
    /// Position of the last close relative to the middle band, scaled so the
    /// bands sit at -1 and +1.
    pub position: f64,
}

/// Every indicator reading the feature bank produces for one evaluation.
/// Fields are `None` when the series is too short for that indicator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub rsi: Option<RsiReading>,
    pub macd: Option<MacdReading>,
    pub bollinger: Option<BollingerReading>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub moving_averages: Option<Rating>,
    pub oscillators: Option<Rating>,
    pub volatility: Option<VolatilityLevel>,
    pub volume_status: Option<VolumeStatus>,
    pub sentiment: Option<Sentiment>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    /// Percent change of the last close against the previous one.
    pub variation: Option<f64>,
    /// Tags detected on the trailing pattern window.
    pub patterns: Vec<PatternTag>,
}

// ─── Strategy and ensemble output ────────────────────────────────────────────

/// Output of one strategy for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyOpinion {
    pub strategy: String,
    pub direction: Direction,
    pub confidence: Option<u8>,
    /// Strategy-specific values (indicator readings, distances, ratios).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, f64>,
    /// Patterns that boosted this opinion's confidence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_strength: Option<f64>,
}

impl StrategyOpinion {
    pub fn new(strategy: impl Into<String>, direction: Direction) -> Self {
        Self {
            strategy: strategy.into(),
            direction,
            confidence: None,
            details: BTreeMap::new(),
            patterns: Vec::new(),
            pattern_strength: None,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(MAX_CONFIDENCE));
        self
    }

    pub fn with_detail(mut self, key: &str, value: f64) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// Vote counts behind a composite signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub up: usize,
    pub down: usize,
    pub neutral: usize,
}

impl VoteTally {
    pub fn from_opinions(opinions: &[StrategyOpinion]) -> Self {
        opinions.iter().fold(Self::default(), |mut tally, o| {
            match o.direction {
                Direction::Up => tally.up += 1,
                Direction::Down => tally.down += 1,
                Direction::Neutral => tally.neutral += 1,
            }
            tally
        })
    }

    pub fn directional(&self) -> usize {
        self.up + self.down
    }

    /// `Some` majority direction, `None` when tied.
    pub fn majority(&self) -> Option<Direction> {
        match self.up.cmp(&self.down) {
            std::cmp::Ordering::Greater => Some(Direction::Up),
            std::cmp::Ordering::Less => Some(Direction::Down),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// The ensemble's recommendation, before or after the acceptance filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub strength: Strength,
    pub confidence: u8,
    /// Confidence and strength as handed over by the aggregator. The filter
    /// always starts from these.
    pub aggregate_confidence: u8,
    pub aggregate_strength: Strength,
    pub price: f64,
    pub recommended_entry_time: DateTime<Utc>,
    pub recommended_entry_price: f64,
    pub expire_entry_time: DateTime<Utc>,
    pub expire_entry_price: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub variation: Option<f64>,
    pub risk: Option<RiskLevel>,
    pub volatility: Option<VolatilityLevel>,
    pub sentiment: Option<Sentiment>,
    pub volume_status: Option<VolumeStatus>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub moving_averages: Option<Rating>,
    pub oscillators: Option<Rating>,
    pub rsi: Option<RsiReading>,
    pub macd: Option<MacdReading>,
    pub bollinger: Option<BollingerReading>,
    pub atr: Option<f64>,
    pub adx: Option<f64>,
    pub patterns: Vec<PatternTag>,
    pub summary: String,
    pub votes: VoteTally,
    pub opinions: Vec<StrategyOpinion>,
    pub generated_at: DateTime<Utc>,
}

impl CompositeSignal {
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
