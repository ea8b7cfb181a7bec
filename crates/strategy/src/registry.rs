use std::collections::HashMap;

use tracing::{debug, info};

use common::{CandleSeries, Error, FeatureSnapshot, Result, StrategyOpinion};

use crate::config::StrategyConfig;
use crate::strategies::*;
use crate::Strategy;

/// Every strategy type the registry can build, in default evaluation order.
pub const STRATEGY_TYPES: [&str; 11] = [
    "rsi_ma",
    "bollinger_breakout",
    "wick_reversal",
    "macd_reversal",
    "rsi",
    "ma_crossover",
    "candlestick",
    "price_action",
    "adx",
    "ema",
    "atr",
];

/// The ordered, extensible strategy set.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn Strategy>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry").field("strategies", &self.names()).finish()
    }
}

impl StrategyRegistry {
    /// Registry with every built-in strategy at its default parameters.
    pub fn with_defaults() -> Self {
        let configs: Vec<StrategyConfig> = STRATEGY_TYPES.iter().map(|t| StrategyConfig::new(t)).collect();
        // Built-in types with empty params always build.
        Self::from_config(&configs).unwrap_or_default()
    }

    /// Build the registry from config entries, skipping disabled ones.
    /// Unknown strategy types are a configuration error.
    pub fn from_config(configs: &[StrategyConfig]) -> Result<Self> {
        let mut registry = Self::default();
        for cfg in configs.iter().filter(|c| c.enabled) {
            let strategy = build_strategy(cfg)
                .map_err(|e| Error::Config(format!("strategy '{}': {e}", cfg.display_name())))?;
            info!(name = %strategy.name(), kind = %cfg.strategy_type, "Registered strategy");
            registry.strategies.push(strategy);
        }
        Ok(registry)
    }

    pub fn from_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn push(&mut self, strategy: Box<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run every strategy over the same inputs and collect the opinions that
    /// were formed. Failing strategies simply contribute nothing.
    pub fn opinions(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Vec<StrategyOpinion> {
        let opinions: Vec<StrategyOpinion> = self
            .strategies
            .iter()
            .filter_map(|s| s.generate(series, features))
            .collect();
        debug!(
            strategies = self.strategies.len(),
            opinions = opinions.len(),
            "Strategy pass complete"
        );
        opinions
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig) -> std::result::Result<Box<dyn Strategy>, String> {
    let p = &cfg.params;
    let name = cfg.display_name().to_string();
    let strategy: Box<dyn Strategy> = match cfg.strategy_type.as_str() {
        "rsi_ma" => {
            let d = RsiMaStrategy::default();
            Box::new(RsiMaStrategy {
                name,
                rsi_period: param_usize(p, "rsi_period", d.rsi_period),
                ma_period: param_usize(p, "ma_period", d.ma_period),
                overbought: param_f64(p, "overbought", d.overbought),
                oversold: param_f64(p, "oversold", d.oversold),
                confidence: param_u8(p, "confidence", d.confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "bollinger_breakout" => {
            let d = BollingerBreakoutStrategy::default();
            Box::new(BollingerBreakoutStrategy {
                name,
                period: param_usize(p, "period", d.period),
                std_dev: param_f64(p, "std_dev", d.std_dev),
                min_band_pct: param_f64(p, "min_band_pct", d.min_band_pct),
                min_confidence: param_u8(p, "min_confidence", d.min_confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "wick_reversal" => {
            let d = WickReversalStrategy::default();
            Box::new(WickReversalStrategy {
                name,
                wick_ratio: param_f64(p, "wick_ratio", d.wick_ratio),
                min_body_ratio: param_f64(p, "min_body_ratio", d.min_body_ratio),
                volume_multiplier: param_f64(p, "volume_multiplier", d.volume_multiplier),
                volume_window: param_usize(p, "volume_window", d.volume_window),
                trend_lookback: param_usize(p, "trend_lookback", d.trend_lookback),
                confidence: param_u8(p, "confidence", d.confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "macd_reversal" => {
            let d = MacdReversalStrategy::default();
            let s = MacdReversalStrategy {
                name,
                fast: param_usize(p, "fast", d.fast),
                slow: param_usize(p, "slow", d.slow),
                signal: param_usize(p, "signal", d.signal),
                threshold: param_f64(p, "threshold", d.threshold),
                volume_spike: param_f64(p, "volume_spike", d.volume_spike),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            };
            if s.fast >= s.slow {
                return Err(format!("fast period {} must be below slow period {}", s.fast, s.slow));
            }
            Box::new(s)
        }
        "rsi" => {
            let d = RsiStrategy::default();
            Box::new(RsiStrategy {
                name,
                period: param_usize(p, "period", d.period),
                overbought: param_f64(p, "overbought", d.overbought),
                oversold: param_f64(p, "oversold", d.oversold),
                base_confidence: param_u8(p, "base_confidence", d.base_confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "ma_crossover" => {
            let d = MaCrossoverStrategy::default();
            Box::new(MaCrossoverStrategy {
                name,
                fast: param_usize(p, "fast", d.fast),
                slow: param_usize(p, "slow", d.slow),
                min_history: param_usize(p, "min_history", d.min_history),
                confirmation: param_usize(p, "confirmation", d.confirmation),
                confidence: param_u8(p, "confidence", d.confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "candlestick" => {
            let d = CandlestickStrategy::default();
            Box::new(CandlestickStrategy {
                name,
                min_history: param_usize(p, "min_history", d.min_history),
            })
        }
        "price_action" => {
            let d = PriceActionStrategy::default();
            Box::new(PriceActionStrategy {
                name,
                min_wick_ratio: param_f64(p, "min_wick_ratio", d.min_wick_ratio),
                volume_multiplier: param_f64(p, "volume_multiplier", d.volume_multiplier),
                trend_lookback: param_usize(p, "trend_lookback", d.trend_lookback),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "adx" => {
            let d = AdxTrendStrategy::default();
            Box::new(AdxTrendStrategy {
                name,
                period: param_usize(p, "period", d.period),
                threshold: param_f64(p, "threshold", d.threshold),
                base_confidence: param_u8(p, "base_confidence", d.base_confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "ema" => {
            let d = EmaTrendStrategy::default();
            Box::new(EmaTrendStrategy {
                name,
                short_period: param_usize(p, "short_period", d.short_period),
                long_period: param_usize(p, "long_period", d.long_period),
                confidence: param_u8(p, "confidence", d.confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        "atr" => {
            let d = AtrBreakoutStrategy::default();
            Box::new(AtrBreakoutStrategy {
                name,
                period: param_usize(p, "atr_period", d.period),
                multiplier: param_f64(p, "multiplier", d.multiplier),
                require_volume: param_bool(p, "require_volume", d.require_volume),
                volume_threshold: param_f64(p, "volume_threshold", d.volume_threshold),
                min_confidence: param_u8(p, "min_confidence", d.min_confidence),
                boost_factor: param_f64(p, "pattern_boost", d.boost_factor),
            })
        }
        other => return Err(format!("unknown type '{other}'")),
    };
    Ok(strategy)
}

/// Float parameter; integer TOML values are accepted too.
fn param_f64(params: &HashMap<String, toml::Value>, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
        .unwrap_or(default)
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn param_u8(params: &HashMap<String, toml::Value>, key: &str, default: u8) -> u8 {
    params
        .get(key)
        .and_then(|v| v.as_integer())
        .map(|v| v.clamp(0, 100) as u8)
        .unwrap_or(default)
}

fn param_bool(params: &HashMap<String, toml::Value>, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}
