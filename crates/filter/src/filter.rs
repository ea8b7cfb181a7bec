use tracing::{info, warn};

use common::{
    boost, penalize, Candle, CompositeSignal, Direction, PatternBias, PatternTag, Rating, Sentiment,
    Strength,
};

use crate::config::FilterConfig;
use crate::rejection::Rejection;

/// Slack for float sums compared against the pattern reject threshold.
const STRENGTH_TOLERANCE: f64 = 1e-9;

/// Final rule-based gate between the ensemble and the caller.
///
/// Rules run in a fixed order; each one either vetoes the signal outright or
/// adjusts its confidence and lets it through to the next. The filter keeps no
/// state between calls and always starts from the aggregate confidence carried
/// on the signal, so applying it to its own output gives the same result.
#[derive(Debug, Clone, Default)]
pub struct AcceptanceFilter {
    config: FilterConfig,
}

impl AcceptanceFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Run every rule against `signal`, using `history` (oldest first) for the
    /// latest candle.
    pub fn apply(
        &self,
        mut signal: CompositeSignal,
        history: &[Candle],
    ) -> Result<CompositeSignal, Rejection> {
        let cfg = &self.config;
        let Some(latest) = history.last() else {
            return Err(self.reject(&signal, Rejection::EmptyHistory));
        };
        let direction = signal.direction;
        if !direction.is_directional() {
            return Err(self.reject(&signal, Rejection::NonDirectional));
        }

        signal.confidence = signal.aggregate_confidence;
        signal.strength = signal.aggregate_strength;

        // ── Candle quality ───────────────────────────────────────────────
        let body_ratio = latest.body() / latest.range();
        if body_ratio < cfg.min_body_ratio || latest.volume < cfg.min_volume {
            signal.confidence = penalize(signal.confidence, cfg.quality_penalty, cfg.confidence_floor);
            signal.strength = Strength::Weak;
            info!(symbol = %signal.symbol, body_ratio, volume = latest.volume, "Weak candle penalty");
        } else {
            signal.confidence = boost(signal.confidence, cfg.quality_boost);
            signal.strength = Strength::from_confidence(signal.confidence, cfg.strong_at);
        }

        // ── Contrary patterns ────────────────────────────────────────────
        let contrary = self.contrary_strength(&signal.patterns, direction);
        if contrary + STRENGTH_TOLERANCE >= cfg.pattern_reject_strength {
            return Err(self.reject(&signal, Rejection::ContraryPatterns { strength: contrary }));
        }
        if contrary > 0.0 {
            let amount = (contrary * cfg.pattern_penalty_factor).floor().clamp(0.0, 100.0) as u8;
            signal.confidence = penalize(signal.confidence, amount, cfg.confidence_floor);
            info!(symbol = %signal.symbol, contrary, penalty = amount, "Contrary pattern penalty");
        }

        // ── Qualitative gates ────────────────────────────────────────────
        if let Some(risk) = signal.risk {
            if !cfg.allowed_risk.contains(&risk) {
                return Err(self.reject(&signal, Rejection::RiskNotAllowed(risk)));
            }
        }
        if let Some(volatility) = signal.volatility {
            if !cfg.allowed_volatility.contains(&volatility) {
                return Err(self.reject(&signal, Rejection::VolatilityNotAllowed(volatility)));
            }
        }

        if let Some(rsi) = signal.rsi.map(|r| r.value) {
            let exhausted = match direction {
                Direction::Up => rsi > cfg.rsi_upper,
                _ => rsi < cfg.rsi_lower,
            };
            if exhausted {
                return Err(self.reject(&signal, Rejection::RsiExhausted { rsi, direction }));
            }
        }

        // ── Indicator disagreement penalties ─────────────────────────────
        let macd_disagrees = signal.macd.is_some_and(|m| against(m.histogram, direction));
        let bands_disagree = signal.bollinger.is_some_and(|b| against(b.position, direction));
        let osc_disagrees = signal.oscillators.is_some_and(|r| rating_against(r, direction));
        let ma_disagrees = signal.moving_averages.is_some_and(|r| rating_against(r, direction));
        for (name, disagrees) in [
            ("macd", macd_disagrees),
            ("bollinger", bands_disagree),
            ("oscillators", osc_disagrees),
            ("moving_averages", ma_disagrees),
        ] {
            if disagrees {
                signal.confidence =
                    penalize(signal.confidence, cfg.disagreement_penalty, cfg.confidence_floor);
                info!(symbol = %signal.symbol, indicator = name, "Indicator disagreement penalty");
            }
        }

        if let Some(sentiment) = signal.sentiment {
            let mismatch = matches!(
                (sentiment, direction),
                (Sentiment::Pessimistic, Direction::Up) | (Sentiment::Optimistic, Direction::Down)
            );
            if mismatch {
                return Err(self.reject(&signal, Rejection::SentimentMismatch { sentiment, direction }));
            }
        }

        // ── Support / resistance proximity ───────────────────────────────
        let price = latest.close;
        let level = match direction {
            Direction::Up => signal.resistance,
            _ => signal.support,
        };
        if let Some(level) = level.filter(|l| *l > 0.0 && price > 0.0) {
            let distance = (level - price).abs();
            if distance < cfg.min_level_distance {
                return Err(self.reject(&signal, Rejection::TooCloseToLevel { level, distance }));
            }
        }

        if let Some(variation) = signal.variation {
            if variation.abs() > cfg.max_variation_pct {
                return Err(self.reject(&signal, Rejection::ExtremeVariation(variation)));
            }
        }

        // ── Floors ───────────────────────────────────────────────────────
        if signal.confidence < cfg.min_confidence {
            return Err(self.reject(&signal, Rejection::LowConfidence(signal.confidence)));
        }
        let range = signal.high - signal.low;
        if range < cfg.min_volatility {
            return Err(self.reject(&signal, Rejection::LowVolatility(range)));
        }
        if signal.volume < cfg.min_volume {
            return Err(self.reject(&signal, Rejection::LowVolume(signal.volume)));
        }

        info!(
            symbol = %signal.symbol,
            direction = %signal.direction,
            confidence = signal.confidence,
            strength = %signal.strength,
            "Signal accepted"
        );
        Ok(signal)
    }

    /// Summed strength of the patterns pointing against `direction`, plus the
    /// fixed doji penalty.
    pub fn contrary_strength(&self, patterns: &[PatternTag], direction: Direction) -> f64 {
        patterns
            .iter()
            .map(|p| {
                let against = match (p.bias(), direction) {
                    (PatternBias::Bearish, Direction::Up) | (PatternBias::Bullish, Direction::Down) => {
                        p.strength()
                    }
                    _ => 0.0,
                };
                let doji = if *p == PatternTag::Doji { self.config.doji_penalty } else { 0.0 };
                against + doji
            })
            .sum()
    }

    fn reject(&self, signal: &CompositeSignal, reason: Rejection) -> Rejection {
        warn!(
            symbol = %signal.symbol,
            direction = %signal.direction,
            reason = %reason,
            "Signal rejected by filter"
        );
        reason
    }
}

/// A signed reading pointing the other way from `direction`.
fn against(value: f64, direction: Direction) -> bool {
    match direction {
        Direction::Up => value < 0.0,
        Direction::Down => value > 0.0,
        Direction::Neutral => false,
    }
}

fn rating_against(rating: Rating, direction: Direction) -> bool {
    matches!(
        (rating, direction),
        (Rating::Sell, Direction::Up) | (Rating::Buy, Direction::Down)
    )
}
