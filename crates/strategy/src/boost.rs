//! Pattern boost: raise a strategy's confidence when the trailing candlestick
//! patterns corroborate its direction.

use common::{boost, patterns::strength_in, Direction, PatternCategory, PatternTag, StrategyOpinion};

/// Default share of the summed pattern strength converted into confidence.
pub const DEFAULT_BOOST_FACTOR: f64 = 0.2;

/// Which family of patterns corroborates a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostFamily {
    Reversal,
    Trend,
}

impl BoostFamily {
    fn category(self, direction: Direction) -> PatternCategory {
        match (self, direction) {
            (BoostFamily::Reversal, Direction::Up) => PatternCategory::ReversalUp,
            (BoostFamily::Reversal, Direction::Down) => PatternCategory::ReversalDown,
            (BoostFamily::Trend, Direction::Up) => PatternCategory::TrendUp,
            (BoostFamily::Trend, Direction::Down) => PatternCategory::TrendDown,
            (_, Direction::Neutral) => PatternCategory::Neutral,
        }
    }
}

/// Add `floor(strength × 20 × factor)` to the opinion's confidence, capped at
/// 100, where `strength` sums the matching patterns. Records the matching tags
/// and their strength on the opinion. Opinions without a confidence are left
/// untouched.
pub fn apply(
    mut opinion: StrategyOpinion,
    patterns: &[PatternTag],
    family: BoostFamily,
    factor: f64,
) -> StrategyOpinion {
    let Some(confidence) = opinion.confidence else {
        return opinion;
    };
    let category = family.category(opinion.direction);
    let strength = strength_in(patterns, &[category]);
    if strength <= 0.0 {
        return opinion;
    }
    let amount = (strength * 20.0 * factor).floor().clamp(0.0, 100.0) as u8;
    opinion.confidence = Some(boost(confidence, amount));
    opinion.patterns = patterns
        .iter()
        .copied()
        .filter(|p| p.in_category(category))
        .collect();
    opinion.pattern_strength = Some(strength);
    opinion
}
