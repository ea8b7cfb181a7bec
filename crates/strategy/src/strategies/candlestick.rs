use common::{to_confidence, CandleSeries, Direction, FeatureSnapshot, PatternCategory, StrategyOpinion};

use super::trailing_patterns;
use crate::error::{require_history, StrategyError};
use crate::Strategy;

/// Raw candlestick vote: the most complex detected reversal pattern decides
/// the direction; a lone neutral pattern yields a neutral opinion.
#[derive(Debug, Clone)]
pub struct CandlestickStrategy {
    pub name: String,
    pub min_history: usize,
}

impl Default for CandlestickStrategy {
    fn default() -> Self {
        Self {
            name: "candlestick".into(),
            min_history: 3,
        }
    }
}

impl Strategy for CandlestickStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        require_history(series.len(), self.min_history)?;
        let patterns = trailing_patterns(series, features);

        // Detection lists longer formations last.
        let decisive = patterns.iter().rev().find_map(|p| {
            if p.in_category(PatternCategory::ReversalUp) {
                Some((*p, Direction::Up))
            } else if p.in_category(PatternCategory::ReversalDown) {
                Some((*p, Direction::Down))
            } else if p.in_category(PatternCategory::Neutral) {
                Some((*p, Direction::Neutral))
            } else {
                None
            }
        });
        let Some((pattern, direction)) = decisive else {
            return Ok(None);
        };

        let mut opinion = StrategyOpinion::new(&self.name, direction)
            .with_confidence(to_confidence(50.0 + 40.0 * pattern.strength()))
            .with_detail("pattern_strength", pattern.strength());
        opinion.patterns = vec![pattern];
        opinion.pattern_strength = Some(pattern.strength());
        Ok(Some(opinion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Candle, PatternTag};

    fn series() -> CandleSeries {
        CandleSeries::new(vec![
            Candle::new(0, 1.1000, 1.1005, 1.0940, 1.0950, 100.0),
            Candle::new(60, 1.0948, 1.0952, 1.0940, 1.0946, 100.0),
            Candle::new(120, 1.0950, 1.1012, 1.0949, 1.1010, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn uses_snapshot_patterns_when_given() {
        let features = FeatureSnapshot {
            patterns: vec![PatternTag::Doji, PatternTag::EveningStar],
            ..Default::default()
        };
        let opinion = CandlestickStrategy::default()
            .generate(&series(), Some(&features))
            .unwrap();
        assert_eq!(opinion.direction, Direction::Down);
        assert_eq!(opinion.confidence, Some(90));
        assert_eq!(opinion.patterns, vec![PatternTag::EveningStar]);
    }

    #[test]
    fn neutral_pattern_gives_neutral_opinion() {
        let features = FeatureSnapshot {
            patterns: vec![PatternTag::SpinningTop],
            ..Default::default()
        };
        let opinion = CandlestickStrategy::default()
            .generate(&series(), Some(&features))
            .unwrap();
        assert_eq!(opinion.direction, Direction::Neutral);
        assert_eq!(opinion.confidence, Some(62));
    }

    #[test]
    fn detects_on_its_own_without_snapshot() {
        let opinion = CandlestickStrategy::default().generate(&series(), None).unwrap();
        assert_eq!(opinion.direction, Direction::Up);
    }

    #[test]
    fn no_patterns_no_opinion() {
        let features = FeatureSnapshot::default();
        assert!(CandlestickStrategy::default()
            .generate(&series(), Some(&features))
            .is_none());
    }
}
