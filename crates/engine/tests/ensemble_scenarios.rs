use std::sync::Arc;

use async_trait::async_trait;

use common::{
    Candle, CandleSeries, Direction, FeatureSnapshot, PatternTag, RsiReading, Strength,
    StrategyOpinion,
};
use engine::{Ensemble, NoSignal, PredictorError, TieBreakPredictor};
use filter::{AcceptanceFilter, FilterConfig, Rejection};
use strategy::{IndicatorBank, Strategy, StrategyConfig, StrategyError, StrategyRegistry};

// ─── Fakes ───────────────────────────────────────────────────────────────────

struct Vote(Direction);

impl Strategy for Vote {
    fn name(&self) -> &str {
        "vote"
    }

    fn evaluate(
        &self,
        _series: &CandleSeries,
        _features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError> {
        Ok(Some(StrategyOpinion::new("vote", self.0).with_confidence(60)))
    }
}

struct Scripted(Option<Direction>);

#[async_trait]
impl TieBreakPredictor for Scripted {
    async fn predict(
        &self,
        _symbol: &str,
        _timeframe: &str,
        _series: &CandleSeries,
    ) -> Result<Option<Direction>, PredictorError> {
        Ok(self.0)
    }
}

struct FixedBank(FeatureSnapshot);

impl IndicatorBank for FixedBank {
    fn snapshot(&self, _series: &CandleSeries) -> FeatureSnapshot {
        self.0.clone()
    }
}

fn votes(up: usize, down: usize) -> StrategyRegistry {
    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
    for _ in 0..up {
        strategies.push(Box::new(Vote(Direction::Up)));
    }
    for _ in 0..down {
        strategies.push(Box::new(Vote(Direction::Down)));
    }
    StrategyRegistry::from_strategies(strategies)
}

/// Gently rising series whose last candle has a solid body and volume.
fn healthy_series() -> CandleSeries {
    let candles = (0..30)
        .map(|i| {
            let open = 1.1 + i as f64 * 0.0002;
            Candle::new(i * 60, open, open + 0.0012, open - 0.0002, open + 0.001, 500.0)
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn five_up_five_down_broken_by_predictor() {
    let ensemble = Ensemble::new(votes(5, 5))
        .with_bank(Box::new(FixedBank(FeatureSnapshot::default())))
        .with_predictor(Arc::new(Scripted(Some(Direction::Down))));

    let signal = ensemble.compose("EURUSD", "1min", &healthy_series()).await.unwrap();
    assert_eq!(signal.direction, Direction::Down);
    assert_eq!(signal.confidence, 50);
    assert_eq!(signal.strength, Strength::Moderate);
    assert_eq!(signal.summary, "strong sell");
}

#[tokio::test]
async fn tie_with_abstaining_predictor_yields_nothing() {
    let ensemble = Ensemble::new(votes(3, 3)).with_predictor(Arc::new(Scripted(None)));
    let got = ensemble.evaluate("EURUSD", "1min", &healthy_series()).await;
    assert_eq!(got.unwrap_err(), NoSignal::TieUnresolved);
}

#[test]
fn morning_star_drives_price_action_up() {
    let registry = StrategyRegistry::from_config(&[StrategyConfig::new("price_action")]).unwrap();
    let series = CandleSeries::new(vec![
        Candle::new(0, 1.1000, 1.1005, 1.0940, 1.0950, 100.0),
        Candle::new(60, 1.0948, 1.0952, 1.0940, 1.0946, 80.0),
        Candle::new(120, 1.0950, 1.1012, 1.0949, 1.1010, 150.0),
    ])
    .unwrap();

    let opinions = registry.opinions(&series, None);
    assert_eq!(opinions.len(), 1);
    assert_eq!(opinions[0].direction, Direction::Up);
    assert!(opinions[0].confidence.unwrap() >= 70);
}

#[tokio::test]
async fn overbought_rsi_rejects_an_up_majority() {
    let features = FeatureSnapshot {
        rsi: Some(RsiReading::new(85.0)),
        ..FeatureSnapshot::default()
    };
    let ensemble = Ensemble::new(votes(4, 1)).with_bank(Box::new(FixedBank(features)));

    let got = ensemble.evaluate("EURUSD", "1min", &healthy_series()).await;
    assert!(matches!(
        got,
        Err(NoSignal::Rejected(Rejection::RsiExhausted { direction: Direction::Up, .. }))
    ));
}

#[tokio::test]
async fn contrary_patterns_at_threshold_are_rejected() {
    let features = FeatureSnapshot {
        patterns: vec![PatternTag::HangingMan, PatternTag::Doji],
        ..FeatureSnapshot::default()
    };
    let filter = AcceptanceFilter::new(FilterConfig {
        doji_penalty: 0.19,
        ..FilterConfig::default()
    });
    let ensemble = Ensemble::new(votes(3, 0))
        .with_bank(Box::new(FixedBank(features)))
        .with_filter(filter);

    let got = ensemble.evaluate("EURUSD", "1min", &healthy_series()).await;
    assert!(matches!(got, Err(NoSignal::Rejected(Rejection::ContraryPatterns { .. }))));
}

#[tokio::test]
async fn clean_majority_is_accepted_and_stable() {
    let ensemble = Ensemble::new(votes(4, 0)).with_bank(Box::new(FixedBank(FeatureSnapshot::default())));
    let series = healthy_series();

    let signal = ensemble.evaluate("EURUSD", "1min", &series).await.unwrap();
    assert_eq!(signal.direction, Direction::Up);
    assert_eq!(signal.confidence, 100);
    assert_eq!(signal.strength, Strength::Strong);

    let again = AcceptanceFilter::default().apply(signal.clone(), series.candles()).unwrap();
    assert_eq!(again, signal);
}
