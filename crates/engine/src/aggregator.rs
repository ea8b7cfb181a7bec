use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use common::{
    penalize, to_confidence, CandleSeries, CompositeSignal, Direction, MarketDataSupplier, Strength,
    VoteTally,
};
use filter::{AcceptanceFilter, Rejection};
use strategy::bank::risk_level;
use strategy::{IndicatorBank, StandardIndicatorBank, StrategyRegistry};

use crate::config::EnsembleConfig;
use crate::predictor::TieBreakPredictor;
use crate::projector::Projector;

/// Composite confidence at or above this is labelled strong.
const STRONG_AT: u8 = 70;
/// Confidence lost when the predictor disagrees with the majority.
const PREDICTOR_DISAGREEMENT_PENALTY: u8 = 20;
const CONFIDENCE_FLOOR: u8 = 10;

/// Why an evaluation produced no signal.
#[derive(Debug, Clone, PartialEq)]
pub enum NoSignal {
    NoOpinions,
    TieUnresolved,
    Rejected(Rejection),
    DataUnavailable(String),
}

impl std::fmt::Display for NoSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoSignal::NoOpinions => write!(f, "no strategy formed an opinion"),
            NoSignal::TieUnresolved => write!(f, "tied vote could not be broken"),
            NoSignal::Rejected(reason) => write!(f, "rejected: {reason}"),
            NoSignal::DataUnavailable(reason) => write!(f, "data unavailable: {reason}"),
        }
    }
}

/// The ensemble decision core: strategies vote, ties go to the predictor,
/// the projector picks entry and expiry, and the acceptance filter has the
/// last word.
pub struct Ensemble {
    registry: StrategyRegistry,
    bank: Box<dyn IndicatorBank>,
    predictor: Option<Arc<dyn TieBreakPredictor>>,
    projector: Projector,
    filter: AcceptanceFilter,
}

impl Ensemble {
    pub fn new(registry: StrategyRegistry) -> Self {
        Self {
            registry,
            bank: Box::new(StandardIndicatorBank::default()),
            predictor: None,
            projector: Projector::default(),
            filter: AcceptanceFilter::default(),
        }
    }

    pub fn from_config(config: &EnsembleConfig) -> common::Result<Self> {
        let registry = StrategyRegistry::from_config(&config.strategies)?;
        info!(strategies = registry.len(), "Ensemble ready");
        Ok(Self::new(registry)
            .with_projector(Projector::new(config.projector))
            .with_filter(AcceptanceFilter::new(config.filter.clone())))
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn TieBreakPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_bank(mut self, bank: Box<dyn IndicatorBank>) -> Self {
        self.bank = bank;
        self
    }

    pub fn with_projector(mut self, projector: Projector) -> Self {
        self.projector = projector;
        self
    }

    pub fn with_filter(mut self, filter: AcceptanceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Fetch history from `supplier` and evaluate it.
    pub async fn evaluate_symbol(
        &self,
        supplier: &dyn MarketDataSupplier,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<CompositeSignal, NoSignal> {
        let series = supplier.fetch(symbol, timeframe, limit).await.map_err(|e| {
            warn!(symbol, timeframe, error = %e, "Market data fetch failed");
            NoSignal::DataUnavailable(e.to_string())
        })?;
        self.evaluate(symbol, timeframe, &series).await
    }

    /// Full evaluation: compose the signal, then run the acceptance filter.
    pub async fn evaluate(
        &self,
        symbol: &str,
        timeframe: &str,
        series: &CandleSeries,
    ) -> Result<CompositeSignal, NoSignal> {
        let signal = self.compose(symbol, timeframe, series).await?;
        let accepted = self
            .filter
            .apply(signal, series.candles())
            .map_err(NoSignal::Rejected)?;
        info!(
            symbol,
            timeframe,
            direction = %accepted.direction,
            confidence = accepted.confidence,
            strength = %accepted.strength,
            "Signal generated"
        );
        Ok(accepted)
    }

    /// Build the composite signal without filtering it.
    pub async fn compose(
        &self,
        symbol: &str,
        timeframe: &str,
        series: &CandleSeries,
    ) -> Result<CompositeSignal, NoSignal> {
        if series.is_empty() {
            return Err(NoSignal::DataUnavailable("empty candle series".into()));
        }

        let features = self.bank.snapshot(series);
        let opinions = self.registry.opinions(series, Some(&features));
        if opinions.is_empty() {
            info!(symbol, timeframe, "No strategy returned an opinion");
            return Err(NoSignal::NoOpinions);
        }

        let votes = VoteTally::from_opinions(&opinions);
        let direction = match votes.majority() {
            Some(direction) => direction,
            None => self.break_tie(symbol, timeframe, series, votes).await?,
        };

        let winning = votes.up.max(votes.down);
        let mut confidence = match votes.directional() {
            0 => 0,
            total => to_confidence(winning as f64 / total as f64 * 100.0),
        };
        let mut strength = Strength::from_confidence(confidence, STRONG_AT);
        debug!(symbol, up = votes.up, down = votes.down, neutral = votes.neutral, confidence, "Votes tallied");

        let projection = self
            .projector
            .project(series, &features)
            .ok_or_else(|| NoSignal::DataUnavailable("empty candle series".into()))?;

        if let Some(predictor) = &self.predictor {
            match predictor.predict(symbol, timeframe, series).await {
                Ok(Some(predicted)) if predicted.is_directional() && predicted != direction => {
                    confidence = penalize(confidence, PREDICTOR_DISAGREEMENT_PENALTY, CONFIDENCE_FLOOR);
                    strength = Strength::Weak;
                    info!(symbol, majority = %direction, predicted = %predicted, confidence, "Predictor disagrees, downgrading");
                }
                Ok(_) => {}
                Err(e) => warn!(symbol, timeframe, error = %e, "Predictor check skipped"),
            }
        }

        let high = series.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = series.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let volume = series.iter().map(|c| c.volume).sum();
        let summary = match direction {
            Direction::Up => "strong buy",
            Direction::Down => "strong sell",
            Direction::Neutral => "neutral",
        };

        Ok(CompositeSignal {
            id: CompositeSignal::new_id(),
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            direction,
            strength,
            confidence,
            aggregate_confidence: confidence,
            aggregate_strength: strength,
            price: projection.entry_price,
            recommended_entry_time: projection.entry_time,
            recommended_entry_price: projection.entry_price,
            expire_entry_time: projection.expiry_time,
            expire_entry_price: projection.expiry_price,
            high,
            low,
            volume,
            variation: features.variation,
            risk: risk_level(&features),
            volatility: features.volatility,
            sentiment: features.sentiment,
            volume_status: features.volume_status,
            support: features.support,
            resistance: features.resistance,
            moving_averages: features.moving_averages,
            oscillators: features.oscillators,
            rsi: features.rsi,
            macd: features.macd,
            bollinger: features.bollinger,
            atr: features.atr,
            adx: features.adx,
            patterns: features.patterns,
            summary: summary.to_string(),
            votes,
            opinions,
            generated_at: Utc::now(),
        })
    }

    async fn break_tie(
        &self,
        symbol: &str,
        timeframe: &str,
        series: &CandleSeries,
        votes: VoteTally,
    ) -> Result<Direction, NoSignal> {
        let Some(predictor) = &self.predictor else {
            warn!(symbol, up = votes.up, down = votes.down, "Tied vote and no predictor configured");
            return Err(NoSignal::TieUnresolved);
        };
        match predictor.predict(symbol, timeframe, series).await {
            Ok(Some(direction)) if direction.is_directional() => {
                info!(symbol, up = votes.up, down = votes.down, direction = %direction, "Tie broken by predictor");
                Ok(direction)
            }
            Ok(_) => {
                info!(symbol, up = votes.up, down = votes.down, "Predictor abstained on tie");
                Err(NoSignal::TieUnresolved)
            }
            Err(e) => {
                warn!(symbol, error = %e, "Predictor failed on tie");
                Err(NoSignal::TieUnresolved)
            }
        }
    }
}
