pub mod bank;
pub mod boost;
pub mod config;
pub mod error;
pub mod indicators;
pub mod patterns;
pub mod registry;
pub mod strategies;

pub use bank::{IndicatorBank, StandardIndicatorBank};
pub use config::StrategyConfig;
pub use error::StrategyError;
pub use registry::StrategyRegistry;

use common::{CandleSeries, FeatureSnapshot, StrategyOpinion};
use tracing::debug;

/// A pluggable signal generator.
///
/// Implementations are pure over their inputs: the same series and features
/// always produce the same opinion.
pub trait Strategy: Send + Sync {
    /// Name of this strategy instance, shown in logs and on opinions.
    fn name(&self) -> &str;

    /// Form an opinion on the last candle of `series`.
    ///
    /// `Ok(None)` means the strategy has nothing to say; `Err` means it could
    /// not evaluate at all (too little history, degenerate prices).
    fn evaluate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Result<Option<StrategyOpinion>, StrategyError>;

    /// Like [`Strategy::evaluate`] but never fails: errors become "no opinion".
    fn generate(
        &self,
        series: &CandleSeries,
        features: Option<&FeatureSnapshot>,
    ) -> Option<StrategyOpinion> {
        match self.evaluate(series, features) {
            Ok(opinion) => opinion,
            Err(e) => {
                debug!(strategy = %self.name(), error = %e, "No opinion");
                None
            }
        }
    }
}
