use thiserror::Error;

/// Why a strategy could not form an opinion. Never surfaces past the
/// registry; [`crate::Strategy::generate`] turns it into "no opinion".
#[derive(Debug, Error, PartialEq)]
pub enum StrategyError {
    #[error("insufficient history: need {needed} candles, got {got}")]
    InsufficientHistory { needed: usize, got: usize },

    #[error("degenerate input: {0}")]
    Degenerate(&'static str),
}

/// Fail with [`StrategyError::InsufficientHistory`] unless `got >= needed`.
pub fn require_history(got: usize, needed: usize) -> Result<(), StrategyError> {
    if got < needed {
        return Err(StrategyError::InsufficientHistory { needed, got });
    }
    Ok(())
}
