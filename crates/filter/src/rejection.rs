use common::{Direction, RiskLevel, Sentiment, VolatilityLevel};

/// Why the acceptance filter vetoed a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    EmptyHistory,
    NonDirectional,
    ContraryPatterns { strength: f64 },
    RiskNotAllowed(RiskLevel),
    VolatilityNotAllowed(VolatilityLevel),
    RsiExhausted { rsi: f64, direction: Direction },
    SentimentMismatch { sentiment: Sentiment, direction: Direction },
    TooCloseToLevel { level: f64, distance: f64 },
    ExtremeVariation(f64),
    LowConfidence(u8),
    LowVolatility(f64),
    LowVolume(f64),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::EmptyHistory => write!(f, "no candle history"),
            Rejection::NonDirectional => write!(f, "signal has no direction"),
            Rejection::ContraryPatterns { strength } => {
                write!(f, "contrary pattern strength {strength:.2} at reject threshold")
            }
            Rejection::RiskNotAllowed(risk) => write!(f, "risk '{risk}' not allowed"),
            Rejection::VolatilityNotAllowed(v) => write!(f, "volatility '{v}' not allowed"),
            Rejection::RsiExhausted { rsi, direction } => {
                write!(f, "RSI {rsi:.1} exhausted for '{direction}' signal")
            }
            Rejection::SentimentMismatch { sentiment, direction } => {
                write!(f, "'{direction}' signal against {sentiment} sentiment")
            }
            Rejection::TooCloseToLevel { level, distance } => {
                write!(f, "price {distance:.5} from level {level:.5}")
            }
            Rejection::ExtremeVariation(v) => write!(f, "variation {v:.2}% too high"),
            Rejection::LowConfidence(c) => write!(f, "low confidence ({c}%)"),
            Rejection::LowVolatility(range) => write!(f, "low volatility (range {range})"),
            Rejection::LowVolume(v) => write!(f, "low volume ({v})"),
        }
    }
}
