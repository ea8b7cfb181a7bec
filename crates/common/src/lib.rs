pub mod config;
pub mod error;
pub mod market_data;
pub mod patterns;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use market_data::{FileMarketData, MarketDataSupplier};
pub use patterns::{PatternBias, PatternCategory, PatternTag};
pub use types::*;
