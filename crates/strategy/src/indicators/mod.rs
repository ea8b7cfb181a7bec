//! Pure indicator math over price slices (oldest first). Every function
//! returns `None` when there is not enough history.

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use adx::{dmi, Dmi};
pub use atr::{atr, true_ranges};
pub use bollinger::BollingerBands;
pub use macd::MacdIndicator;
pub use moving_average::{ema_series, mean, sma, sma_series, std_dev};
pub use rsi::RsiIndicator;
