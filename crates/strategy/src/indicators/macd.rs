use common::MacdReading;

use super::moving_average::ema_series;

/// MACD (Moving Average Convergence/Divergence).
///
/// MACD line = EMA(fast) − EMA(slow), signal = EMA(MACD line, signal period),
/// histogram = MACD line − signal.
#[derive(Debug, Clone, Copy)]
pub struct MacdIndicator {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl MacdIndicator {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }

    /// Closes needed before the first full reading exists.
    pub fn min_len(&self) -> usize {
        self.slow + self.signal - 1
    }

    /// Every reading from the first bar where the signal line is defined up to
    /// the last close. `None` when the periods are inconsistent or there are
    /// fewer than [`Self::min_len`] closes.
    pub fn series(&self, closes: &[f64]) -> Option<Vec<MacdReading>> {
        if self.fast == 0 || self.signal == 0 || self.fast >= self.slow {
            return None;
        }
        if closes.len() < self.min_len() {
            return None;
        }

        let fast = ema_series(closes, self.fast)?;
        let slow = ema_series(closes, self.slow)?;
        // Align the fast EMA with the slow one: both end on the last close.
        let offset = fast.len() - slow.len();
        let line: Vec<f64> = slow
            .iter()
            .enumerate()
            .map(|(i, s)| fast[i + offset] - s)
            .collect();

        let signal = ema_series(&line, self.signal)?;
        let start = line.len() - signal.len();
        Some(
            signal
                .iter()
                .zip(&line[start..])
                .map(|(&sig, &value)| MacdReading {
                    value,
                    signal: sig,
                    histogram: value - sig,
                })
                .collect(),
        )
    }

    /// Reading on the last close.
    pub fn compute(&self, closes: &[f64]) -> Option<MacdReading> {
        self.series(closes)?.pop()
    }
}

impl Default for MacdIndicator {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending_up(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5).collect()
    }

    #[test]
    fn none_with_insufficient_data() {
        let macd = MacdIndicator::default();
        assert!(macd.compute(&[100.0; 33]).is_none());
        assert!(macd.compute(&trending_up(34)).is_some());
    }

    #[test]
    fn rejects_inverted_periods() {
        let macd = MacdIndicator::new(26, 12, 9);
        assert!(macd.compute(&trending_up(80)).is_none());
    }

    #[test]
    fn uptrend_has_positive_line() {
        let reading = MacdIndicator::new(3, 6, 3).compute(&trending_up(40)).unwrap();
        assert!(reading.value > 0.0);
        assert!((reading.histogram - (reading.value - reading.signal)).abs() < 1e-12);
    }

    #[test]
    fn histogram_turns_positive_after_reversal() {
        let macd = MacdIndicator::new(3, 6, 3);
        let mut prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64 * 0.5).collect();
        prices.extend((0..10).map(|i| 90.5 + i as f64 * 2.0));
        let series = macd.series(&prices).unwrap();
        assert!(series.iter().any(|r| r.histogram < 0.0));
        assert!(series.last().unwrap().histogram > 0.0);
    }
}
