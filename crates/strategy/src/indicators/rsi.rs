/// RSI (Relative Strength Index) with Wilder smoothing.
///
/// Needs at least `period + 1` closes.
#[derive(Debug, Clone, Copy)]
pub struct RsiIndicator {
    pub period: usize,
}

impl RsiIndicator {
    pub fn new(period: usize) -> Self {
        Self { period: period.max(2) }
    }

    /// RSI of the last close, in `[0, 100]`.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        let period = self.period;
        if closes.len() < period + 1 {
            return None;
        }

        let mut changes = closes.windows(2).map(|w| w[1] - w[0]);
        let (mut avg_gain, mut avg_loss) = changes
            .by_ref()
            .take(period)
            .fold((0.0, 0.0), |(g, l), c| (g + c.max(0.0), l + (-c).max(0.0)));
        avg_gain /= period as f64;
        avg_loss /= period as f64;

        let p = period as f64;
        for change in changes {
            avg_gain = (avg_gain * (p - 1.0) + change.max(0.0)) / p;
            avg_loss = (avg_loss * (p - 1.0) + (-change).max(0.0)) / p;
        }

        if avg_loss == 0.0 {
            // Flat series reads as neutral rather than maximally overbought.
            return Some(if avg_gain == 0.0 { 50.0 } else { 100.0 });
        }
        let rs = avg_gain / avg_loss;
        Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
    }
}

impl Default for RsiIndicator {
    fn default() -> Self {
        Self::new(14)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_when_insufficient_data() {
        let rsi = RsiIndicator::new(14);
        assert!(rsi.compute(&[100.0; 14]).is_none());
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        assert!(rsi.compute(&prices).is_some());
    }

    #[test]
    fn all_gains_is_100_and_all_losses_is_0() {
        let rsi = RsiIndicator::new(3);
        let up = rsi.compute(&[10.0, 11.0, 12.0, 13.0, 14.0]).unwrap();
        assert!((up - 100.0).abs() < 1e-6);
        let down = rsi.compute(&[14.0, 13.0, 12.0, 11.0, 10.0]).unwrap();
        assert!(down.abs() < 1e-6);
    }

    #[test]
    fn flat_series_is_neutral() {
        let rsi = RsiIndicator::new(5);
        assert_eq!(rsi.compute(&[1.1; 10]), Some(50.0));
    }

    #[test]
    fn mixed_series_stays_in_range() {
        let rsi = RsiIndicator::new(14);
        let prices = [
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.15, 43.61, 44.33, 44.83, 45.10,
            45.15, 44.34, 44.09,
        ];
        let v = rsi.compute(&prices).unwrap();
        assert!((0.0..=100.0).contains(&v), "RSI out of range: {v}");
    }
}
