use common::BollingerReading;

use super::moving_average::{mean, std_dev};

/// Bollinger Bands: SMA(period) ± `width` population standard deviations.
/// `position` is signed around the middle band: negative below it, positive
/// above it, ±1 at the bands.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub period: usize,
    pub width: f64,
}

impl BollingerBands {
    pub fn new(period: usize, width: f64) -> Self {
        Self { period, width }
    }

    pub fn compute(&self, closes: &[f64]) -> Option<BollingerReading> {
        if self.period == 0 || closes.len() < self.period {
            return None;
        }
        let window = &closes[closes.len() - self.period..];
        let middle = mean(window)?;
        let sd = std_dev(window)?;
        let upper = middle + self.width * sd;
        let lower = middle - self.width * sd;
        let half = (upper - lower) / 2.0;
        let last = *window.last()?;
        let position = if half > 0.0 {
            ((last - middle) / half).clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Some(BollingerReading {
            upper,
            middle,
            lower,
            width: upper - lower,
            position,
        })
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_prices_collapse_bands() {
        let reading = BollingerBands::default().compute(&[1.25; 20]).unwrap();
        assert_eq!(reading.width, 0.0);
        assert_eq!(reading.position, 0.0);
    }

    #[test]
    fn close_above_middle_has_positive_position() {
        let mut closes = vec![1.0; 19];
        closes.push(1.1);
        let reading = BollingerBands::default().compute(&closes).unwrap();
        assert!(reading.position > 0.0);
        assert!(reading.upper > reading.middle && reading.middle > reading.lower);
    }

    #[test]
    fn close_inside_lower_half_is_negative() {
        let mut closes: Vec<f64> = (0..19).map(|i| if i % 2 == 0 { 1.0 } else { 1.02 }).collect();
        closes.push(1.005);
        let reading = BollingerBands::default().compute(&closes).unwrap();
        assert!(1.005 > reading.lower && 1.005 < reading.middle);
        assert!(reading.position < 0.0 && reading.position > -1.0);
    }

    #[test]
    fn short_history_is_none() {
        assert!(BollingerBands::default().compute(&[1.0; 19]).is_none());
    }
}
