use common::Candle;

/// True range of every candle after the first.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let (prev, cur) = (&w[0], &w[1]);
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs())
        })
        .collect()
}

/// Average true range: mean of the last `period` true ranges.
/// Needs `period + 1` candles.
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }
    let start = candles.len() - period - 1;
    let trs = true_ranges(&candles[start..]);
    Some(trs.iter().sum::<f64>() / period as f64)
}
