/// Arithmetic mean, `None` for an empty slice.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let var = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    Some(var.sqrt())
}

/// Simple moving average of the last `period` values.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    mean(&data[data.len() - period..])
}

/// Rolling SMA. Element `i` covers `data[i..i + period]`, so the output is
/// `period - 1` shorter than the input.
pub fn sma_series(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }
    data.windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values. Element `i` corresponds to `data[period - 1 + i]`.
pub fn ema_series(data: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || data.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;
    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &price in &data[period..] {
        prev = price * k + prev * (1.0 - k);
        out.push(prev);
    }
    Some(out)
}
