use common::Candle;

/// Directional movement readings on the last candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dmi {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

/// Wilder's ADX with +DI/−DI. Needs `2 * period` candles.
pub fn dmi(candles: &[Candle], period: usize) -> Option<Dmi> {
    if period == 0 || candles.len() < 2 * period {
        return None;
    }

    let mut tr = Vec::with_capacity(candles.len() - 1);
    let mut plus_dm = Vec::with_capacity(candles.len() - 1);
    let mut minus_dm = Vec::with_capacity(candles.len() - 1);
    for w in candles.windows(2) {
        let (prev, cur) = (&w[0], &w[1]);
        let up = cur.high - prev.high;
        let down = prev.low - cur.low;
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        tr.push(
            (cur.high - cur.low)
                .max((cur.high - prev.close).abs())
                .max((cur.low - prev.close).abs()),
        );
    }

    let p = period as f64;
    let di = |dm: f64, tr: f64| if tr > 0.0 { 100.0 * dm / tr } else { 0.0 };
    let dx = |plus: f64, minus: f64| {
        let sum = plus + minus;
        if sum > 0.0 {
            100.0 * (plus - minus).abs() / sum
        } else {
            0.0
        }
    };

    let mut s_tr: f64 = tr[..period].iter().sum();
    let mut s_plus: f64 = plus_dm[..period].iter().sum();
    let mut s_minus: f64 = minus_dm[..period].iter().sum();
    let mut plus_di = di(s_plus, s_tr);
    let mut minus_di = di(s_minus, s_tr);
    let mut dxs = vec![dx(plus_di, minus_di)];

    for i in period..tr.len() {
        s_tr = s_tr - s_tr / p + tr[i];
        s_plus = s_plus - s_plus / p + plus_dm[i];
        s_minus = s_minus - s_minus / p + minus_dm[i];
        plus_di = di(s_plus, s_tr);
        minus_di = di(s_minus, s_tr);
        dxs.push(dx(plus_di, minus_di));
    }

    let mut adx = dxs[..period].iter().sum::<f64>() / p;
    for &d in &dxs[period..] {
        adx = (adx * (p - 1.0) + d) / p;
    }

    Some(Dmi { adx, plus_di, minus_di })
}
