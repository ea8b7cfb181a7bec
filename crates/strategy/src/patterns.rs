//! Candlestick pattern detection over a trailing window.
//!
//! Single-candle formations look at the last candle only; multi-candle ones
//! need at least that many candles in the window and are skipped otherwise.
//! Every matching tag is reported, in a fixed order, so the same window always
//! yields the same result.

use common::{Candle, PatternTag};

/// Longest formation this detector knows about.
pub const PATTERN_WINDOW: usize = 5;

const DOJI_BODY_RATIO: f64 = 0.1;
const TWEEZER_TOLERANCE: f64 = 0.001;
const NECKLINE_TOLERANCE: f64 = 0.001;

/// Detect every pattern that completes on the last candle of `candles`.
/// Only the trailing [`PATTERN_WINDOW`] candles are inspected.
pub fn detect(candles: &[Candle]) -> Vec<PatternTag> {
    let start = candles.len().saturating_sub(PATTERN_WINDOW);
    let window = &candles[start..];
    let mut tags = Vec::new();

    let Some(last) = window.last() else {
        return tags;
    };

    // Single candle
    let mut single = |hit: bool, tag: PatternTag| {
        if hit {
            tags.push(tag);
        }
    };
    single(is_doji(last), PatternTag::Doji);
    single(is_dragonfly_doji(last), PatternTag::DragonflyDoji);
    single(is_gravestone_doji(last), PatternTag::GravestoneDoji);
    single(is_long_legged_doji(last), PatternTag::LongLeggedDoji);
    single(is_spinning_top(last), PatternTag::SpinningTop);

    let rising_into_last = prior_move(window) > 0.0;
    if is_hammer_shape(last) {
        tags.push(if rising_into_last { PatternTag::HangingMan } else { PatternTag::Hammer });
    }
    if is_inverted_hammer_shape(last) {
        tags.push(if rising_into_last {
            PatternTag::ShootingStar
        } else {
            PatternTag::InvertedHammer
        });
    }

    let mut single = |hit: bool, tag: PatternTag| {
        if hit {
            tags.push(tag);
        }
    };
    single(is_marubozu(last), PatternTag::Marubozu);
    single(is_belt_hold_bullish(last), PatternTag::BeltHoldBullish);
    single(is_belt_hold_bearish(last), PatternTag::BeltHoldBearish);

    // Two candles
    if let [.., prev, last] = window {
        let checks: [(fn(&Candle, &Candle) -> bool, PatternTag); 17] = [
            (is_bullish_engulfing, PatternTag::BullishEngulfing),
            (is_bearish_engulfing, PatternTag::BearishEngulfing),
            (is_piercing_line, PatternTag::PiercingLine),
            (is_dark_cloud_cover, PatternTag::DarkCloudCover),
            (is_tweezer_bottom, PatternTag::TweezerBottom),
            (is_tweezer_top, PatternTag::TweezerTop),
            (is_bullish_harami, PatternTag::BullishHarami),
            (is_bearish_harami, PatternTag::BearishHarami),
            (is_harami_cross, PatternTag::HaramiCross),
            (is_kicker_bullish, PatternTag::KickerBullish),
            (is_kicker_bearish, PatternTag::KickerBearish),
            (is_gap_up, PatternTag::GapUp),
            (is_gap_down, PatternTag::GapDown),
            (is_on_neckline, PatternTag::OnNeckline),
            (is_separating_lines, PatternTag::SeparatingLines),
            (is_counterattack_bullish, PatternTag::CounterattackBullish),
            (is_counterattack_bearish, PatternTag::CounterattackBearish),
        ];
        tags.extend(checks.iter().filter(|(f, _)| f(prev, last)).map(|(_, t)| *t));
    }

    // Three candles
    if let [.., a, b, c] = window {
        let checks: [(fn(&Candle, &Candle, &Candle) -> bool, PatternTag); 13] = [
            (is_morning_star, PatternTag::MorningStar),
            (is_evening_star, PatternTag::EveningStar),
            (is_three_white_soldiers, PatternTag::ThreeWhiteSoldiers),
            (is_three_black_crows, PatternTag::ThreeBlackCrows),
            (is_three_inside_up, PatternTag::ThreeInsideUp),
            (is_three_inside_down, PatternTag::ThreeInsideDown),
            (is_three_outside_up, PatternTag::ThreeOutsideUp),
            (is_three_outside_down, PatternTag::ThreeOutsideDown),
            (is_abandoned_baby_bullish, PatternTag::AbandonedBabyBullish),
            (is_abandoned_baby_bearish, PatternTag::AbandonedBabyBearish),
            (is_upside_tasuki_gap, PatternTag::UpsideTasukiGap),
            (is_downside_tasuki_gap, PatternTag::DownsideTasukiGap),
            (is_unique_three_river_bottom, PatternTag::UniqueThreeRiverBottom),
        ];
        tags.extend(checks.iter().filter(|(f, _)| f(a, b, c)).map(|(_, t)| *t));
    }

    // Five candles
    if let [a, b, c, d, e] = window {
        let five = [a, b, c, d, e];
        let checks: [(fn(&[&Candle; 5]) -> bool, PatternTag); 4] = [
            (is_rising_three_methods, PatternTag::RisingThreeMethods),
            (is_falling_three_methods, PatternTag::FallingThreeMethods),
            (is_breakaway_bullish, PatternTag::BreakawayBullish),
            (is_breakaway_bearish, PatternTag::BreakawayBearish),
        ];
        tags.extend(checks.iter().filter(|(f, _)| f(&five)).map(|(_, t)| *t));
    }

    tags
}

/// Net move of the candles before the last one (first open to last close).
/// Zero when the window holds a single candle.
fn prior_move(window: &[Candle]) -> f64 {
    match window {
        [first, .., before_last, _] => before_last.close - first.open,
        [only, _] => only.close - only.open,
        _ => 0.0,
    }
}

fn body_ratio(c: &Candle) -> f64 {
    c.body() / c.range()
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ─── Single candle ───────────────────────────────────────────────────────────

fn is_doji(c: &Candle) -> bool {
    body_ratio(c) < DOJI_BODY_RATIO
}

fn is_dragonfly_doji(c: &Candle) -> bool {
    is_doji(c) && c.lower_wick() > 2.0 * c.body() && c.upper_wick() < c.body()
}

fn is_gravestone_doji(c: &Candle) -> bool {
    is_doji(c) && c.upper_wick() > 2.0 * c.body() && c.lower_wick() < c.body()
}

fn is_long_legged_doji(c: &Candle) -> bool {
    is_doji(c) && c.upper_wick() > 0.0 && c.lower_wick() > 0.0
}

fn is_spinning_top(c: &Candle) -> bool {
    let ratio = body_ratio(c);
    ratio > 0.2 && ratio < 0.5 && c.upper_wick() > 0.0 && c.lower_wick() > 0.0
}

fn is_hammer_shape(c: &Candle) -> bool {
    body_ratio(c) < 0.3 && c.lower_wick() > 2.0 * c.body() && c.upper_wick() < c.body()
}

fn is_inverted_hammer_shape(c: &Candle) -> bool {
    body_ratio(c) < 0.3 && c.upper_wick() > 2.0 * c.body() && c.lower_wick() < c.body()
}

fn is_marubozu(c: &Candle) -> bool {
    c.body() > 0.0 && c.upper_wick() / c.range() < 0.02 && c.lower_wick() / c.range() < 0.02
}

fn is_belt_hold_bullish(c: &Candle) -> bool {
    let body = c.close - c.open;
    body > 0.0 && c.open - c.low <= body * 0.1 && c.high - c.close <= body * 0.1
}

fn is_belt_hold_bearish(c: &Candle) -> bool {
    let body = c.open - c.close;
    body > 0.0 && c.high - c.open <= body * 0.1 && c.close - c.low <= body * 0.1
}

// ─── Two candles (prev, last) ────────────────────────────────────────────────

fn is_bullish_engulfing(prev: &Candle, last: &Candle) -> bool {
    last.is_bullish() && prev.is_bearish() && last.open < prev.close && last.close > prev.open
}

fn is_bearish_engulfing(prev: &Candle, last: &Candle) -> bool {
    last.is_bearish() && prev.is_bullish() && last.open > prev.close && last.close < prev.open
}

fn is_bullish_harami(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish() && last.is_bullish() && last.open > prev.close && last.close < prev.open
}

fn is_bearish_harami(prev: &Candle, last: &Candle) -> bool {
    prev.is_bullish() && last.is_bearish() && last.open < prev.close && last.close > prev.open
}

fn is_harami_cross(prev: &Candle, last: &Candle) -> bool {
    is_doji(last) && (is_bullish_harami(prev, last) || is_bearish_harami(prev, last))
}

fn is_piercing_line(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish()
        && last.open < prev.close
        && last.close > prev.body_mid()
        && last.close < prev.open
}

fn is_dark_cloud_cover(prev: &Candle, last: &Candle) -> bool {
    prev.is_bullish()
        && last.open > prev.close
        && last.close < prev.body_mid()
        && last.close > prev.open
}

fn is_tweezer_bottom(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish()
        && last.is_bullish()
        && (prev.low - last.low).abs() / (prev.low.abs() + 1e-8) < TWEEZER_TOLERANCE
}

fn is_tweezer_top(prev: &Candle, last: &Candle) -> bool {
    prev.is_bullish()
        && last.is_bearish()
        && (prev.high - last.high).abs() / (prev.high.abs() + 1e-8) < TWEEZER_TOLERANCE
}

fn is_kicker_bullish(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish() && last.open > prev.close && last.is_bullish()
}

fn is_kicker_bearish(prev: &Candle, last: &Candle) -> bool {
    prev.is_bullish() && last.open < prev.close && last.is_bearish()
}

fn is_gap_up(prev: &Candle, last: &Candle) -> bool {
    last.low > prev.high
}

fn is_gap_down(prev: &Candle, last: &Candle) -> bool {
    last.high < prev.low
}

fn is_on_neckline(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish()
        && prev.low > 0.0
        && last.open < prev.close
        && (last.close - prev.low).abs() / prev.low < NECKLINE_TOLERANCE
}

fn is_separating_lines(prev: &Candle, last: &Candle) -> bool {
    approx_eq(last.open, prev.open)
        && ((prev.is_bearish() && last.is_bullish()) || (prev.is_bullish() && last.is_bearish()))
}

fn is_counterattack_bullish(prev: &Candle, last: &Candle) -> bool {
    prev.is_bearish()
        && last.open < prev.close
        && (last.close - prev.open).abs() < (prev.open - prev.close) * 0.1
}

fn is_counterattack_bearish(prev: &Candle, last: &Candle) -> bool {
    prev.is_bullish()
        && last.open > prev.close
        && (last.close - prev.open).abs() < (prev.close - prev.open) * 0.1
}

// ─── Three candles (a, b, c oldest first) ────────────────────────────────────

fn is_morning_star(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bearish() && b.body() < a.body() * 0.5 && c.is_bullish() && c.close > a.body_mid()
}

fn is_evening_star(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bullish() && b.body() < a.body() * 0.5 && c.is_bearish() && c.close < a.body_mid()
}

fn is_three_white_soldiers(a: &Candle, b: &Candle, c: &Candle) -> bool {
    let opens_in_body = |prev: &Candle, cur: &Candle| cur.open >= prev.open && cur.open <= prev.close;
    [a, b, c].iter().all(|x| x.is_bullish())
        && b.close > a.close
        && c.close > b.close
        && opens_in_body(a, b)
        && opens_in_body(b, c)
}

fn is_three_black_crows(a: &Candle, b: &Candle, c: &Candle) -> bool {
    let opens_in_body = |prev: &Candle, cur: &Candle| cur.open <= prev.open && cur.open >= prev.close;
    [a, b, c].iter().all(|x| x.is_bearish())
        && b.close < a.close
        && c.close < b.close
        && opens_in_body(a, b)
        && opens_in_body(b, c)
}

fn is_three_inside_up(a: &Candle, b: &Candle, c: &Candle) -> bool {
    is_bullish_harami(a, b) && c.close > a.open
}

fn is_three_inside_down(a: &Candle, b: &Candle, c: &Candle) -> bool {
    is_bearish_harami(a, b) && c.close < a.open
}

fn is_three_outside_up(a: &Candle, b: &Candle, c: &Candle) -> bool {
    is_bullish_engulfing(a, b) && c.close > b.close
}

fn is_three_outside_down(a: &Candle, b: &Candle, c: &Candle) -> bool {
    is_bearish_engulfing(a, b) && c.close < b.close
}

fn is_abandoned_baby_bullish(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bearish() && is_doji(b) && b.high < a.low && c.is_bullish() && c.low > b.high
}

fn is_abandoned_baby_bearish(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bullish() && is_doji(b) && b.low > a.high && c.is_bearish() && c.high < b.low
}

fn is_upside_tasuki_gap(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bullish()
        && b.is_bullish()
        && is_gap_up(a, b)
        && c.is_bearish()
        && c.open > b.open
        && c.open < b.close
        && c.close < b.open
        && c.close > a.high
}

fn is_downside_tasuki_gap(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bearish()
        && b.is_bearish()
        && is_gap_down(a, b)
        && c.is_bullish()
        && c.open < b.open
        && c.open > b.close
        && c.close > b.open
        && c.close < a.low
}

fn is_unique_three_river_bottom(a: &Candle, b: &Candle, c: &Candle) -> bool {
    a.is_bearish()
        && is_hammer_shape(b)
        && b.close < a.close
        && c.is_bullish()
        && c.close < b.close.max(b.open)
        && c.low > b.low
}

// ─── Five candles ────────────────────────────────────────────────────────────

fn is_rising_three_methods([a, b, c, d, e]: &[&Candle; 5]) -> bool {
    a.is_bullish()
        && [b, c, d].iter().all(|x| x.is_bearish())
        && e.is_bullish()
        && e.close > a.close
}

fn is_falling_three_methods([a, b, c, d, e]: &[&Candle; 5]) -> bool {
    a.is_bearish()
        && [b, c, d].iter().all(|x| x.is_bullish())
        && e.is_bearish()
        && e.close < a.close
}

fn is_breakaway_bullish([a, b, c, d, e]: &[&Candle; 5]) -> bool {
    [a, b, c].iter().all(|x| x.is_bearish())
        && d.is_bullish()
        && e.is_bullish()
        && e.close > a.open
}

fn is_breakaway_bearish([a, b, c, d, e]: &[&Candle; 5]) -> bool {
    [a, b, c].iter().all(|x| x.is_bullish())
        && d.is_bearish()
        && e.is_bearish()
        && e.close < a.open
}
