//! Candlestick pattern tags and the static tables shared by strategies and the
//! acceptance filter: a strength weight per tag and a category classification.

use serde::{Deserialize, Serialize};

/// Weight used for any tag missing from the strength table.
pub const DEFAULT_PATTERN_STRENGTH: f64 = 0.2;

/// Named candlestick formation detected on a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTag {
    // Single candle
    Doji,
    DragonflyDoji,
    GravestoneDoji,
    LongLeggedDoji,
    SpinningTop,
    Hammer,
    HangingMan,
    InvertedHammer,
    ShootingStar,
    Marubozu,
    BeltHoldBullish,
    BeltHoldBearish,
    // Two candles
    BullishEngulfing,
    BearishEngulfing,
    PiercingLine,
    DarkCloudCover,
    TweezerBottom,
    TweezerTop,
    BullishHarami,
    BearishHarami,
    HaramiCross,
    KickerBullish,
    KickerBearish,
    GapUp,
    GapDown,
    OnNeckline,
    SeparatingLines,
    CounterattackBullish,
    CounterattackBearish,
    // Three candles
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    ThreeInsideUp,
    ThreeInsideDown,
    ThreeOutsideUp,
    ThreeOutsideDown,
    AbandonedBabyBullish,
    AbandonedBabyBearish,
    UpsideTasukiGap,
    DownsideTasukiGap,
    UniqueThreeRiverBottom,
    // Five candles
    RisingThreeMethods,
    FallingThreeMethods,
    BreakawayBullish,
    BreakawayBearish,
}

/// Directional classification of a tag, used to pick patterns that corroborate
/// a strategy's opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    ReversalUp,
    ReversalDown,
    TrendUp,
    TrendDown,
    Neutral,
    Hybrid,
}

/// Net directional bias of a tag, derived from its categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

impl PatternTag {
    pub fn as_str(&self) -> &'static str {
        use PatternTag::*;
        match self {
            Doji => "doji",
            DragonflyDoji => "dragonfly_doji",
            GravestoneDoji => "gravestone_doji",
            LongLeggedDoji => "long_legged_doji",
            SpinningTop => "spinning_top",
            Hammer => "hammer",
            HangingMan => "hanging_man",
            InvertedHammer => "inverted_hammer",
            ShootingStar => "shooting_star",
            Marubozu => "marubozu",
            BeltHoldBullish => "belt_hold_bullish",
            BeltHoldBearish => "belt_hold_bearish",
            BullishEngulfing => "bullish_engulfing",
            BearishEngulfing => "bearish_engulfing",
            PiercingLine => "piercing_line",
            DarkCloudCover => "dark_cloud_cover",
            TweezerBottom => "tweezer_bottom",
            TweezerTop => "tweezer_top",
            BullishHarami => "bullish_harami",
            BearishHarami => "bearish_harami",
            HaramiCross => "harami_cross",
            KickerBullish => "kicker_bullish",
            KickerBearish => "kicker_bearish",
            GapUp => "gap_up",
            GapDown => "gap_down",
            OnNeckline => "on_neckline",
            SeparatingLines => "separating_lines",
            CounterattackBullish => "counterattack_bullish",
            CounterattackBearish => "counterattack_bearish",
            MorningStar => "morning_star",
            EveningStar => "evening_star",
            ThreeWhiteSoldiers => "three_white_soldiers",
            ThreeBlackCrows => "three_black_crows",
            ThreeInsideUp => "three_inside_up",
            ThreeInsideDown => "three_inside_down",
            ThreeOutsideUp => "three_outside_up",
            ThreeOutsideDown => "three_outside_down",
            AbandonedBabyBullish => "abandoned_baby_bullish",
            AbandonedBabyBearish => "abandoned_baby_bearish",
            UpsideTasukiGap => "upside_tasuki_gap",
            DownsideTasukiGap => "downside_tasuki_gap",
            UniqueThreeRiverBottom => "unique_three_river_bottom",
            RisingThreeMethods => "rising_three_methods",
            FallingThreeMethods => "falling_three_methods",
            BreakawayBullish => "breakaway_bullish",
            BreakawayBearish => "breakaway_bearish",
        }
    }

    /// Fixed strength weight in `[0, 1]`.
    pub fn strength(&self) -> f64 {
        use PatternTag::*;
        match self {
            BullishEngulfing | BearishEngulfing => 1.0,
            Hammer | HangingMan | InvertedHammer | ShootingStar => 0.8,
            MorningStar | EveningStar => 1.0,
            PiercingLine | DarkCloudCover => 0.7,
            ThreeWhiteSoldiers | ThreeBlackCrows => 1.0,
            AbandonedBabyBullish | AbandonedBabyBearish => 1.0,
            KickerBullish | KickerBearish => 0.8,

            RisingThreeMethods | FallingThreeMethods => 0.9,
            UpsideTasukiGap | DownsideTasukiGap => 0.6,
            SeparatingLines => 0.5,

            Doji | DragonflyDoji | GravestoneDoji | LongLeggedDoji | SpinningTop => 0.3,
            Marubozu => 0.7,

            BullishHarami | BearishHarami => 0.7,
            HaramiCross => 0.6,
            TweezerBottom | TweezerTop => 0.5,
            ThreeInsideUp | ThreeInsideDown | ThreeOutsideUp | ThreeOutsideDown => 0.7,

            GapUp | GapDown | OnNeckline => 0.4,

            BeltHoldBullish | BeltHoldBearish => 0.7,
            CounterattackBullish | CounterattackBearish => 0.6,
            UniqueThreeRiverBottom => 0.8,
            BreakawayBullish | BreakawayBearish => 0.7,
        }
    }

    /// Categories this tag belongs to. A tag may sit in more than one
    /// (three white soldiers is both a reversal and a trend formation).
    pub fn categories(&self) -> &'static [PatternCategory] {
        use PatternCategory as C;
        use PatternTag::*;
        match self {
            Hammer | BullishEngulfing | PiercingLine | MorningStar | TweezerBottom
            | BullishHarami | KickerBullish | ThreeInsideUp | ThreeOutsideUp | GapUp
            | InvertedHammer | BeltHoldBullish | BreakawayBullish | CounterattackBullish
            | UniqueThreeRiverBottom | AbandonedBabyBullish => &[C::ReversalUp],
            DragonflyDoji => &[C::ReversalUp, C::Neutral],
            ThreeWhiteSoldiers => &[C::ReversalUp, C::TrendUp],

            HangingMan | BearishEngulfing | DarkCloudCover | EveningStar | TweezerTop
            | BearishHarami | KickerBearish | ThreeInsideDown | ThreeOutsideDown | GapDown
            | ShootingStar | BeltHoldBearish | BreakawayBearish | CounterattackBearish
            | AbandonedBabyBearish => &[C::ReversalDown],
            GravestoneDoji => &[C::ReversalDown, C::Neutral],
            ThreeBlackCrows => &[C::ReversalDown, C::TrendDown],

            RisingThreeMethods | UpsideTasukiGap => &[C::TrendUp],
            FallingThreeMethods | DownsideTasukiGap | OnNeckline => &[C::TrendDown],
            SeparatingLines => &[C::TrendUp, C::TrendDown],

            Doji | LongLeggedDoji | SpinningTop | Marubozu => &[C::Neutral],
            HaramiCross => &[C::Hybrid],
        }
    }

    pub fn in_category(&self, category: PatternCategory) -> bool {
        self.categories().contains(&category)
    }

    /// Bullish if the tag only points up, bearish if it only points down,
    /// neutral otherwise (including tags classified both ways).
    pub fn bias(&self) -> PatternBias {
        use PatternCategory as C;
        let cats = self.categories();
        let up = cats.iter().any(|c| matches!(c, C::ReversalUp | C::TrendUp));
        let down = cats.iter().any(|c| matches!(c, C::ReversalDown | C::TrendDown));
        match (up, down) {
            (true, false) => PatternBias::Bullish,
            (false, true) => PatternBias::Bearish,
            _ => PatternBias::Neutral,
        }
    }
}

impl std::fmt::Display for PatternTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sum of the strength weights of `patterns`.
pub fn total_strength(patterns: &[PatternTag]) -> f64 {
    patterns.iter().map(PatternTag::strength).sum()
}

/// Sum of the strength weights of the tags in `patterns` that fall into any
/// of `categories`.
pub fn strength_in(patterns: &[PatternTag], categories: &[PatternCategory]) -> f64 {
    patterns
        .iter()
        .filter(|p| categories.iter().any(|c| p.in_category(*c)))
        .map(PatternTag::strength)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strengths_are_within_unit_interval() {
        let tags = [
            PatternTag::Doji,
            PatternTag::BullishEngulfing,
            PatternTag::MorningStar,
            PatternTag::GapDown,
            PatternTag::RisingThreeMethods,
            PatternTag::HaramiCross,
        ];
        for tag in tags {
            let s = tag.strength();
            assert!((0.0..=1.0).contains(&s), "{tag} strength {s} out of range");
        }
    }

    #[test]
    fn bias_follows_categories() {
        assert_eq!(PatternTag::MorningStar.bias(), PatternBias::Bullish);
        assert_eq!(PatternTag::ThreeBlackCrows.bias(), PatternBias::Bearish);
        assert_eq!(PatternTag::SeparatingLines.bias(), PatternBias::Neutral);
        assert_eq!(PatternTag::Doji.bias(), PatternBias::Neutral);
        assert_eq!(PatternTag::GravestoneDoji.bias(), PatternBias::Bearish);
    }

    #[test]
    fn strength_in_only_counts_matching_categories() {
        let patterns = [PatternTag::Hammer, PatternTag::EveningStar, PatternTag::Doji];
        let up = strength_in(&patterns, &[PatternCategory::ReversalUp]);
        assert!((up - 0.8).abs() < 1e-12);
        let total = total_strength(&patterns);
        assert!((total - 2.1).abs() < 1e-12);
    }

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&PatternTag::ThreeWhiteSoldiers).unwrap();
        assert_eq!(json, "\"three_white_soldiers\"");
        assert_eq!(PatternTag::ThreeWhiteSoldiers.to_string(), "three_white_soldiers");
    }
}
