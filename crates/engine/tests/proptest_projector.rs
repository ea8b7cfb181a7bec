use proptest::prelude::*;

use common::{Candle, FeatureSnapshot};
use engine::{ExpiryPolicy, Projector, ProjectorConfig};

fn arb_candles() -> impl Strategy<Value = Vec<Candle>> {
    prop::collection::vec((0.5f64..2.0, 0.0f64..0.01, 0.0f64..0.01, 0.0f64..1_000.0), 1..40).prop_map(
        |bars| {
            bars.into_iter()
                .enumerate()
                .map(|(i, (open, up, down, volume))| {
                    let close = open + up - down;
                    let high = open.max(close) + 0.001;
                    let low = open.min(close) - 0.001;
                    Candle::new(i as i64 * 60, open, high, low, close, volume)
                })
                .collect()
        },
    )
}

proptest! {
    #[test]
    fn entry_stays_in_range_and_expiry_never_precedes_it(
        candles in arb_candles(),
        lookahead in 0usize..8,
        offset in 0usize..6,
    ) {
        let projector = Projector::new(ProjectorConfig {
            lookahead,
            expiry: ExpiryPolicy::Fixed { candles: offset },
        });
        let p = projector.project(&candles, &FeatureSnapshot::default()).unwrap();

        prop_assert!(p.entry_index < candles.len());
        if candles.len() >= 2 {
            prop_assert!(p.entry_index <= candles.len() - 2);
        }
        match p.expiry_index {
            Some(expiry) => {
                prop_assert!(expiry >= p.entry_index);
                prop_assert!(expiry < candles.len());
                prop_assert_eq!(p.expiry_price, candles[expiry].close);
            }
            None => {
                prop_assert_eq!(p.expiry_price, p.entry_price);
                prop_assert_eq!(
                    p.expiry_time - p.entry_time,
                    chrono::Duration::minutes(offset as i64)
                );
            }
        }
    }
}
