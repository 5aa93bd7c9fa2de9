#![cfg(feature = "internals")]
//! Property-based fuzzing of the summed-area tables.
//!
//! Requires the `internals` feature:
//! `cargo test --features internals --test sat_fuzz`
//!
//! Every window sum read back from the tables must equal the sum
//! computed directly over the window's raw pixels.

use mssim::sat::SumTables;
use proptest::prelude::*;

/// Absolute slack for f64 prefix-sum cancellation at 8-bit ranges.
const SUM_TOLERANCE: f64 = 1e-6;

fn image_pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>, usize, usize)> {
    (1usize..24, 1usize..24).prop_flat_map(|(w, h)| {
        (
            prop::collection::vec(any::<u8>(), w * h),
            prop::collection::vec(any::<u8>(), w * h),
            Just(w),
            Just(h),
        )
    })
}

proptest! {
    /// SAT-derived window sums match a direct scan of the raw pixels.
    #[test]
    fn fuzz_window_sums_match_brute_force((a, b, width, height) in image_pair()) {
        let tables = SumTables::build(&a, &b, width, height);
        let max_ws = width.min(height);

        for ws in 1..=max_ws {
            for wy in 0..=(height - ws) {
                for wx in 0..=(width - ws) {
                    let mut sa = 0.0;
                    let mut sab = 0.0;
                    let mut saa = 0.0;
                    for dy in 0..ws {
                        for dx in 0..ws {
                            let pa = f64::from(a[(wy + dy) * width + wx + dx]);
                            let pb = f64::from(b[(wy + dy) * width + wx + dx]);
                            sa += pa;
                            saa += pa * pa;
                            sab += pa * pb;
                        }
                    }
                    let sums = tables.window(wx, wy, ws);
                    prop_assert!(
                        (sums.a - sa).abs() < SUM_TOLERANCE,
                        "sum(a) mismatch at ({},{}) ws={}: SAT={} direct={}",
                        wx, wy, ws, sums.a, sa
                    );
                    prop_assert!(
                        (sums.aa - saa).abs() < SUM_TOLERANCE,
                        "sum(a^2) mismatch at ({},{}) ws={}: SAT={} direct={}",
                        wx, wy, ws, sums.aa, saa
                    );
                    prop_assert!(
                        (sums.ab - sab).abs() < SUM_TOLERANCE,
                        "sum(a*b) mismatch at ({},{}) ws={}: SAT={} direct={}",
                        wx, wy, ws, sums.ab, sab
                    );
                }
            }
        }
    }

    /// Tables of non-negative samples are monotone along both axes.
    #[test]
    fn fuzz_tables_monotone((a, b, width, height) in image_pair()) {
        let tables = SumTables::build(&a, &b, width, height);
        let max_ws = width.min(height);

        let mut prev = 0.0;
        for ws in 1..=max_ws {
            let sums = tables.window(0, 0, ws);
            prop_assert!(
                sums.a >= prev - SUM_TOLERANCE,
                "growing window shrank sum(a): ws={} {} -> {}",
                ws, prev, sums.a
            );
            prev = sums.a;
        }
    }
}
