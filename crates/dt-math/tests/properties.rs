//! Property-based tests for dt-math numerical functions.
//!
//! Uses proptest to verify regression and descriptive-statistics
//! properties hold across many random inputs.

use proptest::prelude::*;
use dt_math::{mean, population_variance, round2, RegressionAccumulator};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-6;

/// Helper to check approximate equality with relative scaling.
fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A noise-free line is recovered exactly for any window size >= 2.
    #[test]
    fn regression_recovers_linear_series(
        slope in -100.0..100.0f64,
        intercept in -1000.0..1000.0f64,
        n in 2usize..200,
    ) {
        let mut acc = RegressionAccumulator::new();
        for i in 0..n {
            let x = i as f64;
            acc.add(x, slope * x + intercept);
        }
        prop_assert!(approx_eq(acc.slope(), slope, TOL),
            "slope {} != {}", acc.slope(), slope);
        prop_assert!(approx_eq(acc.intercept(), intercept, TOL),
            "intercept {} != {}", acc.intercept(), intercept);
    }

    /// Incremental accumulation matches a from-scratch refeed of the
    /// same pairs (clear + refeed is how the windowed estimator works).
    #[test]
    fn regression_refeed_matches_incremental(
        pairs in prop::collection::vec((-1e4..1e4f64, -1e4..1e4f64), 2..50),
    ) {
        let mut incremental = RegressionAccumulator::new();
        for (x, y) in &pairs {
            incremental.add(*x, *y);
        }
        let mut refed = RegressionAccumulator::new();
        refed.clear();
        for (x, y) in &pairs {
            refed.add(*x, *y);
        }
        prop_assert!(approx_eq(incremental.slope(), refed.slope(), TOL));
        prop_assert!(approx_eq(incremental.intercept(), refed.intercept(), TOL));
    }

    /// Slope is invariant under a constant shift of all x-values, which
    /// is what origin-epoch anchoring relies on.
    #[test]
    fn regression_slope_shift_invariant(
        pairs in prop::collection::vec((0.0..1e5f64, -1e3..1e3f64), 3..50),
        shift in 0.0..1e9f64,
    ) {
        let mut plain = RegressionAccumulator::new();
        let mut shifted = RegressionAccumulator::new();
        for (x, y) in &pairs {
            plain.add(*x, *y);
            shifted.add(*x + shift, *y);
        }
        let a = plain.slope();
        let b = shifted.slope();
        if a.is_finite() && b.is_finite() {
            prop_assert!(approx_eq(a, b, 1e-3), "slope {} != shifted {}", a, b);
        }
    }

    /// Population variance is non-negative and zero for constant input.
    #[test]
    fn variance_non_negative(values in prop::collection::vec(-1e6..1e6f64, 1..100)) {
        let v = population_variance(&values);
        prop_assert!(v >= 0.0, "variance {} < 0", v);
    }

    #[test]
    fn variance_of_constant_is_zero(c in -1e6..1e6f64, n in 1usize..50) {
        let values = vec![c; n];
        prop_assert!(population_variance(&values).abs() < 1e-6);
    }

    /// Mean is permutation-invariant.
    #[test]
    fn mean_permutation_invariant(mut values in prop::collection::vec(-1e6..1e6f64, 1..50)) {
        let forward = mean(&values);
        values.reverse();
        let backward = mean(&values);
        prop_assert!(approx_eq(forward, backward, TOL));
    }

    /// round2 is idempotent and never moves a value by more than 0.005.
    #[test]
    fn round2_idempotent_and_close(v in -1e6..1e6f64) {
        let r = round2(v);
        prop_assert!(approx_eq(round2(r), r, 1e-12));
        prop_assert!((r - v).abs() <= 0.005 + 1e-9);
    }
}
