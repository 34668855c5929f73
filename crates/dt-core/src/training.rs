//! Baseline training strategies.
//!
//! Each procedure kind learns a scalar baseline from a historical,
//! already-sorted observation sequence plus the training interval:
//!
//! - day-count mean: average observations per calendar day over the full
//!   inclusive training span, zero-count days included
//! - variance: population variance of quantitative values
//! - windowed slope: per-window regression slopes blended by iterative
//!   averaging into a recency-weighted baseline
//!
//! A trained baseline supersedes the policy-declared one for every
//! subsequent calculate call.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

use dt_common::{Error, Observation, Result, ValueKind};
use dt_math::{mean, population_variance, round2, RegressionAccumulator};

use crate::bucketing::{bucketize, duration_in_days};
use crate::estimator::{OnlineTrend, Y_SCALE_DIVISOR};

/// Mean observations-per-day over the inclusive training span.
///
/// The per-day count array is sized to the full span, not just to days
/// that had data, so quiet days pull the mean down. Propagates
/// [`Error::ReversedInterval`] from the span computation; the caller
/// degrades that to "no training".
pub fn day_count_mean(
    sorted: &[Observation],
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Result<f64> {
    if sorted.is_empty() {
        return Err(Error::InsufficientData(
            "cannot train day-count mean on an empty batch".into(),
        ));
    }
    let span = duration_in_days(start, end)?;
    let buckets = bucketize(sorted);
    info!(days = span, buckets = buckets.len(), "training day-count mean");

    // Observed buckets can exceed the declared span when the host hands
    // over data outside the interval; size to whichever is larger.
    let span_slots = usize::try_from(span.max(0)).unwrap_or(0);
    if buckets.len() > span_slots {
        warn!(
            days = span,
            buckets = buckets.len(),
            "observations outside the training interval; widening the day-count window"
        );
    }
    let slots = span_slots.max(buckets.len());
    if slots == 0 {
        return Err(Error::InsufficientData("training span covers no days".into()));
    }
    let mut counts = vec![0.0; slots];
    for (i, bucket) in buckets.iter().enumerate() {
        counts[i] = bucket.count() as f64;
    }
    Ok(mean(&counts))
}

/// Population variance of the quantitative values in the batch.
///
/// Qualitative observations are silently excluded (defined policy).
pub fn quantitative_variance(batch: &[Observation]) -> Result<f64> {
    let values: Vec<f64> = batch
        .iter()
        .filter(|obs| obs.kind == ValueKind::Quantitative)
        .map(|obs| obs.value)
        .collect();
    if values.is_empty() {
        return Err(Error::InsufficientData(
            "no quantitative observations to train variance on".into(),
        ));
    }
    Ok(population_variance(&values))
}

/// Windowed-slope baseline: slide a window of exactly `freshness`
/// observations across the sorted sequence (stride 1), fit each window
/// with a fresh accumulator, and fold the finite slopes into the running
/// baseline via `trained = (trained + slope) / 2`. The first successful
/// fold assigns the slope directly, so a constant slope is a fixed point
/// of the recurrence. The blend is recency-weighted by construction and
/// kept that way; downstream comparisons assume the asymmetry.
///
/// Returns `Ok(None)` when every window slope was non-finite (the
/// baseline stays absent rather than absorbing NaN).
pub fn windowed_slope(
    trend: &mut OnlineTrend,
    sorted: &[Observation],
    freshness: usize,
) -> Result<Option<f64>> {
    if freshness == 0 || sorted.len() < freshness {
        return Err(Error::InsufficientData(format!(
            "need at least {} observations for windowed training, got {}",
            freshness.max(1),
            sorted.len()
        )));
    }
    let windows = sorted.len() - freshness + 1;
    info!(windows, freshness, "training windowed slope baseline");

    let mut trained: Option<f64> = None;
    let mut acc = RegressionAccumulator::new();
    for window in sorted.windows(freshness) {
        acc.clear();
        for obs in window {
            let x = trend.delta_secs(obs.epoch_secs());
            let y = round2(obs.value / Y_SCALE_DIVISOR);
            acc.add(x, y);
        }
        let slope = acc.slope();
        if slope.is_finite() {
            let folded = match trained {
                None => slope,
                Some(t) => (t + slope) / 2.0,
            };
            debug!(slope, trained = folded, "training fold");
            trained = Some(folded);
        } else {
            debug!(slope, "skipping non-finite window slope");
        }
    }
    Ok(trained)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::sorted as sort;
    use dt_common::RawObservation;

    fn obs(ts: &str, value: f64) -> Observation {
        Observation::parse(&RawObservation::quantitative(ts, value)).unwrap()
    }

    fn qual(ts: &str, value: f64) -> Observation {
        Observation::parse(&RawObservation::new(ts, value, ValueKind::Qualitative)).unwrap()
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn day_count_mean_counts_quiet_days_as_zero() {
        // 4 events on Apr 1, 2 on Apr 2, nothing on Apr 3/4.
        let batch = sort(&[
            obs("2013-04-01T09:00:00Z", 1.0),
            obs("2013-04-01T10:00:00Z", 1.0),
            obs("2013-04-01T11:00:00Z", 1.0),
            obs("2013-04-01T12:00:00Z", 1.0),
            obs("2013-04-02T09:00:00Z", 1.0),
            obs("2013-04-02T10:00:00Z", 1.0),
        ]);
        let baseline = day_count_mean(
            &batch,
            ts("2013-04-01T00:00:00Z"),
            ts("2013-04-04T23:00:00Z"),
        )
        .unwrap();
        assert_eq!(baseline, 6.0 / 4.0);
    }

    #[test]
    fn day_count_mean_widens_to_observed_buckets() {
        // Declared span is 1 day but the data covers 2: the window widens
        // to the observed buckets instead of indexing out of bounds.
        let batch = sort(&[
            obs("2013-04-01T09:00:00Z", 1.0),
            obs("2013-04-01T10:00:00Z", 1.0),
            obs("2013-04-02T09:00:00Z", 1.0),
        ]);
        let baseline = day_count_mean(
            &batch,
            ts("2013-04-01T00:00:00Z"),
            ts("2013-04-01T23:00:00Z"),
        )
        .unwrap();
        assert_eq!(baseline, 1.5);
    }

    #[test]
    fn day_count_mean_requires_data() {
        let err = day_count_mean(&[], ts("2013-04-01T00:00:00Z"), ts("2013-04-04T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn day_count_mean_propagates_reversed_interval() {
        let batch = vec![obs("2013-04-01T09:00:00Z", 1.0)];
        let err = day_count_mean(&batch, ts("2013-04-05T00:00:00Z"), ts("2013-04-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, Error::ReversedInterval));
    }

    #[test]
    fn variance_filters_to_quantitative() {
        let batch = vec![
            obs("2013-04-01T09:00:00Z", 1.0),
            qual("2013-04-01T10:00:00Z", 100.0),
            obs("2013-04-01T11:00:00Z", 3.0),
        ];
        // Population variance of {1, 3} is 1.
        assert_eq!(quantitative_variance(&batch).unwrap(), 1.0);
    }

    #[test]
    fn variance_with_only_qualitative_is_insufficient() {
        let batch = vec![qual("2013-04-01T09:00:00Z", 1.0)];
        assert!(matches!(
            quantitative_variance(&batch).unwrap_err(),
            Error::InsufficientData(_)
        ));
    }

    /// Constant slope is a fixed point: first fold assigns it, later
    /// folds keep it.
    #[test]
    fn windowed_slope_constant_line_is_fixed_point() {
        // y/1000 = 2x + 5 exactly at 1-second spacing.
        let batch: Vec<Observation> = (0..20)
            .map(|i| {
                obs(
                    &format!("2013-04-01T10:00:{:02}Z", i),
                    2000.0 * i as f64 + 5000.0,
                )
            })
            .collect();
        let mut trend = OnlineTrend::windowed(5);
        let trained = windowed_slope(&mut trend, &batch, 5).unwrap().unwrap();
        assert!((trained - 2.0).abs() < 1e-9);
    }

    #[test]
    fn windowed_slope_blend_is_recency_weighted() {
        // Two windows with slopes 1 then 3: blend is (1 + 3) / 2 = 2,
        // not an arithmetic mean over a longer tail.
        let batch = vec![
            obs("2013-04-01T10:00:00Z", 0.0),
            obs("2013-04-01T10:00:01Z", 1000.0),
            obs("2013-04-01T10:00:02Z", 4000.0),
        ];
        let mut trend = OnlineTrend::windowed(2);
        let trained = windowed_slope(&mut trend, &batch, 2).unwrap().unwrap();
        assert!((trained - 2.0).abs() < 1e-9);
    }

    #[test]
    fn windowed_slope_needs_a_full_window() {
        let batch = vec![obs("2013-04-01T10:00:00Z", 1.0)];
        let mut trend = OnlineTrend::windowed(10);
        assert!(matches!(
            windowed_slope(&mut trend, &batch, 10).unwrap_err(),
            Error::InsufficientData(_)
        ));
    }

    #[test]
    fn windowed_slope_skips_non_finite_folds() {
        // All observations share one timestamp: zero x-spread, NaN slope
        // in every window, baseline stays absent.
        let batch = vec![
            obs("2013-04-01T10:00:00Z", 1.0),
            obs("2013-04-01T10:00:00Z", 2.0),
            obs("2013-04-01T10:00:00Z", 3.0),
        ];
        let mut trend = OnlineTrend::windowed(2);
        assert_eq!(windowed_slope(&mut trend, &batch, 2).unwrap(), None);
    }

    #[test]
    fn windowed_slope_anchors_origin_on_trend_state() {
        let batch: Vec<Observation> = (0..4)
            .map(|i| obs(&format!("2013-04-01T10:00:{:02}Z", i), 1000.0 * i as f64))
            .collect();
        let mut trend = OnlineTrend::windowed(2);
        windowed_slope(&mut trend, &batch, 2).unwrap();
        assert_eq!(trend.origin_epoch(), Some(batch[0].epoch_secs()));
    }
}
