//! Calendar-day bucketing and inclusive day spans.
//!
//! Buckets group consecutive same-day observations of a sorted batch.
//! "Same day" means equal `(year, day-of-year)` as written in the
//! timestamp; time-of-day and offset are ignored entirely.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use dt_common::{Error, Observation, Result};

/// Observations sharing one calendar day, in timestamp order.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    /// The shared calendar day.
    pub day: NaiveDate,
    /// Members in the order they appear in the sorted batch.
    pub members: Vec<Observation>,
}

impl DayBucket {
    /// Number of observations in this bucket.
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// Group a sorted batch into contiguous same-day buckets.
///
/// Walks the sequence once, closing a bucket whenever the next
/// observation's calendar day differs from the current one. Empty input
/// yields zero buckets; the first bucket is never assumed to exist.
pub fn bucketize(sorted: &[Observation]) -> Vec<DayBucket> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    for obs in sorted {
        match buckets.last_mut() {
            Some(bucket) if bucket.day == obs.timestamp.date_naive() => {
                bucket.members.push(obs.clone());
            }
            _ => buckets.push(DayBucket {
                day: obs.timestamp.date_naive(),
                members: vec![obs.clone()],
            }),
        }
    }
    buckets
}

/// Inclusive day count from `start` to `end`.
///
/// `365 * Δyear + Δday-of-year + 1`; Jan 1 to Jan 5 is 5 days, a day to
/// itself is 1. Leap years are deliberately ignored: the approximation is
/// part of the trained-baseline format and must stay bit-for-bit stable.
///
/// Fails with [`Error::ReversedInterval`] when `start` is chronologically
/// after `end`; callers treat that as a zero-day span.
pub fn duration_in_days(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<i64> {
    if start > end {
        return Err(Error::ReversedInterval);
    }
    let years = i64::from(end.year() - start.year());
    let days = i64::from(end.ordinal()) - i64::from(start.ordinal());
    Ok(365 * years + days + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::sorted;
    use dt_common::{Observation, RawObservation};

    fn obs(ts: &str, value: f64) -> Observation {
        Observation::parse(&RawObservation::quantitative(ts, value)).unwrap()
    }

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn empty_input_yields_zero_buckets() {
        assert!(bucketize(&[]).is_empty());
    }

    #[test]
    fn partitions_by_calendar_day() {
        let batch = sorted(&[
            obs("2013-04-01T09:00:00Z", 1.0),
            obs("2013-04-01T17:00:00Z", 2.0),
            obs("2013-04-02T09:00:00Z", 3.0),
            obs("2013-04-04T09:00:00Z", 4.0),
            obs("2013-04-04T10:00:00Z", 5.0),
        ]);
        let buckets = bucketize(&batch);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count(), 2);
        assert_eq!(buckets[1].count(), 1);
        assert_eq!(buckets[2].count(), 2);
        for pair in buckets.windows(2) {
            assert!(pair[0].day <= pair[1].day);
        }
    }

    #[test]
    fn bucketizing_is_idempotent_over_permutations() {
        let base = vec![
            obs("2013-04-03T09:00:00Z", 3.0),
            obs("2013-04-01T09:00:00Z", 1.0),
            obs("2013-04-02T09:00:00Z", 2.0),
        ];
        let once = bucketize(&sorted(&base));
        let mut permuted = base.clone();
        permuted.reverse();
        let again = bucketize(&sorted(&permuted));
        assert_eq!(once, again);
        assert_eq!(bucketize(&sorted(&base)), once);
    }

    #[test]
    fn inclusive_duration_examples() {
        assert_eq!(
            duration_in_days(ts("2011-01-01T00:00:00Z"), ts("2011-01-05T00:00:00Z")).unwrap(),
            5
        );
        assert_eq!(
            duration_in_days(ts("2011-01-01T08:00:00Z"), ts("2011-01-01T20:00:00Z")).unwrap(),
            1
        );
        // Year boundary: leap years ignored by design.
        assert_eq!(
            duration_in_days(ts("2012-12-31T00:00:00Z"), ts("2013-01-01T00:00:00Z")).unwrap(),
            365 - 366 + 1 + 1
        );
    }

    #[test]
    fn reversed_interval_is_reported() {
        let err =
            duration_in_days(ts("2011-01-05T00:00:00Z"), ts("2011-01-01T00:00:00Z")).unwrap_err();
        assert!(matches!(err, Error::ReversedInterval));
    }
}
