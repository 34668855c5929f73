//! Stable ordering of observations by timestamp.
//!
//! Bucketing and windowing are ordering-sensitive, so equal timestamps
//! must keep their input order (stable sort). Comparison is strictly by
//! the parsed instant; malformed timestamps cannot reach this point
//! because ingestion rejects them per item.

use dt_common::Observation;

/// Sort a batch in place, stably, by timestamp.
pub fn sort_by_timestamp(batch: &mut [Observation]) {
    batch.sort_by_key(|obs| obs.timestamp);
}

/// Sorted copy of a batch.
pub fn sorted(batch: &[Observation]) -> Vec<Observation> {
    let mut out = batch.to_vec();
    sort_by_timestamp(&mut out);
    out
}
