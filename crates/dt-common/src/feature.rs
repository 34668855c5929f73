//! Observation model and batch ingestion.
//!
//! Hosts deliver feature measurements with textual timestamps (XSD
//! dateTime / RFC 3339). Ingestion parses each timestamp exactly once and
//! partitions the batch into accepted [`Observation`]s and per-item
//! rejections, so downstream ordering and bucketing never see an
//! unparseable instant.
//!
//! Calendar comparisons (same-day bucketing) read `(year, ordinal)` from
//! the timestamp as written, ignoring time-of-day and offset. Regression
//! inputs use full epoch-second precision.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Kind tag for an observation value, fixed at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Numeric measurement usable in statistics.
    Quantitative,
    /// Categorical or textual marker; excluded from variance baselines.
    Qualitative,
}

/// One feature measurement before timestamp parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Textual timestamp, RFC 3339 / XSD dateTime.
    pub timestamp: String,
    /// Measured value.
    pub value: f64,
    /// Value kind.
    pub kind: ValueKind,
}

impl RawObservation {
    pub fn new(timestamp: impl Into<String>, value: f64, kind: ValueKind) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
            kind,
        }
    }

    /// Shorthand for a quantitative raw observation.
    pub fn quantitative(timestamp: impl Into<String>, value: f64) -> Self {
        Self::new(timestamp, value, ValueKind::Quantitative)
    }
}

/// One timestamped feature measurement, immutable once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Parsed timestamp, offset preserved as written.
    pub timestamp: DateTime<FixedOffset>,
    /// Measured value.
    pub value: f64,
    /// Value kind.
    pub kind: ValueKind,
}

impl Observation {
    /// Parse a raw observation, rejecting unparseable timestamps.
    pub fn parse(raw: &RawObservation) -> Result<Self, Error> {
        let timestamp = DateTime::parse_from_rfc3339(&raw.timestamp).map_err(|e| {
            Error::MalformedTimestamp {
                raw: raw.timestamp.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            timestamp,
            value: raw.value,
            kind: raw.kind,
        })
    }

    /// Epoch seconds, full precision, for regression x-values.
    pub fn epoch_secs(&self) -> i64 {
        self.timestamp.timestamp()
    }

    /// Calendar day key `(year, day-of-year)` as written, ignoring
    /// time-of-day and offset.
    pub fn day_key(&self) -> (i32, u32) {
        (self.timestamp.year(), self.timestamp.ordinal())
    }
}

/// Result of ingesting one raw batch: accepted observations plus the
/// errors for every rejected item. Rejections never abort the batch.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Observations with parseable timestamps, in input order.
    pub accepted: Vec<Observation>,
    /// One `MalformedTimestamp` error per rejected item.
    pub rejected: Vec<Error>,
}

impl IngestOutcome {
    /// True when every item in the batch was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parse a raw batch, partitioning accepted and rejected items.
pub fn ingest_batch(raw: &[RawObservation]) -> IngestOutcome {
    let mut outcome = IngestOutcome::default();
    for item in raw {
        match Observation::parse(item) {
            Ok(obs) => outcome.accepted.push(obs),
            Err(err) => outcome.rejected.push(err),
        }
    }
    outcome
}
