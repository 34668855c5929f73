//! Drift Triage common types, verdicts, and errors.
//!
//! This crate provides foundational types shared across dt-core modules:
//! - Timestamped observation model with value kinds
//! - Batch ingestion with per-item timestamp validation
//! - Ternary verdict type and the verdict-mapper contract
//! - Common error types with stable codes

pub mod error;
pub mod feature;
pub mod verdict;

pub use error::{Error, ErrorCategory, Result};
pub use feature::{ingest_batch, IngestOutcome, Observation, RawObservation, ValueKind};
pub use verdict::{Boundary, DistanceType, PercentDistanceMapper, Verdict, VerdictMapper};
