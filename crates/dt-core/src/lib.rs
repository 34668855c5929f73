//! Drift Triage Core Library
//!
//! This library provides the scoring-procedure framework:
//! - Stable event ordering by observation timestamp
//! - Calendar-day bucketing and inclusive day spans
//! - Baseline training strategies (day-count mean, variance, windowed slope)
//! - Windowed and unwindowed online regression estimators
//! - Diagnostic record sinks
//! - The procedure lifecycle (configure / train / calculate / close)
//!
//! The host that feeds batches, persists policies, and schedules
//! executions is an external collaborator; so is any verdict mapper
//! beyond the bundled percent-distance reference.

pub mod bucketing;
pub mod estimator;
pub mod ordering;
pub mod procedure;
pub mod sink;
pub mod training;

pub use estimator::{OnlineTrend, TrendSample, DEFAULT_FRESHNESS};
pub use procedure::{Phase, Procedure, ProcedureKind, ProcedureState};
pub use sink::{DiagnosticSink, FileSink, MemorySink};
