//! Error types for Drift Triage.
//!
//! Structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for the host scheduler
//!
//! Every error is local to one procedure instance: a failed configure or
//! train call never corrupts other instances. Conditions the original
//! behavior treats as "do nothing useful" (empty batches, reversed
//! training intervals) degrade to defined neutral results at the call
//! site; conditions where data is structurally absent or a statistic is
//! undefined propagate as typed errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Drift Triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Procedure configuration and lifecycle errors.
    Config,
    /// Batch ingestion errors (timestamp parsing).
    Ingest,
    /// Baseline training errors.
    Training,
    /// Numerical errors (non-finite statistics).
    Numeric,
    /// Diagnostic sink I/O errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Ingest => write!(f, "ingest"),
            ErrorCategory::Training => write!(f, "training"),
            ErrorCategory::Numeric => write!(f, "numeric"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Drift Triage.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("invalid procedure config: {0:?} is not a number")]
    InvalidConfig(String),

    #[error("lifecycle violation: {op} called in phase {phase}")]
    LifecycleViolation { op: &'static str, phase: String },

    // Ingestion errors (20-29)
    #[error("malformed timestamp {raw:?}: {reason}")]
    MalformedTimestamp { raw: String, reason: String },

    // Training errors (30-39)
    #[error("reversed interval: training start is after end")]
    ReversedInterval,

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    // Numerical errors (40-49)
    #[error("non-finite statistic: {0}")]
    NonFiniteStatistic(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// Error codes are grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Ingestion errors
    /// - 30-39: Training errors
    /// - 40-49: Numerical errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidConfig(_) => 10,
            Error::LifecycleViolation { .. } => 11,
            Error::MalformedTimestamp { .. } => 20,
            Error::ReversedInterval => 30,
            Error::InsufficientData(_) => 31,
            Error::NonFiniteStatistic(_) => 40,
            Error::Io(_) => 60,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidConfig(_) | Error::LifecycleViolation { .. } => ErrorCategory::Config,
            Error::MalformedTimestamp { .. } => ErrorCategory::Ingest,
            Error::ReversedInterval | Error::InsufficientData(_) => ErrorCategory::Training,
            Error::NonFiniteStatistic(_) => ErrorCategory::Numeric,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Recoverable errors resolve on their own once better input arrives:
    /// a later batch with parseable timestamps, a longer training
    /// interval, or simply more observations.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::InvalidConfig(_) | Error::LifecycleViolation { .. } => false,
            Error::MalformedTimestamp { .. }
            | Error::ReversedInterval
            | Error::InsufficientData(_) => true,
            Error::NonFiniteStatistic(_) => true,
            Error::Io(_) => false,
        }
    }
}
