//! The scoring-procedure lifecycle.
//!
//! One [`Procedure`] value covers all four procedure kinds; the kind
//! selects the baseline-training strategy, the live statistic, and the
//! verdict thresholds. The host drives each instance through
//! configure → (train) → calculate* → close and owns it exclusively; no
//! calls are concurrent.
//!
//! The numeric state lives in an owned, equality-comparable
//! [`ProcedureState`] record so tests can assert that an operation left
//! the state untouched. The diagnostic sink and verdict mapper are
//! injected capabilities kept outside that record.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use dt_common::{
    Boundary, DistanceType, Error, Observation, PercentDistanceMapper, Result, ValueKind, Verdict,
    VerdictMapper,
};
use dt_math::population_variance;

use crate::estimator::OnlineTrend;
use crate::ordering::sorted;
use crate::sink::{DiagnosticSink, MemorySink};
use crate::training;

/// Strategy variant selecting baseline, statistic, and thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureKind {
    /// Observations-per-day count against a daily-mean baseline (25/50).
    DayCountMean,
    /// Population variance of quantitative values (25/50).
    Variance,
    /// Permanently accumulating regression slope (50/100).
    SimpleRegression,
    /// Sliding-window regression slope over the `freshness` most recent
    /// observations (50/100).
    WindowedRegression { freshness: usize },
}

impl ProcedureKind {
    /// Low/high percent thresholds handed to the verdict mapper.
    fn thresholds(&self) -> (f64, f64) {
        match self {
            ProcedureKind::DayCountMean | ProcedureKind::Variance => (25.0, 50.0),
            ProcedureKind::SimpleRegression | ProcedureKind::WindowedRegression { .. } => {
                (50.0, 100.0)
            }
        }
    }

    fn is_regression(&self) -> bool {
        matches!(
            self,
            ProcedureKind::SimpleRegression | ProcedureKind::WindowedRegression { .. }
        )
    }
}

/// Lifecycle phase of one procedure instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Unconfigured,
    Configured,
    Trained,
    Active,
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Unconfigured => write!(f, "unconfigured"),
            Phase::Configured => write!(f, "configured"),
            Phase::Trained => write!(f, "trained"),
            Phase::Active => write!(f, "active"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

/// Owned numeric state of one procedure instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureState {
    /// Baseline declared in the policy config string.
    pub expected_by_policy: f64,
    /// Baseline learned by train; supersedes the policy value when set.
    pub trained: Option<f64>,
    /// Regression state (origin epoch, accumulators, window history).
    pub trend: OnlineTrend,
}

impl ProcedureState {
    /// The comparison baseline for the next calculate call.
    pub fn expected(&self) -> f64 {
        self.trained.unwrap_or(self.expected_by_policy)
    }
}

/// A configurable, optionally trainable scoring procedure.
pub struct Procedure {
    kind: ProcedureKind,
    phase: Phase,
    state: Option<ProcedureState>,
    sink: Box<dyn DiagnosticSink>,
    mapper: Box<dyn VerdictMapper>,
}

impl Procedure {
    /// New unconfigured procedure with an in-memory diagnostic sink and
    /// the percent-distance reference mapper.
    pub fn new(kind: ProcedureKind) -> Self {
        Self {
            kind,
            phase: Phase::Unconfigured,
            state: None,
            sink: Box::new(MemorySink::new()),
            mapper: Box::new(PercentDistanceMapper),
        }
    }

    /// Replace the diagnostic sink (e.g. [`crate::sink::FileSink`]).
    /// The sink must already be open; call before configure.
    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the verdict mapper.
    pub fn with_mapper(mut self, mapper: Box<dyn VerdictMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn kind(&self) -> ProcedureKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Numeric state record, present once configured.
    pub fn state(&self) -> Option<&ProcedureState> {
        self.state.as_ref()
    }

    fn guard(&self, op: &'static str, allowed: &[Phase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(Error::LifecycleViolation {
                op,
                phase: self.phase.to_string(),
            })
        }
    }

    /// Parse the policy-declared baseline and reset trained state.
    pub fn configure(&mut self, config: &str) -> Result<()> {
        trace!(kind = ?self.kind, config, "configure");
        self.guard("configure", &[Phase::Unconfigured])?;
        if let ProcedureKind::WindowedRegression { freshness } = self.kind {
            if freshness == 0 {
                return Err(Error::InvalidConfig(format!(
                    "freshness must be positive, got {freshness}"
                )));
            }
        }
        let expected_by_policy: f64 = config
            .trim()
            .parse()
            .map_err(|_| Error::InvalidConfig(config.to_string()))?;

        let trend = match self.kind {
            ProcedureKind::WindowedRegression { freshness } => OnlineTrend::windowed(freshness),
            _ => OnlineTrend::unwindowed(),
        };
        self.state = Some(ProcedureState {
            expected_by_policy,
            trained: None,
            trend,
        });
        self.phase = Phase::Configured;
        Ok(())
    }

    /// Learn a baseline from a historical batch over `[start, end]`.
    ///
    /// A reversed interval degrades to "no training" (warned, not an
    /// error); `SimpleRegression` declares training unsupported and
    /// succeeds as a no-op. On a typed error (e.g. insufficient data)
    /// the phase stays `Configured` and `trained` stays absent.
    pub fn train(
        &mut self,
        batch: &[Observation],
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.guard("train", &[Phase::Configured])?;
        let Some(state) = self.state.as_mut() else {
            return Err(Error::LifecycleViolation {
                op: "train",
                phase: Phase::Unconfigured.to_string(),
            });
        };

        if start > end {
            warn!(kind = ?self.kind, "training interval is reversed; baseline stays untrained");
            self.phase = Phase::Trained;
            return Ok(());
        }

        let sorted_batch = sorted(batch);
        match self.kind {
            ProcedureKind::SimpleRegression => {
                info!("training not supported for this procedure");
            }
            ProcedureKind::DayCountMean => {
                let baseline = training::day_count_mean(&sorted_batch, start, end)?;
                state.trained = finite_baseline(baseline);
            }
            ProcedureKind::Variance => {
                let baseline = training::quantitative_variance(&sorted_batch)?;
                state.trained = finite_baseline(baseline);
            }
            ProcedureKind::WindowedRegression { freshness } => {
                match training::windowed_slope(&mut state.trend, &sorted_batch, freshness)? {
                    Some(baseline) => state.trained = Some(baseline),
                    None => {
                        warn!("no finite window slope; baseline stays untrained");
                    }
                }
            }
        }

        self.phase = Phase::Trained;
        info!(kind = ?self.kind, trained = ?state.trained, "training done");
        Ok(())
    }

    /// Score one live batch against the current baseline.
    ///
    /// An empty batch is the defined no-signal case: neutral verdict,
    /// estimator state untouched.
    pub fn calculate(&mut self, batch: &[Observation]) -> Result<Verdict> {
        self.calculate_at(batch, Utc::now().date_naive())
    }

    /// [`Self::calculate`] with an explicit "today" for the day-count
    /// statistic, so tests control the clock.
    pub fn calculate_at(&mut self, batch: &[Observation], today: NaiveDate) -> Result<Verdict> {
        self.guard("calculate", &[Phase::Configured, Phase::Trained, Phase::Active])?;
        self.phase = Phase::Active;
        if batch.is_empty() {
            warn!(kind = ?self.kind, "no features to calculate on; returning neutral verdict");
            return Ok(Verdict::Marginal);
        }

        let Some(state) = self.state.as_mut() else {
            return Err(Error::LifecycleViolation {
                op: "calculate",
                phase: Phase::Unconfigured.to_string(),
            });
        };
        let sorted_batch = sorted(batch);

        let observed = match self.kind {
            ProcedureKind::DayCountMean => sorted_batch
                .iter()
                .filter(|obs| obs.timestamp.date_naive() == today)
                .count() as f64,
            ProcedureKind::Variance => {
                let values: Vec<f64> = sorted_batch
                    .iter()
                    .filter(|obs| obs.kind == ValueKind::Quantitative)
                    .map(|obs| obs.value)
                    .collect();
                if values.is_empty() {
                    warn!("no quantitative observations; returning neutral verdict");
                    return Ok(Verdict::Marginal);
                }
                population_variance(&values)
            }
            ProcedureKind::SimpleRegression | ProcedureKind::WindowedRegression { .. } => {
                match state.trend.ingest(&sorted_batch) {
                    Some(sample) => {
                        self.sink.record(&sample)?;
                        state.trend.slope()
                    }
                    None => return Ok(Verdict::Marginal),
                }
            }
        };

        if !observed.is_finite() {
            return Err(Error::NonFiniteStatistic(format!(
                "live statistic is {observed} for {:?}",
                self.kind
            )));
        }
        let expected = state.expected();
        if !expected.is_finite() {
            return Err(Error::NonFiniteStatistic(format!(
                "baseline is {expected} for {:?}",
                self.kind
            )));
        }

        let (low, high) = self.kind.thresholds();
        let verdict = self
            .mapper
            .map(observed, expected, DistanceType::Percent, Boundary::High, low, high)?;
        debug!(observed, expected, verdict = %verdict, "calculate");
        Ok(verdict)
    }

    /// Feed one raw `(x, y)` pair straight into the regression and return
    /// the current slope. Calibration entry point for regression kinds.
    pub fn probe(&mut self, x: f64, y: f64) -> Result<f64> {
        self.guard("probe", &[Phase::Configured, Phase::Trained, Phase::Active])?;
        if !self.kind.is_regression() {
            return Err(Error::LifecycleViolation {
                op: "probe",
                phase: format!("{} ({:?} kind has no regression)", self.phase, self.kind),
            });
        }
        let Some(state) = self.state.as_mut() else {
            return Err(Error::LifecycleViolation {
                op: "probe",
                phase: Phase::Unconfigured.to_string(),
            });
        };
        let sample = state.trend.probe(x, y);
        self.sink.record(&sample)?;
        Ok(state.trend.slope())
    }

    /// Release the diagnostic sink. Idempotent; safe after failures.
    pub fn close(&mut self) -> Result<()> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        trace!(kind = ?self.kind, "close");
        self.sink.close()?;
        self.phase = Phase::Closed;
        Ok(())
    }
}

impl Drop for Procedure {
    fn drop(&mut self) {
        // Sink release must not depend on the host reaching close.
        let _ = self.sink.close();
    }
}

fn finite_baseline(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        warn!(value, "discarding non-finite trained baseline");
        None
    }
}
