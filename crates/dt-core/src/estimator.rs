//! Online trend estimation over timestamped observations.
//!
//! Two variants share one state record:
//!
//! - **Unwindowed**: every accepted observation feeds the accumulator
//!   permanently; the sample is monotonically growing.
//! - **Windowed**: new observations append to an unbounded history; on
//!   every batch the accumulator is cleared and refed from only the most
//!   recent `freshness` entries, so the window boundary always moves with
//!   the data. Reported values are rounded to two decimals for stability;
//!   the raw slope stays available for verdict comparison.
//!
//! The first timestamp ever seen (training or live) becomes the origin
//! epoch; all regression x-values are seconds since that origin, which
//! fixes the numerical scale and keeps the intercept interpretable. The
//! origin is set at most once and never moves, even when later batches
//! carry chronologically earlier timestamps.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use dt_common::Observation;
use dt_math::{round2, RegressionAccumulator};

use crate::ordering::sort_by_timestamp;

/// Raw feature values are scaled down by this fixed divisor before they
/// enter the regression. Part of the trained-baseline format.
pub const Y_SCALE_DIVISOR: f64 = 1000.0;

/// Seconds ahead of the newest x-value that each point prediction targets.
pub const PREDICTION_HORIZON_SECS: f64 = 10.0;

/// Default freshness window (and prediction-alignment delay).
pub const DEFAULT_FRESHNESS: usize = 10;

/// One diagnostic sample per calculate call.
///
/// `predicted` stays `0` until the prediction history is deep enough,
/// after which it reports the prediction made one delay-length ago, so a
/// line of the diagnostic file aligns a past prediction with the value
/// actually observed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    pub index: u64,
    pub x: f64,
    pub y: f64,
    pub slope: f64,
    pub intercept: f64,
    pub slope_std_err: f64,
    pub intercept_std_err: f64,
    pub predicted: f64,
}

impl TrendSample {
    /// Semicolon-separated record line:
    /// `index;x;y;slope;intercept;slopeStdErr;interceptStdErr;predicted`.
    pub fn record_line(&self) -> String {
        format!(
            "{};{};{};{};{};{};{};{}",
            self.index,
            self.x,
            self.y,
            self.slope,
            self.intercept,
            self.slope_std_err,
            self.intercept_std_err,
            self.predicted
        )
    }
}

/// Shared state record for both trend variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineTrend {
    /// `Some(k)` selects the windowed variant with freshness `k`.
    freshness: Option<usize>,
    acc: RegressionAccumulator,
    origin_epoch: Option<i64>,
    /// Unbounded history, windowed variant only.
    history: Vec<Observation>,
    index: u64,
    /// Pending predictions, capped at the delay length.
    predictions: VecDeque<f64>,
    prediction_delay: usize,
}

impl OnlineTrend {
    /// Permanently accumulating variant.
    pub fn unwindowed() -> Self {
        Self {
            freshness: None,
            acc: RegressionAccumulator::new(),
            origin_epoch: None,
            history: Vec::new(),
            index: 0,
            predictions: VecDeque::new(),
            prediction_delay: DEFAULT_FRESHNESS,
        }
    }

    /// Sliding-window variant recomputed from the `freshness` most recent
    /// observations on every batch.
    pub fn windowed(freshness: usize) -> Self {
        Self {
            freshness: Some(freshness),
            acc: RegressionAccumulator::new(),
            origin_epoch: None,
            history: Vec::new(),
            index: 0,
            predictions: VecDeque::new(),
            prediction_delay: freshness,
        }
    }

    pub fn is_windowed(&self) -> bool {
        self.freshness.is_some()
    }

    pub fn freshness(&self) -> Option<usize> {
        self.freshness
    }

    /// First timestamp ever seen, epoch seconds.
    pub fn origin_epoch(&self) -> Option<i64> {
        self.origin_epoch
    }

    /// Current slope, unrounded. NaN until the fit is defined.
    pub fn slope(&self) -> f64 {
        self.acc.slope()
    }

    /// Seconds since the origin epoch, anchoring it on first use.
    pub(crate) fn delta_secs(&mut self, epoch_secs: i64) -> f64 {
        let origin = *self.origin_epoch.get_or_insert(epoch_secs);
        (epoch_secs - origin) as f64
    }

    /// Feed one sorted batch; `None` means no observations were available
    /// (the defined no-signal case).
    pub fn ingest(&mut self, sorted_batch: &[Observation]) -> Option<TrendSample> {
        match self.freshness {
            None => self.ingest_unwindowed(sorted_batch),
            Some(freshness) => self.ingest_windowed(sorted_batch, freshness),
        }
    }

    fn ingest_unwindowed(&mut self, sorted_batch: &[Observation]) -> Option<TrendSample> {
        let mut last = None;
        for obs in sorted_batch {
            let x = self.delta_secs(obs.epoch_secs());
            let y = obs.value / Y_SCALE_DIVISOR;
            self.acc.add(x, y);
            last = Some((x, y));
        }
        let (x, y) = last?;
        Some(self.finish_sample(x, y, false))
    }

    fn ingest_windowed(
        &mut self,
        sorted_batch: &[Observation],
        freshness: usize,
    ) -> Option<TrendSample> {
        self.history.extend_from_slice(sorted_batch);
        sort_by_timestamp(&mut self.history);
        if self.history.is_empty() {
            return None;
        }
        // Anchor on the first observation ever seen, not the window
        // boundary; the intercept is relative to this zero point.
        let origin = *self
            .origin_epoch
            .get_or_insert(self.history[0].epoch_secs());

        // The window boundary moved, so the fit starts over from scratch.
        self.acc.clear();
        let start = self.history.len().saturating_sub(freshness);
        let mut last = (0.0, 0.0);
        for obs in &self.history[start..] {
            let x = (obs.epoch_secs() - origin) as f64;
            let y = round2(obs.value / Y_SCALE_DIVISOR);
            self.acc.add(x, y);
            last = (x, y);
        }
        let (x, y) = last;
        Some(self.finish_sample(x, y, true))
    }

    /// Feed one raw `(x, y)` pair directly, bypassing timestamp handling.
    /// Calibration entry point; returns the sample for the pair.
    pub fn probe(&mut self, x: f64, y: f64) -> TrendSample {
        self.acc.add(x, y);
        self.finish_sample(x, y, false)
    }

    fn finish_sample(&mut self, x: f64, y: f64, rounded: bool) -> TrendSample {
        let shape = |v: f64| if rounded { round2(v) } else { v };

        let predicted_now = shape(self.acc.predict(x + PREDICTION_HORIZON_SECS));
        self.predictions.push_back(predicted_now);
        if self.predictions.len() > self.prediction_delay {
            self.predictions.pop_front();
        }
        // Only the oldest pending prediction is ever reported, so the
        // queue never holds more than the delay length.
        let reported = if self.predictions.len() < self.prediction_delay {
            0.0
        } else {
            self.predictions.front().copied().unwrap_or(0.0)
        };

        let sample = TrendSample {
            index: self.index,
            x,
            y,
            slope: shape(self.acc.slope()),
            intercept: shape(self.acc.intercept()),
            slope_std_err: shape(self.acc.slope_std_err()),
            intercept_std_err: shape(self.acc.intercept_std_err()),
            predicted: reported,
        };
        self.index += 1;
        sample
    }
}
