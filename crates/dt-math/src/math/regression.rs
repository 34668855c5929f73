//! Incremental simple linear regression.
//!
//! Maintains updating-mean accumulators (mean of x, mean of y, and
//! centered sums Σ(x−x̄)², Σ(x−x̄)(y−ȳ), Σ(y−ȳ)²) so slope, intercept,
//! standard errors, and point predictions are available on demand after
//! every added pair. The centered form avoids the catastrophic
//! cancellation the naive Σx² − (Σx)²/n moments suffer when x-values are
//! large epoch offsets.
//!
//! Undefined statistics are reported as NaN, never as a panic: slope
//! needs at least two points with x-spread, standard errors at least
//! three. Callers decide whether NaN is a skip (training folds) or a
//! hard error (live scoring).

use serde::{Deserialize, Serialize};

/// Minimum centered x-sum treated as non-degenerate. Below this the
/// x-values are effectively constant and the slope is undefined.
const MIN_SUM_XX: f64 = 10.0 * f64::MIN_POSITIVE;

/// Running state for incremental simple linear regression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionAccumulator {
    n: u64,
    x_bar: f64,
    y_bar: f64,
    sum_xx: f64,
    sum_xy: f64,
    sum_yy: f64,
}

impl RegressionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs added since the last clear.
    pub fn count(&self) -> u64 {
        self.n
    }

    /// Add one `(x, y)` pair.
    pub fn add(&mut self, x: f64, y: f64) {
        if self.n == 0 {
            self.x_bar = x;
            self.y_bar = y;
        } else {
            let n = self.n as f64;
            let factor = n / (n + 1.0);
            let dx = x - self.x_bar;
            let dy = y - self.y_bar;
            self.sum_xx += dx * dx * factor;
            self.sum_yy += dy * dy * factor;
            self.sum_xy += dx * dy * factor;
            self.x_bar += dx / (n + 1.0);
            self.y_bar += dy / (n + 1.0);
        }
        self.n += 1;
    }

    /// Reset to the empty state in place.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Least-squares slope, NaN until two points with x-spread exist.
    pub fn slope(&self) -> f64 {
        if self.n < 2 || self.sum_xx.abs() < MIN_SUM_XX {
            return f64::NAN;
        }
        self.sum_xy / self.sum_xx
    }

    /// Least-squares intercept, NaN whenever the slope is.
    pub fn intercept(&self) -> f64 {
        self.y_bar - self.slope() * self.x_bar
    }

    /// Sum of squared residuals around the fitted line.
    fn sse(&self) -> f64 {
        (self.sum_yy - self.sum_xy * self.sum_xy / self.sum_xx).max(0.0)
    }

    /// Residual mean square, NaN until three points exist.
    fn mse(&self) -> f64 {
        if self.n < 3 {
            return f64::NAN;
        }
        self.sse() / (self.n - 2) as f64
    }

    /// Standard error of the slope estimate.
    pub fn slope_std_err(&self) -> f64 {
        if self.n < 3 || self.sum_xx.abs() < MIN_SUM_XX {
            return f64::NAN;
        }
        (self.mse() / self.sum_xx).sqrt()
    }

    /// Standard error of the intercept estimate.
    pub fn intercept_std_err(&self) -> f64 {
        if self.n < 3 || self.sum_xx.abs() < MIN_SUM_XX {
            return f64::NAN;
        }
        let n = self.n as f64;
        (self.mse() * (1.0 / n + self.x_bar * self.x_bar / self.sum_xx)).sqrt()
    }

    /// Point prediction `intercept + slope * x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept() + self.slope() * x
    }
}
