//! Ternary verdicts and the verdict-mapper contract.
//!
//! Every procedure reduces its live statistic to a bounded ternary
//! verdict by comparing against a baseline through a [`VerdictMapper`].
//! The mapper is a host collaborator; [`PercentDistanceMapper`] is the
//! reference implementation used when the host supplies none.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bounded ternary verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Observed statistic is within the normal range (-1, "hint not fulfilled").
    Within,
    /// Mild deviation, inconclusive (0).
    Marginal,
    /// Clear deviation from the baseline (+1).
    Deviating,
}

impl Verdict {
    /// Numeric score in {-1, 0, +1}.
    pub fn score(&self) -> i8 {
        match self {
            Verdict::Within => -1,
            Verdict::Marginal => 0,
            Verdict::Deviating => 1,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Within => write!(f, "within"),
            Verdict::Marginal => write!(f, "marginal"),
            Verdict::Deviating => write!(f, "deviating"),
        }
    }
}

/// How the distance between observed and expected is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceType {
    /// Relative distance as a percentage of the expected value.
    Percent,
}

/// Which side of the expected value counts as a deviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Deviations in either direction escalate; thresholds bound from above.
    High,
}

/// Maps an observed statistic against an expected baseline onto a verdict.
///
/// Implementations must be deterministic, total over finite inputs, and
/// monotone in distance: a larger distance never yields a lesser verdict.
pub trait VerdictMapper {
    fn map(
        &self,
        observed: f64,
        expected: f64,
        distance: DistanceType,
        boundary: Boundary,
        low_threshold_pct: f64,
        high_threshold_pct: f64,
    ) -> Result<Verdict>;
}

/// Reference mapper: relative percent distance with two thresholds.
///
/// Distance within `low` → [`Verdict::Within`]; within `high` →
/// [`Verdict::Marginal`]; beyond → [`Verdict::Deviating`]. A zero
/// expected value yields zero distance when observed is also zero and an
/// infinite distance otherwise. NaN distance is a hard failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PercentDistanceMapper;

impl PercentDistanceMapper {
    fn percent_distance(observed: f64, expected: f64) -> f64 {
        if observed == expected {
            return 0.0;
        }
        if expected == 0.0 {
            return f64::INFINITY;
        }
        ((observed - expected).abs() / expected.abs()) * 100.0
    }
}

impl VerdictMapper for PercentDistanceMapper {
    fn map(
        &self,
        observed: f64,
        expected: f64,
        distance: DistanceType,
        boundary: Boundary,
        low_threshold_pct: f64,
        high_threshold_pct: f64,
    ) -> Result<Verdict> {
        let DistanceType::Percent = distance;
        let Boundary::High = boundary;

        let dist = Self::percent_distance(observed, expected);
        if dist.is_nan() {
            return Err(Error::NonFiniteStatistic(format!(
                "distance of observed {observed} from expected {expected} is undefined"
            )));
        }
        if dist <= low_threshold_pct {
            Ok(Verdict::Within)
        } else if dist <= high_threshold_pct {
            Ok(Verdict::Marginal)
        } else {
            Ok(Verdict::Deviating)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(observed: f64, expected: f64) -> Result<Verdict> {
        PercentDistanceMapper.map(
            observed,
            expected,
            DistanceType::Percent,
            Boundary::High,
            25.0,
            50.0,
        )
    }

    #[test]
    fn exact_match_is_within() {
        assert_eq!(map(100.0, 100.0).unwrap(), Verdict::Within);
        assert_eq!(map(0.0, 0.0).unwrap(), Verdict::Within);
    }

    #[test]
    fn thirty_percent_is_marginal() {
        assert_eq!(map(130.0, 100.0).unwrap(), Verdict::Marginal);
        assert_eq!(map(70.0, 100.0).unwrap(), Verdict::Marginal);
    }

    #[test]
    fn double_is_deviating() {
        assert_eq!(map(200.0, 100.0).unwrap(), Verdict::Deviating);
    }

    #[test]
    fn zero_expected_with_nonzero_observed_deviates() {
        assert_eq!(map(0.1, 0.0).unwrap(), Verdict::Deviating);
    }

    #[test]
    fn nan_observed_is_hard_failure() {
        assert!(map(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn monotone_in_distance() {
        let mut last = -1;
        for observed in [100.0, 110.0, 124.9, 125.1, 149.9, 150.1, 400.0] {
            let score = map(observed, 100.0).unwrap().score();
            assert!(score >= last, "verdict regressed at observed={observed}");
            last = score;
        }
    }

    #[test]
    fn negative_expected_uses_absolute_distance() {
        // Slope baselines can be negative; distance is relative to |expected|.
        assert_eq!(map(-100.0, -100.0).unwrap(), Verdict::Within);
        assert_eq!(map(-130.0, -100.0).unwrap(), Verdict::Marginal);
        assert_eq!(map(100.0, -100.0).unwrap(), Verdict::Deviating);
    }
}
