//! Drift Triage math utilities.

pub mod math;

pub use math::descriptive::*;
pub use math::regression::*;
