//! Privacy parameters for a single noisy release.

use crate::error::{DpError, Result};
use crate::sigma::compute_sigma;

/// Sensitivity of a unique-reach count: one user changes it by at most one.
pub const DEFAULT_SENSITIVITY: f64 = 1.0;

/// Validated `(epsilon, delta, sensitivity)` triple.
///
/// Values of this type always satisfy `epsilon > 0`, `0 < delta < 1` and
/// `sensitivity > 0`, all finite, and have a finite positive sigma.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrivacyParams {
    epsilon: f64,
    delta: f64,
    sensitivity: f64,
}

impl PrivacyParams {
    /// Validate and bundle privacy parameters.
    ///
    /// Also fails when the parameters are in range but their Gaussian sigma
    /// is not representable as a finite `f64`.
    pub fn new(epsilon: f64, delta: f64, sensitivity: f64) -> Result<Self> {
        compute_sigma(epsilon, delta, sensitivity)?;
        Ok(Self {
            epsilon,
            delta,
            sensitivity,
        })
    }

    /// Parameters with [`DEFAULT_SENSITIVITY`].
    pub fn with_default_sensitivity(epsilon: f64, delta: f64) -> Result<Self> {
        Self::new(epsilon, delta, DEFAULT_SENSITIVITY)
    }

    /// Privacy loss bound.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Failure probability.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Sensitivity of the released value.
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }
}

pub(crate) fn check_epsilon(epsilon: f64) -> Result<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(DpError::invalid(format!(
            "epsilon must be positive and finite, got {epsilon}"
        )));
    }
    Ok(())
}

pub(crate) fn check_delta(delta: f64) -> Result<()> {
    // Upper bound is 1, not 1.25: delta >= 1 carries no privacy guarantee.
    if !delta.is_finite() || delta <= 0.0 || delta >= 1.0 {
        return Err(DpError::invalid(format!(
            "delta must be in (0, 1), got {delta}"
        )));
    }
    Ok(())
}

pub(crate) fn check_sensitivity(sensitivity: f64) -> Result<()> {
    if !sensitivity.is_finite() || sensitivity <= 0.0 {
        return Err(DpError::invalid(format!(
            "sensitivity must be positive and finite, got {sensitivity}"
        )));
    }
    Ok(())
}
