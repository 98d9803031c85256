//! Noise-scale calibration for the classical Gaussian mechanism.
//!
//! For `(epsilon, delta)`-DP with L2 sensitivity `s`, adding `N(0, sigma^2)`
//! noise with
//!
//! ```text
//! sigma = sqrt(2 * ln(1.25 / delta)) * s / epsilon
//! ```
//!
//! suffices (Dwork & Roth, Theorem A.1).

use crate::error::{DpError, Result};
use crate::params::{check_delta, check_epsilon, check_sensitivity, PrivacyParams};

/// Compute the Gaussian noise standard deviation for the given parameters.
///
/// All three parameters are checked before any arithmetic: `epsilon` and
/// `sensitivity` must be positive and finite, `delta` must lie in `(0, 1)`.
/// Out-of-domain input yields [`DpError::InvalidParameter`]. In-range input
/// whose sigma overflows (a subnormal `delta`, or a huge
/// `sensitivity / epsilon` ratio) yields [`DpError::Numerical`].
///
/// ```
/// use reach_privacy_core::compute_sigma;
///
/// let sigma = compute_sigma(0.5, 1e-5, 1.0).unwrap();
/// assert!((sigma - 9.6896).abs() < 1e-3);
/// assert!(compute_sigma(0.0, 1e-5, 1.0).is_err());
/// ```
pub fn compute_sigma(epsilon: f64, delta: f64, sensitivity: f64) -> Result<f64> {
    check_epsilon(epsilon)?;
    check_delta(delta)?;
    check_sensitivity(sensitivity)?;
    let sigma = gaussian_sigma(epsilon, delta, sensitivity);
    if !sigma.is_finite() {
        return Err(DpError::numerical(format!(
            "gaussian sigma overflows for epsilon={epsilon}, delta={delta:e}, \
             sensitivity={sensitivity}"
        )));
    }
    Ok(sigma)
}

impl PrivacyParams {
    /// Gaussian noise standard deviation for these parameters.
    pub fn sigma(&self) -> f64 {
        gaussian_sigma(self.epsilon(), self.delta(), self.sensitivity())
    }
}

#[inline]
fn gaussian_sigma(epsilon: f64, delta: f64, sensitivity: f64) -> f64 {
    (2.0 * (1.25 / delta).ln()).sqrt() * sensitivity / epsilon
}
