//! Noise mechanisms for differential privacy.
//!
//! Every function takes the random source as an explicit argument. Nothing
//! here keeps a generator of its own, so reproducibility is a matter of
//! seeding the generator the caller passes in.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};

use crate::error::{DpError, Result};
use crate::params::{check_epsilon, check_sensitivity, PrivacyParams};
use crate::sigma::compute_sigma;

/// Add calibrated Gaussian noise to `value`.
///
/// Draws one sample from `N(0, params.sigma()^2)` and returns `value + noise`.
pub fn add_noise<R: Rng>(value: f64, params: &PrivacyParams, rng: &mut R) -> f64 {
    value + gaussian_sample(params.sigma(), rng)
}

/// Add calibrated Gaussian noise to `value`, validating the raw parameters.
///
/// Fails with [`DpError::InvalidParameter`] before touching `rng` when the
/// parameters are out of domain.
pub fn add_gaussian_noise<R: Rng>(
    value: f64,
    epsilon: f64,
    delta: f64,
    sensitivity: f64,
    rng: &mut R,
) -> Result<f64> {
    let sigma = compute_sigma(epsilon, delta, sensitivity)?;
    Ok(value + gaussian_sample(sigma, rng))
}

/// Scale `b = sensitivity / epsilon` of the Laplace mechanism.
///
/// Fails with [`DpError::Numerical`] when the ratio overflows.
pub fn laplace_scale(epsilon: f64, sensitivity: f64) -> Result<f64> {
    check_epsilon(epsilon)?;
    check_sensitivity(sensitivity)?;
    let scale = sensitivity / epsilon;
    if !scale.is_finite() {
        return Err(DpError::numerical(format!(
            "laplace scale overflows for epsilon={epsilon}, sensitivity={sensitivity}"
        )));
    }
    Ok(scale)
}

/// Add Laplace noise calibrated for pure `epsilon`-DP to `value`.
pub fn add_laplace_noise<R: Rng>(
    value: f64,
    epsilon: f64,
    sensitivity: f64,
    rng: &mut R,
) -> Result<f64> {
    let scale = laplace_scale(epsilon, sensitivity)?;
    Ok(value + laplace_sample(scale, rng))
}

fn gaussian_sample<R: Rng>(sigma: f64, rng: &mut R) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    let noise = sigma * z;
    tracing::trace!(sigma, noise, "gaussian draw");
    noise
}

fn laplace_sample<R: Rng>(scale: f64, rng: &mut R) -> f64 {
    // Difference of two unit exponentials is standard Laplace.
    let a: f64 = Exp1.sample(rng);
    let b: f64 = Exp1.sample(rng);
    let noise = scale * (a - b);
    tracing::trace!(scale, noise, "laplace draw");
    noise
}

fn check_override(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DpError::invalid(format!(
            "{name} override must be positive and finite, got {value}"
        )));
    }
    Ok(())
}

/// Gaussian mechanism with sensitivity calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianMechanism {
    params: PrivacyParams,
    sigma_override: Option<f64>,
}

impl GaussianMechanism {
    /// Create a mechanism calibrated from `params`.
    pub fn new(params: PrivacyParams) -> Self {
        tracing::debug!(
            epsilon = params.epsilon(),
            delta = params.delta(),
            sensitivity = params.sensitivity(),
            sigma = params.sigma(),
            "gaussian mechanism calibrated"
        );
        Self {
            params,
            sigma_override: None,
        }
    }

    /// Use a known standard deviation instead of the calibrated one.
    pub fn with_sigma(mut self, sigma: f64) -> Result<Self> {
        check_override("sigma", sigma)?;
        self.sigma_override = Some(sigma);
        Ok(self)
    }

    /// Privacy parameters the mechanism was built from.
    pub fn params(&self) -> &PrivacyParams {
        &self.params
    }

    /// Noise standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma_override.unwrap_or_else(|| self.params.sigma())
    }

    /// Add noise to a single value.
    pub fn apply<R: Rng>(&self, value: f64, rng: &mut R) -> f64 {
        value + gaussian_sample(self.sigma(), rng)
    }
}

/// Laplace mechanism with sensitivity calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaplaceMechanism {
    epsilon: f64,
    sensitivity: f64,
    scale_override: Option<f64>,
}

impl LaplaceMechanism {
    /// Create a mechanism for pure `epsilon`-DP.
    pub fn new(epsilon: f64, sensitivity: f64) -> Result<Self> {
        let scale = laplace_scale(epsilon, sensitivity)?;
        tracing::debug!(epsilon, sensitivity, scale, "laplace mechanism calibrated");
        Ok(Self {
            epsilon,
            sensitivity,
            scale_override: None,
        })
    }

    /// Use a known scale instead of the calibrated one.
    pub fn with_scale(mut self, scale: f64) -> Result<Self> {
        check_override("scale", scale)?;
        self.scale_override = Some(scale);
        Ok(self)
    }

    /// Privacy loss bound.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// L1 sensitivity.
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    /// Laplace scale parameter.
    pub fn scale(&self) -> f64 {
        self.scale_override.unwrap_or(self.sensitivity / self.epsilon)
    }

    /// Add noise to a single value.
    pub fn apply<R: Rng>(&self, value: f64, rng: &mut R) -> f64 {
        value + laplace_sample(self.scale(), rng)
    }
}

/// Selector for a noise mechanism.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum MechanismKind {
    /// Gaussian noise, `(epsilon, delta)`-DP.
    #[default]
    Gaussian,
    /// Laplace noise, pure `epsilon`-DP.
    Laplace,
}

impl MechanismKind {
    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Laplace => "laplace",
        }
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MechanismKind {
    type Err = DpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Self::Gaussian),
            "laplace" => Ok(Self::Laplace),
            other => Err(DpError::unsupported(format!("noise mechanism `{other}`"))),
        }
    }
}

/// A configured noise mechanism.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseMechanism {
    /// Gaussian mechanism.
    Gaussian(GaussianMechanism),
    /// Laplace mechanism.
    Laplace(LaplaceMechanism),
}

impl NoiseMechanism {
    /// Which mechanism this is.
    pub fn kind(&self) -> MechanismKind {
        match self {
            Self::Gaussian(_) => MechanismKind::Gaussian,
            Self::Laplace(_) => MechanismKind::Laplace,
        }
    }

    /// Noise scale: sigma for Gaussian, `b` for Laplace.
    pub fn scale(&self) -> f64 {
        match self {
            Self::Gaussian(m) => m.sigma(),
            Self::Laplace(m) => m.scale(),
        }
    }

    /// Standard deviation of the added noise.
    pub fn stddev(&self) -> f64 {
        match self {
            Self::Gaussian(m) => m.sigma(),
            Self::Laplace(m) => std::f64::consts::SQRT_2 * m.scale(),
        }
    }

    /// Add noise to a single value.
    pub fn apply<R: Rng>(&self, value: f64, rng: &mut R) -> f64 {
        match self {
            Self::Gaussian(m) => m.apply(value, rng),
            Self::Laplace(m) => m.apply(value, rng),
        }
    }
}

impl From<GaussianMechanism> for NoiseMechanism {
    fn from(m: GaussianMechanism) -> Self {
        Self::Gaussian(m)
    }
}

impl From<LaplaceMechanism> for NoiseMechanism {
    fn from(m: LaplaceMechanism) -> Self {
        Self::Laplace(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use reach_privacy_prng::NoiseKey;

    fn mean_and_std(xs: &[f64]) -> (f64, f64) {
        let n = xs.len() as f64;
        let mean = xs.iter().sum::<f64>() / n;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var.sqrt())
    }

    #[test]
    fn seeded_draws_are_reproducible() {
        let params = PrivacyParams::new(0.5, 1e-5, 1.0).unwrap();
        let mut r1 = ChaCha8Rng::seed_from_u64(42);
        let mut r2 = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..16 {
            assert_eq!(
                add_noise(100.0, &params, &mut r1),
                add_noise(100.0, &params, &mut r2)
            );
        }
    }

    #[test]
    fn consecutive_draws_differ() {
        let params = PrivacyParams::new(0.5, 1e-5, 1.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = add_noise(0.0, &params, &mut rng);
        let b = add_noise(0.0, &params, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn gaussian_statistics_match_sigma() {
        let params = PrivacyParams::new(0.5, 1e-5, 1.0).unwrap();
        let sigma = params.sigma();
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let draws: Vec<f64> = (0..100_000)
            .map(|_| add_noise(0.0, &params, &mut rng))
            .collect();
        let (mean, std) = mean_and_std(&draws);
        // Standard error of the mean is sigma / sqrt(n) ~= 0.03.
        assert!(mean.abs() < 0.15, "mean {mean}");
        assert!((std - sigma).abs() / sigma < 0.02, "std {std} vs {sigma}");
    }

    #[test]
    fn gaussian_statistics_with_keyed_stream() {
        let params = PrivacyParams::new(1.0, 1e-6, 2.0).unwrap();
        let sigma = params.sigma();
        let mut rng = NoiseKey::new(2024).to_rng();
        let draws: Vec<f64> = (0..100_000)
            .map(|_| add_noise(0.0, &params, &mut rng))
            .collect();
        let (mean, std) = mean_and_std(&draws);
        assert!(mean.abs() < 5.0 * sigma / (draws.len() as f64).sqrt());
        assert!((std - sigma).abs() / sigma < 0.02);
    }

    #[test]
    fn flat_form_rejects_bad_parameters_without_drawing() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let before = rng.clone();
        let err = add_gaussian_noise(10.0, 0.0, 1e-5, 1.0, &mut rng).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert_eq!(rng.get_word_pos(), before.get_word_pos());
        assert!(add_gaussian_noise(10.0, 0.5, 0.0, 1.0, &mut rng).is_err());
    }

    #[test]
    fn flat_form_matches_params_form() {
        let params = PrivacyParams::new(0.5, 1e-5, 1.0).unwrap();
        let mut r1 = ChaCha8Rng::seed_from_u64(5);
        let mut r2 = ChaCha8Rng::seed_from_u64(5);
        let a = add_gaussian_noise(7.0, 0.5, 1e-5, 1.0, &mut r1).unwrap();
        let b = add_noise(7.0, &params, &mut r2);
        assert_eq!(a, b);
    }

    #[test]
    fn sigma_override_takes_precedence() {
        let params = PrivacyParams::new(0.5, 1e-5, 1.0).unwrap();
        let m = GaussianMechanism::new(params).with_sigma(2.0).unwrap();
        assert_eq!(m.sigma(), 2.0);
        assert!(GaussianMechanism::new(params).with_sigma(0.0).is_err());
        assert!(GaussianMechanism::new(params).with_sigma(f64::NAN).is_err());
    }

    #[test]
    fn laplace_scale_is_sensitivity_over_epsilon() {
        assert_eq!(laplace_scale(0.9, 1.0).unwrap(), 1.0 / 0.9);
        assert_eq!(laplace_scale(2.0, 4.0).unwrap(), 2.0);
        assert!(laplace_scale(0.0, 1.0).is_err());
        assert!(laplace_scale(1.0, -1.0).is_err());
    }

    #[test]
    fn overflowing_laplace_scale_is_a_numerical_error() {
        let err = laplace_scale(f64::MIN_POSITIVE, 1e300).unwrap_err();
        assert!(matches!(err, DpError::Numerical { .. }), "{err}");
        assert!(LaplaceMechanism::new(f64::MIN_POSITIVE, 1e300).is_err());
    }

    #[test]
    fn laplace_statistics() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let scale = laplace_scale(0.9, 1.0).unwrap();
        let draws: Vec<f64> = (0..100_000)
            .map(|_| add_laplace_noise(0.0, 0.9, 1.0, &mut rng).unwrap())
            .collect();
        let (mean, std) = mean_and_std(&draws);
        let expected_std = std::f64::consts::SQRT_2 * scale;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((std - expected_std).abs() / expected_std < 0.03);
    }

    #[test]
    fn laplace_mechanism_override() {
        let m = LaplaceMechanism::new(1.0, 1.0).unwrap();
        assert_eq!(m.scale(), 1.0);
        assert_eq!(m.with_scale(3.5).unwrap().scale(), 3.5);
        assert!(m.with_scale(-1.0).is_err());
    }

    #[test]
    fn mechanism_kind_parses_case_insensitively() {
        let g: MechanismKind = "Gaussian".parse().unwrap();
        let l: MechanismKind = " laplace ".parse().unwrap();
        assert_eq!(g, MechanismKind::Gaussian);
        assert_eq!(l, MechanismKind::Laplace);
        let err = "exponential".parse::<MechanismKind>().unwrap_err();
        assert!(matches!(err, DpError::Unsupported { .. }));
        assert_eq!(MechanismKind::Laplace.to_string(), "laplace");
    }

    #[test]
    fn noise_mechanism_dispatch() {
        let params = PrivacyParams::new(1.0, 1e-5, 1.0).unwrap();
        let g: NoiseMechanism = GaussianMechanism::new(params).into();
        let l: NoiseMechanism = LaplaceMechanism::new(1.0, 1.0).unwrap().into();
        assert_eq!(g.kind(), MechanismKind::Gaussian);
        assert_eq!(g.scale(), params.sigma());
        assert_eq!(g.stddev(), params.sigma());
        assert_eq!(l.kind(), MechanismKind::Laplace);
        assert_eq!(l.scale(), 1.0);
        assert!((l.stddev() - std::f64::consts::SQRT_2).abs() < 1e-12);

        let mut r1 = ChaCha8Rng::seed_from_u64(3);
        let mut r2 = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(g.apply(5.0, &mut r1), add_noise(5.0, &params, &mut r2));
    }
}
