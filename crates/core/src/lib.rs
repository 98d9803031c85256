//! Core differential privacy primitives for reach reports.
//!
//! This crate calibrates Gaussian and Laplace noise from privacy parameters
//! and applies it to labelled counts. Random sources are always passed in
//! explicitly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod noise;
pub mod params;
pub mod report;
pub mod sigma;

pub use error::{DpError, Result};
pub use noise::{
    add_gaussian_noise, add_laplace_noise, add_noise, laplace_scale, GaussianMechanism,
    LaplaceMechanism, MechanismKind, NoiseMechanism,
};
pub use params::{PrivacyParams, DEFAULT_SENSITIVITY};
pub use report::{privatize_report, NoisyReport, NoisyReportEntry, ReachReport, ReportEntry};
pub use sigma::compute_sigma;

/// Common imports for downstream users.
pub mod prelude {
    pub use crate::{
        add_gaussian_noise, add_laplace_noise, add_noise, compute_sigma, laplace_scale,
        privatize_report, DpError, GaussianMechanism, LaplaceMechanism, MechanismKind,
        NoiseMechanism, NoisyReport, NoisyReportEntry, PrivacyParams, ReachReport, ReportEntry,
        Result, DEFAULT_SENSITIVITY,
    };
}
