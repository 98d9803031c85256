//! Differentially private reach reports.
//!
//! Facade over the workspace crates plus the configuration and driver used by
//! the `noisy-reach` binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod report;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use reach_privacy_core as core;
pub use reach_privacy_prng as prng;

pub use config::{EntryConfig, ReportConfig, DEFAULT_DELTA, DEFAULT_EPSILON};
pub use core::{
    add_gaussian_noise, add_laplace_noise, add_noise, compute_sigma, laplace_scale,
    privatize_report, DpError, GaussianMechanism, LaplaceMechanism, MechanismKind,
    NoiseMechanism, NoisyReport, NoisyReportEntry, PrivacyParams, ReachReport, ReportEntry,
    Result, DEFAULT_SENSITIVITY,
};
pub use prng::{NoiseKey, NoiseRng};
pub use report::{run_report, trial_key};

/// Convenience prelude covering the common building blocks.
pub mod prelude {
    pub use crate::config::{EntryConfig, ReportConfig};
    pub use crate::report::{run_report, trial_key};
    pub use reach_privacy_core::prelude::*;
    pub use reach_privacy_prng::prelude::*;
}
