//! Drives privatisation of a configured reach report.

use reach_privacy_core::{privatize_report, NoisyReport, Result};
use reach_privacy_prng::NoiseKey;

use crate::config::ReportConfig;

/// Key for trial `trial` under `root`.
///
/// Trials draw from disjoint streams, so the output of one trial does not
/// depend on how many draws earlier trials made.
pub fn trial_key(root: NoiseKey, trial: usize) -> NoiseKey {
    root.fold_in(trial as u64)
}

/// Privatise the configured report `config.trials` times.
///
/// The whole configuration is validated first; on error no noise is drawn.
pub fn run_report(config: &ReportConfig, root: NoiseKey) -> Result<Vec<NoisyReport>> {
    config.validate()?;
    let mechanism = config.mechanism()?;
    let report = config.report()?;

    (0..config.trials)
        .map(|trial| {
            let mut rng = trial_key(root, trial).to_rng();
            let _span = tracing::debug_span!("trial", trial).entered();
            privatize_report(&report, &mechanism, &mut rng)
        })
        .collect()
}
