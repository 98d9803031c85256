//! Command-line arguments of the `noisy-reach` binary.

use std::path::PathBuf;

use clap::Parser;

use reach_privacy_core::{MechanismKind, Result};

use crate::config::{EntryConfig, ReportConfig};

/// Print a reach report with differentially private noise applied.
#[derive(Clone, Debug, Parser)]
#[command(name = "noisy-reach")]
#[command(about = "Add calibrated Gaussian or Laplace noise to a reach report")]
#[command(version)]
pub struct Cli {
    /// TOML config file; flags below override its values
    #[arg(long, env = "NOISY_REACH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Privacy loss bound (epsilon > 0)
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Failure probability, 0 < delta < 1 (gaussian only)
    #[arg(long)]
    pub delta: Option<f64>,

    /// Sensitivity of each count
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Noise mechanism: gaussian or laplace
    #[arg(long, value_parser = parse_mechanism)]
    pub mechanism: Option<MechanismKind>,

    /// Explicit Gaussian standard deviation
    #[arg(long)]
    pub sigma: Option<f64>,

    /// Explicit Laplace scale
    #[arg(long)]
    pub scale: Option<f64>,

    /// Seed for reproducible noise
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of independent privatisations to print
    #[arg(long)]
    pub trials: Option<usize>,

    /// Report entry as LABEL=VALUE; repeat to build the report
    #[arg(long = "entry", value_parser = parse_entry)]
    pub entries: Vec<EntryConfig>,
}

fn parse_mechanism(s: &str) -> Result<MechanismKind> {
    s.parse()
}

fn parse_entry(s: &str) -> Result<EntryConfig> {
    EntryConfig::parse(s)
}

impl Cli {
    /// Merge the config file (or defaults) with command-line overrides.
    pub fn resolve(&self) -> Result<ReportConfig> {
        let mut cfg = match &self.config {
            Some(path) => ReportConfig::load(path)?,
            None => ReportConfig::default(),
        };
        if let Some(v) = self.epsilon {
            cfg.epsilon = v;
        }
        if self.delta.is_some() {
            cfg.delta = self.delta;
        }
        if let Some(v) = self.sensitivity {
            cfg.sensitivity = v;
        }
        if let Some(v) = self.mechanism {
            cfg.mechanism = v;
        }
        if self.sigma.is_some() {
            cfg.sigma = self.sigma;
        }
        if self.scale.is_some() {
            cfg.scale = self.scale;
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(v) = self.trials {
            cfg.trials = v;
        }
        if !self.entries.is_empty() {
            cfg.entries = self.entries.clone();
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
