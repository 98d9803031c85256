//! Report configuration, loadable from TOML.
//!
//! ```toml
//! epsilon = 0.5
//! delta = 1e-5
//! sensitivity = 1.0
//! mechanism = "gaussian"
//! seed = 42
//! trials = 1
//!
//! [[entries]]
//! label = "YouTube_M_25-34"
//! value = 1200
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use reach_privacy_core::{
    DpError, GaussianMechanism, LaplaceMechanism, MechanismKind, NoiseMechanism, PrivacyParams,
    ReachReport, Result, DEFAULT_SENSITIVITY,
};

/// Default privacy loss bound for reach reports.
pub const DEFAULT_EPSILON: f64 = 0.5;
/// Default failure probability for the Gaussian mechanism.
pub const DEFAULT_DELTA: f64 = 1e-5;

/// One labelled count in a configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    /// Segment label.
    pub label: String,
    /// True reach.
    pub value: i64,
}

impl EntryConfig {
    /// Parse a `LABEL=VALUE` pair.
    pub fn parse(s: &str) -> Result<Self> {
        let (label, value) = s.rsplit_once('=').ok_or_else(|| {
            DpError::config(format!("entry `{s}` is not of the form LABEL=VALUE"))
        })?;
        let label = label.trim();
        if label.is_empty() {
            return Err(DpError::config(format!("entry `{s}` has an empty label")));
        }
        let value = value
            .trim()
            .parse::<i64>()
            .map_err(|e| DpError::config(format!("entry `{s}`: {e}")))?;
        Ok(Self {
            label: label.to_owned(),
            value,
        })
    }
}

/// Parameters of a noisy reach report run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Privacy loss bound.
    pub epsilon: f64,
    /// Failure probability; Gaussian only, [`DEFAULT_DELTA`] when absent.
    pub delta: Option<f64>,
    /// Sensitivity of each count.
    pub sensitivity: f64,
    /// Noise mechanism.
    pub mechanism: MechanismKind,
    /// Explicit Gaussian standard deviation, bypassing calibration.
    pub sigma: Option<f64>,
    /// Explicit Laplace scale, bypassing calibration.
    pub scale: Option<f64>,
    /// Seed of the root noise key; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Number of independent privatisations of the report.
    pub trials: usize,
    /// Report entries in output order.
    pub entries: Vec<EntryConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            delta: None,
            sensitivity: DEFAULT_SENSITIVITY,
            mechanism: MechanismKind::Gaussian,
            sigma: None,
            scale: None,
            seed: None,
            trials: 1,
            entries: ReachReport::sample()
                .iter()
                .map(|e| EntryConfig {
                    label: e.label.clone(),
                    value: e.true_value,
                })
                .collect(),
        }
    }
}

impl ReportConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DpError::config(format!("failed to parse config: {e}")))
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DpError::config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DpError::config(format!("failed to serialize config: {e}")))
    }

    /// Check the whole configuration without drawing any noise.
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(DpError::config("trials must be at least 1"));
        }
        if self.entries.is_empty() {
            return Err(DpError::config("report must contain at least one entry"));
        }
        self.mechanism()?;
        self.report()?;
        Ok(())
    }

    /// Build the configured noise mechanism.
    pub fn mechanism(&self) -> Result<NoiseMechanism> {
        match self.mechanism {
            MechanismKind::Gaussian => {
                if self.scale.is_some() {
                    return Err(DpError::config(
                        "`scale` applies to the laplace mechanism only",
                    ));
                }
                let delta = self.delta.unwrap_or(DEFAULT_DELTA);
                let params = PrivacyParams::new(self.epsilon, delta, self.sensitivity)?;
                let mut m = GaussianMechanism::new(params);
                if let Some(sigma) = self.sigma {
                    m = m.with_sigma(sigma)?;
                }
                Ok(m.into())
            }
            MechanismKind::Laplace => {
                if self.sigma.is_some() {
                    return Err(DpError::config(
                        "`sigma` applies to the gaussian mechanism only",
                    ));
                }
                if self.delta.is_some() {
                    return Err(DpError::config(
                        "`delta` applies to the gaussian mechanism only",
                    ));
                }
                let mut m = LaplaceMechanism::new(self.epsilon, self.sensitivity)?;
                if let Some(scale) = self.scale {
                    m = m.with_scale(scale)?;
                }
                Ok(m.into())
            }
        }
    }

    /// Failure probability in effect, or `None` for the Laplace mechanism.
    pub fn effective_delta(&self) -> Option<f64> {
        match self.mechanism {
            MechanismKind::Gaussian => Some(self.delta.unwrap_or(DEFAULT_DELTA)),
            MechanismKind::Laplace => None,
        }
    }

    /// Build the report from the configured entries.
    pub fn report(&self) -> Result<ReachReport> {
        ReachReport::from_pairs(self.entries.iter().map(|e| (e.label.clone(), e.value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_reproduce_reference_run() {
        let cfg = ReportConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.epsilon, 0.5);
        assert_eq!(cfg.effective_delta(), Some(1e-5));
        assert_eq!(cfg.sensitivity, 1.0);
        assert_eq!(cfg.report().unwrap(), ReachReport::sample());
    }

    #[test]
    fn toml_round_trip() {
        let mut cfg = ReportConfig::default();
        cfg.seed = Some(42);
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(ReportConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = ReportConfig::from_toml_str(
            r#"
            epsilon = 1.0
            mechanism = "laplace"

            [[entries]]
            label = "A"
            value = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.epsilon, 1.0);
        assert_eq!(cfg.delta, None);
        assert_eq!(cfg.effective_delta(), None);
        assert_eq!(cfg.mechanism, MechanismKind::Laplace);
        assert_eq!(cfg.entries.len(), 1);
        assert_eq!(cfg.mechanism().unwrap().scale(), 1.0);
    }

    #[test]
    fn unknown_keys_and_mechanisms_are_rejected() {
        assert!(ReportConfig::from_toml_str("epsilonn = 1.0").is_err());
        assert!(ReportConfig::from_toml_str("mechanism = \"exponential\"").is_err());
    }

    #[test]
    fn validation_catches_bad_parameters() {
        let mut cfg = ReportConfig::default();
        cfg.delta = Some(0.0);
        assert!(cfg.validate().unwrap_err().is_invalid_parameter());

        let mut cfg = ReportConfig::default();
        cfg.trials = 0;
        assert!(matches!(cfg.validate(), Err(DpError::Config { .. })));

        let mut cfg = ReportConfig::default();
        cfg.entries.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn overrides_must_match_mechanism() {
        let mut cfg = ReportConfig::default();
        cfg.scale = Some(2.0);
        assert!(cfg.mechanism().is_err());

        cfg.scale = None;
        cfg.sigma = Some(3.0);
        assert_eq!(cfg.mechanism().unwrap().scale(), 3.0);

        cfg.mechanism = MechanismKind::Laplace;
        assert!(cfg.mechanism().is_err());
    }

    #[test]
    fn delta_is_rejected_for_laplace() {
        let mut cfg = ReportConfig::default();
        cfg.mechanism = MechanismKind::Laplace;
        cfg.delta = Some(5.0);
        assert!(matches!(cfg.validate(), Err(DpError::Config { .. })));

        cfg.delta = Some(1e-5);
        assert!(matches!(cfg.mechanism(), Err(DpError::Config { .. })));

        cfg.delta = None;
        assert_eq!(cfg.mechanism().unwrap().kind(), MechanismKind::Laplace);

        let text = "mechanism = \"laplace\"\ndelta = 1e-5\n";
        assert!(ReportConfig::from_toml_str(text).unwrap().validate().is_err());
    }

    #[test]
    fn entry_parsing() {
        assert_eq!(
            EntryConfig::parse("YouTube_M_25-34=1200").unwrap(),
            EntryConfig {
                label: "YouTube_M_25-34".into(),
                value: 1200
            }
        );
        assert_eq!(EntryConfig::parse("a=b=-3").unwrap().label, "a=b");
        assert!(EntryConfig::parse("noequals").is_err());
        assert!(EntryConfig::parse("=5").is_err());
        assert!(EntryConfig::parse("A=five").is_err());
    }

    proptest! {
        #[test]
        fn entry_parse_recovers_label_and_value(
            label in "[A-Za-z][A-Za-z0-9_ -]{0,24}[A-Za-z0-9]",
            value in any::<i64>(),
        ) {
            let parsed = EntryConfig::parse(&format!("{label}={value}")).unwrap();
            prop_assert_eq!(parsed.label, label);
            prop_assert_eq!(parsed.value, value);
        }
    }
}
