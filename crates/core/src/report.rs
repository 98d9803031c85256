//! Reach reports and their noisy counterparts.

use std::fmt;

use rand::Rng;

use crate::error::{DpError, Result};
use crate::noise::{MechanismKind, NoiseMechanism};

/// One labelled count of a reach report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    /// Segment label, e.g. platform and demographic.
    pub label: String,
    /// True unique reach.
    pub true_value: i64,
}

/// Ordered mapping of segment labels to true reach counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachReport {
    entries: Vec<ReportEntry>,
}

impl ReachReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a report from `(label, value)` pairs, keeping their order.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut report = Self::new();
        for (label, value) in pairs {
            report.push(label, value)?;
        }
        Ok(report)
    }

    /// The three-segment reference report.
    pub fn sample() -> Self {
        Self {
            entries: [
                ("YouTube_M_25-34", 1200),
                ("Facebook_F_18-24", 950),
                ("Instagram_All_35-44", 670),
            ]
            .into_iter()
            .map(|(label, true_value)| ReportEntry {
                label: label.to_owned(),
                true_value,
            })
            .collect(),
        }
    }

    /// Append an entry. Labels must be unique.
    pub fn push<S: Into<String>>(&mut self, label: S, value: i64) -> Result<()> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(DpError::invalid("report labels must not be empty"));
        }
        if self.get(&label).is_some() {
            return Err(DpError::invalid(format!("duplicate report label `{label}`")));
        }
        self.entries.push(ReportEntry {
            label,
            true_value: value,
        });
        Ok(())
    }

    /// True value for `label`.
    pub fn get(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.true_value)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One entry of a privatised report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoisyReportEntry {
    /// Segment label.
    pub label: String,
    /// Value before noise.
    pub true_value: i64,
    /// Noisy value rounded to the nearest integer.
    pub noisy_value: i64,
}

/// A reach report with noise applied to every entry.
#[derive(Clone, Debug, PartialEq)]
pub struct NoisyReport {
    entries: Vec<NoisyReportEntry>,
    mechanism: MechanismKind,
    scale: f64,
}

impl NoisyReport {
    /// Noisy value for `label`.
    pub fn get(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.noisy_value)
    }

    /// Entries in the order of the source report.
    pub fn iter(&self) -> impl Iterator<Item = &NoisyReportEntry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mechanism that produced the noise.
    pub fn mechanism(&self) -> MechanismKind {
        self.mechanism
    }

    /// Noise scale used for every entry.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl fmt::Display for NoisyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(f, "{}: {} ➜ {}", e.label, e.true_value, e.noisy_value)?;
        }
        Ok(())
    }
}

/// Apply `mechanism` to every entry of `report`, in order.
///
/// Each entry consumes fresh draws from `rng`; noisy values are rounded half
/// to even. Fails with [`DpError::Numerical`] when a noisy value is not
/// finite or does not fit in an `i64`; no partial report is returned.
pub fn privatize_report<R: Rng>(
    report: &ReachReport,
    mechanism: &NoiseMechanism,
    rng: &mut R,
) -> Result<NoisyReport> {
    let entries = report
        .iter()
        .map(|e| {
            let noisy = mechanism.apply(e.true_value as f64, rng);
            Ok(NoisyReportEntry {
                label: e.label.clone(),
                true_value: e.true_value,
                noisy_value: round_to_i64(&e.label, noisy)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        mechanism = %mechanism.kind(),
        scale = mechanism.scale(),
        entries = entries.len(),
        "report privatized"
    );

    Ok(NoisyReport {
        entries,
        mechanism: mechanism.kind(),
        scale: mechanism.scale(),
    })
}

fn round_to_i64(label: &str, value: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let rounded = value.round_ties_even();
    if !rounded.is_finite() || rounded < -LIMIT || rounded >= LIMIT {
        return Err(DpError::numerical(format!(
            "noisy value {value} for `{label}` does not fit in an i64"
        )));
    }
    Ok(rounded as i64)
}
