//! Constant-vs-measurement consistency checks.
//!
//! A Tydex run declares nominal test conditions in `**CONSTANTS` (wheel
//! load, slip angle, inclination, pressure) and usually records the same
//! quantities as channels. This module compares the mean measured value of
//! each such channel with its nominal constant.

use crate::constants::tolerances;
use crate::models::TydexDocument;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Allowed mean deviation per constant name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToleranceTable {
    limits: BTreeMap<String, f64>,
}

impl Default for ToleranceTable {
    fn default() -> Self {
        Self {
            limits: tolerances::DEFAULTS
                .iter()
                .map(|(name, limit)| (name.to_string(), *limit))
                .collect(),
        }
    }
}

impl ToleranceTable {
    /// A table with no limits; deviations are reported but never flagged
    pub fn empty() -> Self {
        Self {
            limits: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, name: impl Into<String>, limit: f64) -> Self {
        self.limits.insert(name.into(), limit);
        self
    }

    pub fn limit(&self, name: &str) -> Option<f64> {
        self.limits.get(name).copied()
    }
}

/// Mean deviation of one channel from its nominal constant
///
/// Flagged when the magnitude of the mean deviation exceeds the tolerance,
/// so readings below nominal are caught as well as readings above it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantDeviation {
    pub name: String,
    pub nominal: f64,
    /// Mean of (measured - nominal)
    pub mean_difference: f64,
    pub tolerance: Option<f64>,
    pub sample_count: usize,
}

impl ConstantDeviation {
    pub fn exceeds_tolerance(&self) -> bool {
        self.tolerance
            .is_some_and(|limit| self.mean_difference.abs() > limit)
    }
}

/// Deviations found in one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub source: Option<PathBuf>,
    pub deviations: Vec<ConstantDeviation>,
}

impl VerificationReport {
    /// Deviations outside their tolerance
    pub fn flagged(&self) -> impl Iterator<Item = &ConstantDeviation> {
        self.deviations.iter().filter(|d| d.exceeds_tolerance())
    }

    pub fn is_clean(&self) -> bool {
        self.flagged().next().is_none()
    }
}

/// Compare every constant that is also a channel against the measured data
pub fn verify_constants(doc: &TydexDocument, table: &ToleranceTable) -> VerificationReport {
    let mut deviations = Vec::new();

    for constant in doc.constants() {
        let Ok(values) = doc.get_channel(&constant.name) else {
            continue;
        };
        if values.is_empty() {
            debug!("Channel {} has no samples; skipping", constant.name);
            continue;
        }

        let nominal = constant.numeric_value();
        let mean_difference =
            values.iter().map(|v| v - nominal).sum::<f64>() / values.len() as f64;

        let deviation = ConstantDeviation {
            name: constant.name.clone(),
            nominal,
            mean_difference,
            tolerance: table.limit(&constant.name),
            sample_count: values.len(),
        };

        if let (true, Some(limit)) = (deviation.exceeds_tolerance(), deviation.tolerance) {
            let file = doc
                .source()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "<input>".to_string());
            warn!(
                "{}: {:10} does not match within {} (err={:.1}), nominal = {}",
                file, deviation.name, limit, deviation.mean_difference, constant.value
            );
        }

        deviations.push(deviation);
    }

    VerificationReport {
        source: doc.source().map(|p| p.to_path_buf()),
        deviations,
    }
}
