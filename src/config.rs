use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::sampling::Interpolation;

// ---------------------------------------------------------------------------
// DatasetConfig – explicit knobs threaded through every constructor
// ---------------------------------------------------------------------------

/// Settings that shape how a [`Dataset`](crate::data::dataset::Dataset) is
/// built and manipulated.  Stored in each dataset so derived datasets keep
/// the behaviour of the one they came from.
///
/// ```json
/// {
///   "target_period": 0.01,
///   "interpolation": "linear",
///   "filter_sections": 2,
///   "truncation_warn_fraction": 0.25
/// }
/// ```
///
/// Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Common sampling period for reconciliation.  `None` picks the finest
    /// period among the signals.
    pub target_period: Option<f64>,
    /// Kernel used when a signal is evaluated off its own grid.
    pub interpolation: Interpolation,
    /// Cascaded second-order sections per filter pass.
    pub filter_sections: usize,
    /// Fraction of a signal that alignment may discard before a warning.
    pub truncation_warn_fraction: f64,
    /// Relative tolerance for "same period" / "evenly spaced" decisions.
    pub spacing_tolerance: f64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            target_period: None,
            interpolation: Interpolation::Linear,
            filter_sections: 1,
            truncation_warn_fraction: 0.5,
            spacing_tolerance: 1e-6,
        }
    }
}

impl DatasetConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parsing dataset configuration")
    }

    /// Read a configuration file (JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Two periods are considered equal when they differ by less than the
    /// spacing tolerance relative to the larger one.
    pub fn same_period(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.spacing_tolerance * a.abs().max(b.abs())
    }
}
