use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::model::Table;

// ---------------------------------------------------------------------------
// Per-signal operating envelope
// ---------------------------------------------------------------------------

/// Summary statistics of one signal over the dataset's time range.
/// Missing samples are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalCoverage {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample variance (N - 1 denominator).
    pub variance: f64,
}

impl SignalCoverage {
    /// Statistics of the non-`NaN` samples; all `NaN` when there are none.
    pub fn from_values(values: &[f64]) -> Self {
        let mut count = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &v in values.iter().filter(|v| !v.is_nan()) {
            count += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        if count == 0 {
            return Self {
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                variance: f64::NAN,
            };
        }

        let mean = sum / count as f64;
        let variance = if count > 1 {
            values
                .iter()
                .filter(|v| !v.is_nan())
                .map(|v| (v - mean).powi(2))
                .sum::<f64>()
                / (count - 1) as f64
        } else {
            0.0
        };
        Self {
            min,
            max,
            mean,
            variance,
        }
    }

    /// Whether `value` lies inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Coverage of every signal in a dataset, keyed by signal name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    signals: BTreeMap<String, SignalCoverage>,
}

impl Coverage {
    pub fn get(&self, name: &str) -> Option<&SignalCoverage> {
        self.signals.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalCoverage)> {
        self.signals.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Analyzer entry points – pure functions of the table
// ---------------------------------------------------------------------------

pub fn compute_coverage(table: &Table) -> Coverage {
    let signals = table
        .columns
        .iter()
        .map(|c| (c.id.name.clone(), SignalCoverage::from_values(&c.values)))
        .collect();
    Coverage { signals }
}

/// Fraction of non-missing samples over the whole table, in `[0, 1]`.
/// An empty table has no information.
pub fn information_level(table: &Table) -> f64 {
    let total: usize = table.columns.iter().map(|c| c.values.len()).sum();
    if total == 0 {
        return 0.0;
    }
    let valid = table
        .columns
        .iter()
        .flat_map(|c| c.values.iter())
        .filter(|v| !v.is_nan())
        .count();
    valid as f64 / total as f64
}
