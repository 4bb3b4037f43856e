use std::fmt;

use serde::{Deserialize, Serialize};

use super::dataset::Dataset;
use super::model::{ColumnId, Group};

/// Relative tolerance used for the structural time-grid checks.
const GRID_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// `|a - b| <= tol`
    Absolute(f64),
    /// `|a - b| <= tol * max(|a|, |b|)`
    Relative(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Absolute(0.0)
    }
}

impl Tolerance {
    /// Two missing samples are equal; a missing and a present one are not.
    pub fn accepts(self, a: f64, b: f64) -> bool {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => return true,
            (false, false) => {}
            _ => return false,
        }
        let diff = (a - b).abs();
        match self {
            Tolerance::Absolute(tol) => diff <= tol,
            Tolerance::Relative(tol) => diff <= tol * a.abs().max(b.abs()),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructuralDiff {
    OnlyInLeft(ColumnId),
    OnlyInRight(ColumnId),
    GroupMismatch { name: String, left: Group, right: Group },
    UnitMismatch { name: String, left: String, right: String },
    TimeUnit { left: String, right: String },
    RowCount { left: usize, right: usize },
    SamplingPeriod { left: f64, right: f64 },
    StartTime { left: f64, right: f64 },
}

/// First sample where the two datasets disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Divergence {
    pub signal: String,
    pub row: usize,
    pub time: f64,
    pub left: f64,
    pub right: f64,
    /// `|left - right|`, infinite when only one side is missing.
    pub magnitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub structural: Vec<StructuralDiff>,
    pub first_divergence: Option<Divergence>,
    /// Number of samples outside tolerance.
    pub diverging_samples: usize,
}

impl DiffReport {
    pub fn is_match(&self) -> bool {
        self.structural.is_empty() && self.first_divergence.is_none()
    }
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_match() {
            return write!(f, "datasets match");
        }
        for diff in &self.structural {
            writeln!(f, "structure: {diff:?}")?;
        }
        if let Some(d) = &self.first_divergence {
            writeln!(
                f,
                "values: {} sample(s) differ; first at '{}' row {} (t = {}): {} vs {} (|diff| = {})",
                self.diverging_samples, d.signal, d.row, d.time, d.left, d.right, d.magnitude
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compare two datasets.  A mismatch is a normal result, never an error.
///
/// Values are compared per signal name, row by row, only when both datasets
/// have the same number of rows.
pub fn compare_datasets(a: &Dataset, b: &Dataset, tolerance: Tolerance) -> DiffReport {
    let mut report = DiffReport::default();
    let (ta, tb) = (a.table(), b.table());

    // -- structure --
    for col in &ta.columns {
        match tb.column(&col.id.name) {
            None => report.structural.push(StructuralDiff::OnlyInLeft(col.id.clone())),
            Some(other) => {
                if other.id.group != col.id.group {
                    report.structural.push(StructuralDiff::GroupMismatch {
                        name: col.id.name.clone(),
                        left: col.id.group,
                        right: other.id.group,
                    });
                }
                if other.id.unit != col.id.unit {
                    report.structural.push(StructuralDiff::UnitMismatch {
                        name: col.id.name.clone(),
                        left: col.id.unit.clone(),
                        right: other.id.unit.clone(),
                    });
                }
            }
        }
    }
    for col in &tb.columns {
        if ta.column(&col.id.name).is_none() {
            report.structural.push(StructuralDiff::OnlyInRight(col.id.clone()));
        }
    }
    if ta.time_unit != tb.time_unit {
        report.structural.push(StructuralDiff::TimeUnit {
            left: ta.time_unit.clone(),
            right: tb.time_unit.clone(),
        });
    }
    if ta.len() != tb.len() {
        report.structural.push(StructuralDiff::RowCount {
            left: ta.len(),
            right: tb.len(),
        });
    }
    let (pa, pb) = (a.sampling_period(), b.sampling_period());
    if (pa - pb).abs() > GRID_TOLERANCE * pa.max(pb) {
        report
            .structural
            .push(StructuralDiff::SamplingPeriod { left: pa, right: pb });
    }
    if let (Some(&sa), Some(&sb)) = (ta.time.first(), tb.time.first()) {
        if (sa - sb).abs() > GRID_TOLERANCE * pa.max(pb) {
            report
                .structural
                .push(StructuralDiff::StartTime { left: sa, right: sb });
        }
    }

    if ta.len() != tb.len() {
        return report;
    }

    // -- values, row-major so the first divergence is the earliest in time --
    let pairs: Vec<_> = ta
        .columns
        .iter()
        .filter_map(|ca| tb.column(&ca.id.name).map(|cb| (ca, cb)))
        .collect();
    for row in 0..ta.len() {
        for (ca, cb) in &pairs {
            let (l, r) = (ca.values[row], cb.values[row]);
            if tolerance.accepts(l, r) {
                continue;
            }
            report.diverging_samples += 1;
            if report.first_divergence.is_none() {
                let magnitude = if l.is_nan() || r.is_nan() {
                    f64::INFINITY
                } else {
                    (l - r).abs()
                };
                report.first_divergence = Some(Divergence {
                    signal: ca.id.name.clone(),
                    row,
                    time: ta.time[row],
                    left: l,
                    right: r,
                    magnitude,
                });
            }
        }
    }
    report
}

/// Quick pass/fail form of [`compare_datasets`].
pub fn datasets_match(a: &Dataset, b: &Dataset, tolerance: Tolerance) -> bool {
    compare_datasets(a, b, tolerance).is_match()
}
