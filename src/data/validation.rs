use std::collections::BTreeSet;

use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};

use super::model::{Group, Signal, Table};

// ---------------------------------------------------------------------------
// Signal collections
// ---------------------------------------------------------------------------

/// Validate a collection of signals.  All-or-nothing: the first violation
/// is returned.
///
/// Per signal, in order:
/// * name not seen before
/// * at least one sample, every sample finite
/// * sampling period positive and finite
/// * same time unit as the first signal
pub fn signals_validation(signals: &[Signal]) -> Result<()> {
    let first = signals.first().ok_or(DatasetError::EmptyInput)?;

    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for sig in signals {
        if !seen.insert(sig.name.as_str()) {
            return Err(DatasetError::DuplicateName(sig.name.clone()));
        }
        if sig.values.is_empty() {
            return Err(DatasetError::InvalidValues {
                name: sig.name.clone(),
                index: 0,
                value: f64::NAN,
            });
        }
        if let Some((index, &value)) = sig.values.iter().enumerate().find(|(_, v)| !v.is_finite())
        {
            return Err(DatasetError::InvalidValues {
                name: sig.name.clone(),
                index,
                value,
            });
        }
        validate_period(&sig.name, sig.sampling_period)?;
        if sig.time_unit != first.time_unit {
            return Err(DatasetError::InconsistentTimeUnit {
                name: sig.name.clone(),
                expected: first.time_unit.clone(),
                found: sig.time_unit.clone(),
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_period(name: &str, period: f64) -> Result<()> {
    if period.is_finite() && period > 0.0 {
        Ok(())
    } else {
        Err(DatasetError::InvalidSamplingPeriod {
            name: name.to_string(),
            period,
        })
    }
}

// ---------------------------------------------------------------------------
// Tabular input
// ---------------------------------------------------------------------------

fn malformed(msg: impl Into<String>) -> DatasetError {
    DatasetError::MalformedTable(msg.into())
}

/// Validate an externally supplied table.  The index must already be
/// uniform; nothing is resampled here.
///
/// `NaN` samples are accepted (missing data); infinities are not.
pub fn dataframe_validation(table: &Table, config: &DatasetConfig) -> Result<()> {
    let n = table.time.len();
    if n < 2 {
        return Err(malformed(format!(
            "index has {n} row(s); at least 2 are needed to infer the sampling period"
        )));
    }
    if let Some(i) = table.time.iter().position(|t| !t.is_finite()) {
        return Err(malformed(format!("index entry {i} is not a finite timestamp")));
    }

    let step = table.time[1] - table.time[0];
    for (i, pair) in table.time.windows(2).enumerate() {
        let dt = pair[1] - pair[0];
        if dt <= 0.0 {
            return Err(malformed(format!(
                "index is not strictly increasing at row {}",
                i + 1
            )));
        }
        if !config.same_period(dt, step) {
            return Err(malformed(format!(
                "index is not evenly spaced at row {} (step {dt}, expected {step})",
                i + 1
            )));
        }
    }

    let mut names: BTreeSet<&str> = BTreeSet::new();
    for col in &table.columns {
        if col.id.name.is_empty() {
            return Err(malformed("column with an empty signal name"));
        }
        if !names.insert(col.id.name.as_str()) {
            return Err(malformed(format!("duplicate column '{}'", col.id.name)));
        }
        if col.values.len() != n {
            return Err(malformed(format!(
                "column '{}' has {} rows, index has {n}",
                col.id.name,
                col.values.len()
            )));
        }
        if let Some(i) = col.values.iter().position(|v| v.is_infinite()) {
            return Err(malformed(format!(
                "column '{}' holds an infinite value at row {i}",
                col.id.name
            )));
        }
    }

    for group in [Group::Input, Group::Output] {
        if table.group(group).next().is_none() {
            return Err(malformed(format!("no columns labelled {group}")));
        }
    }
    Ok(())
}
