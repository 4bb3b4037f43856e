use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::utils::difference;

use super::dataset::{check_groups, Dataset};
use super::filter::zero_phase_lowpass;
use super::model::{Column, ColumnId, Group, Signal};
use super::sampling::SNAP;
use super::validation::signals_validation;

/// How [`Dataset::replace_nans`] treats missing samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NanMethod {
    /// Linear interpolation (in time) between the nearest valid samples;
    /// gaps at either end take the nearest valid sample.
    Interpolate,
    /// Forward fill, then backward fill for a leading gap.
    Fill,
    /// Drop every row holding a missing sample.
    Remove,
}

// ---------------------------------------------------------------------------
// Copy-on-write manipulation: `&self` in, new Dataset out
// ---------------------------------------------------------------------------

impl Dataset {
    /// Subtract from each signal its mean over the whole time range.
    pub fn remove_means(&self) -> Dataset {
        let mut table = self.table().clone();
        for col in &mut table.columns {
            if let Some(cov) = self.coverage().get(&col.id.name) {
                let mean = cov.mean;
                if mean.is_nan() {
                    continue;
                }
                col.values.iter_mut().for_each(|v| *v -= mean);
            }
        }
        self.derive(table)
    }

    /// Subtract constant offsets from the named signals.
    pub fn remove_offset(&self, offsets: &BTreeMap<String, f64>) -> Result<Dataset> {
        self.check_known(offsets.keys().map(String::as_str))?;
        if let Some((name, &value)) = offsets.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DatasetError::InvalidValues {
                name: name.clone(),
                index: 0,
                value,
            });
        }

        let mut table = self.table().clone();
        for col in &mut table.columns {
            if let Some(&offset) = offsets.get(&col.id.name) {
                col.values.iter_mut().for_each(|v| *v -= offset);
            }
        }
        Ok(self.derive(table))
    }

    /// Zero-phase low-pass filter of the named signals; `cutoffs` maps a
    /// signal name to a cutoff frequency in cycles per time unit.
    pub fn low_pass_filter(&self, cutoffs: &BTreeMap<String, f64>) -> Result<Dataset> {
        self.check_known(cutoffs.keys().map(String::as_str))?;

        let sample_rate = 1.0 / self.sampling_period();
        let nyquist = 0.5 * sample_rate;
        for (name, &cutoff) in cutoffs {
            // NaN fails both comparisons
            if !(cutoff > 0.0 && cutoff < nyquist) {
                return Err(DatasetError::InvalidCutoff {
                    name: name.clone(),
                    cutoff,
                    nyquist,
                });
            }
        }

        let sections = self.config().filter_sections;
        let mut table = self.table().clone();
        for col in &mut table.columns {
            if let Some(&cutoff) = cutoffs.get(&col.id.name) {
                debug!(
                    "low-pass '{}' at {cutoff} (Nyquist {nyquist}, {sections} section(s))",
                    col.id.name
                );
                col.values = zero_phase_lowpass(&col.values, cutoff, sample_rate, sections);
            }
        }
        Ok(self.derive(table))
    }

    /// Fill or drop missing samples.
    pub fn replace_nans(&self, method: NanMethod) -> Result<Dataset> {
        let mut table = self.table().clone();
        match method {
            NanMethod::Interpolate | NanMethod::Fill => {
                for col in &mut table.columns {
                    if col.values.iter().all(|v| v.is_nan()) {
                        warn!("signal '{}' has no valid samples to fill from", col.id.name);
                        continue;
                    }
                    if method == NanMethod::Interpolate {
                        interpolate_gaps(&table.time, &mut col.values);
                    } else {
                        fill_gaps(&mut col.values);
                    }
                }
            }
            NanMethod::Remove => {
                let keep: Vec<bool> = (0..table.len())
                    .map(|row| table.columns.iter().all(|c| !c.values[row].is_nan()))
                    .collect();
                let kept = keep.iter().filter(|k| **k).count();
                if kept == 0 {
                    return Err(DatasetError::EmptyDataset);
                }
                if kept < table.len() {
                    warn!(
                        "dataset '{}': dropping {} row(s) with missing samples",
                        self.name(),
                        table.len() - kept
                    );
                }
                table.retain_rows(&keep);
                // an interior gap breaks the even spacing: repack the rows
                // onto the grid anchored at the first kept timestamp
                let contiguous = keep
                    .iter()
                    .skip_while(|k| !**k)
                    .skip_while(|k| **k)
                    .all(|k| !*k);
                if !contiguous {
                    warn!(
                        "dataset '{}': interior rows dropped, later samples re-indexed onto a uniform grid",
                        self.name()
                    );
                    let start = table.time[0];
                    let period = self.sampling_period();
                    table.time = (0..kept).map(|k| start + k as f64 * period).collect();
                }
            }
        }
        Ok(self.derive(table))
    }

    /// Keep the rows with timestamps in `[t_start, t_end]`.
    pub fn trim(&self, t_start: f64, t_end: f64) -> Result<Dataset> {
        let eps = SNAP * self.sampling_period();
        let keep: Vec<bool> = self
            .time()
            .iter()
            .map(|&t| t >= t_start - eps && t <= t_end + eps)
            .collect();
        if !keep.iter().any(|k| *k) {
            return Err(DatasetError::EmptyDataset);
        }
        let mut table = self.table().clone();
        table.retain_rows(&keep);
        Ok(self.derive(table))
    }

    /// Drop the named signals.  Each group must keep at least one signal.
    pub fn remove_signals(&self, names: &[&str]) -> Result<Dataset> {
        self.check_known(names.iter().copied())?;
        let mut table = self.table().clone();
        table.columns.retain(|c| !names.iter().any(|n| *n == c.id.name));
        check_groups(table.columns.iter().map(|c| c.id.group))?;
        Ok(self.derive(table))
    }

    /// Add new signals to `group`.
    ///
    /// The dataset's own time index is the reference: the new signals are
    /// sampled at its timestamps, and rows outside the span covered by every
    /// new signal are dropped.  Existing values are not touched.
    pub fn add_signals(&self, signals: Vec<Signal>, group: Group) -> Result<Dataset> {
        signals_validation(&signals)?;
        for sig in &signals {
            if self.table().column(&sig.name).is_some() {
                return Err(DatasetError::DuplicateName(sig.name.clone()));
            }
            if sig.time_unit != self.time_unit() {
                return Err(DatasetError::InconsistentTimeUnit {
                    name: sig.name.clone(),
                    expected: self.time_unit().to_string(),
                    found: sig.time_unit.clone(),
                });
            }
        }
        let start = signals
            .iter()
            .map(|s| s.start_time)
            .fold(f64::NEG_INFINITY, f64::max);
        let end = signals
            .iter()
            .map(Signal::end_time)
            .fold(f64::INFINITY, f64::min);

        let eps = SNAP * self.sampling_period();
        let keep: Vec<bool> = self
            .time()
            .iter()
            .map(|&t| t >= start - eps && t <= end + eps)
            .collect();
        let kept = keep.iter().filter(|k| **k).count();
        if kept == 0 {
            return Err(DatasetError::EmptyIntersection { start, end });
        }
        let dropped = 1.0 - kept as f64 / self.len() as f64;
        if dropped > self.config().truncation_warn_fraction {
            warn!(
                "dataset '{}': adding signals discards {:.0}% of its rows",
                self.name(),
                dropped * 100.0
            );
        }

        let mut table = self.table().clone();
        table.retain_rows(&keep);
        let kernel = self.config().interpolation;
        for sig in signals {
            let values = table
                .time
                .iter()
                .map(|&t| kernel.sample(&sig.values, sig.start_time, sig.sampling_period, t))
                .collect();
            debug!("added '{}' to {group} on {kept} row(s)", sig.name);
            table.columns.push(Column {
                id: ColumnId::new(group, sig.name, sig.signal_unit),
                values,
            });
        }
        Ok(self.derive(table))
    }

    fn check_known<'a>(&'a self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let present = self.table().columns.iter().map(|c| c.id.name.as_str());
        match difference(names, present).first() {
            Some(name) => Err(DatasetError::UnknownSignal(name.to_string())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Gap filling (linear in the number of samples)
// ---------------------------------------------------------------------------

fn interpolate_gaps(time: &[f64], values: &mut [f64]) {
    let n = values.len();
    let mut prev: Option<usize> = None;
    let mut i = 0;
    while i < n {
        if !values[i].is_nan() {
            prev = Some(i);
            i += 1;
            continue;
        }
        let gap_start = i;
        while i < n && values[i].is_nan() {
            i += 1;
        }
        let next = (i < n).then_some(i);
        for j in gap_start..i {
            values[j] = match (prev, next) {
                (Some(p), Some(q)) => {
                    let w = (time[j] - time[p]) / (time[q] - time[p]);
                    values[p] + w * (values[q] - values[p])
                }
                (Some(p), None) => values[p],
                (None, Some(q)) => values[q],
                (None, None) => f64::NAN,
            };
        }
    }
}

fn fill_gaps(values: &mut [f64]) {
    let mut last = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = last;
        } else {
            last = *v;
        }
    }
    if let Some(first_valid) = values.iter().copied().find(|v| !v.is_nan()) {
        for v in values.iter_mut().take_while(|v| v.is_nan()) {
            *v = first_valid;
        }
    }
}
