use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};
use crate::utils::difference;

use super::coverage::{compute_coverage, information_level, Coverage};
use super::model::{Column, ColumnId, Group, Signal, Table};
use super::sampling::{grid_len, reconcile, SNAP};
use super::validation::{dataframe_validation, signals_validation};

// ---------------------------------------------------------------------------
// Dataset – validated, uniformly sampled INPUT/OUTPUT table
// ---------------------------------------------------------------------------

/// A time-aligned table of INPUT and OUTPUT signals plus its coverage.
///
/// Logically immutable: every manipulation returns a new `Dataset`, and
/// every extraction hands out copies.  Sharing one instance between threads
/// is therefore safe.
///
/// Invariants (hold for every successfully built instance):
/// * the time index is strictly increasing with step `sampling_period`
/// * INPUT and OUTPUT groups are both non-empty and disjoint
/// * every column has one value per row
/// * `coverage` and `information_level` describe the current table
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    table: Table,
    sampling_period: f64,
    coverage: Coverage,
    information_level: f64,
    config: DatasetConfig,
}

/// Plain numeric projection of a dataset.  Each inner vector is one signal
/// (column); `input_ids[i]` names `inputs[i]`, likewise for outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetValues {
    pub time: Vec<f64>,
    pub time_unit: String,
    pub sampling_period: f64,
    pub input_ids: Vec<ColumnId>,
    pub inputs: Vec<Vec<f64>>,
    pub output_ids: Vec<ColumnId>,
    pub outputs: Vec<Vec<f64>>,
}

impl Dataset {
    // -- construction --

    /// Build a dataset from raw signals.
    ///
    /// `roles` assigns each wanted signal to INPUT or OUTPUT; signals it
    /// does not mention are left out.  The signals are validated, brought to
    /// a common sampling period, and cut to the time interval they all
    /// cover.
    pub fn from_signals(
        name: impl Into<String>,
        signals: Vec<Signal>,
        roles: &BTreeMap<String, Group>,
        config: &DatasetConfig,
    ) -> Result<Self> {
        signals_validation(&signals)?;

        let unknown = difference(
            roles.keys().map(String::as_str),
            signals.iter().map(|s| s.name.as_str()),
        );
        if let Some(first) = unknown.first() {
            return Err(DatasetError::UnknownSignal(first.to_string()));
        }

        let (groups, signals): (Vec<Group>, Vec<Signal>) = signals
            .into_iter()
            .filter_map(|s| match roles.get(&s.name) {
                Some(g) => Some((*g, s)),
                None => {
                    debug!("signal '{}' has no role, skipped", s.name);
                    None
                }
            })
            .unzip();
        check_groups(groups.iter().copied())?;

        let reference = signals[0].sampling_period;
        let uniform = signals
            .iter()
            .all(|s| config.same_period(s.sampling_period, reference));
        let signals = if uniform && config.target_period.is_none() {
            signals
        } else {
            reconcile(signals, config.target_period, config)?
        };

        let period = signals[0].sampling_period;
        let table = align(&groups, &signals, config)?;
        Ok(Self::build(name.into(), table, period, config.clone()))
    }

    /// Build a dataset from a table that is already uniformly sampled.
    pub fn from_table(
        name: impl Into<String>,
        table: Table,
        config: &DatasetConfig,
    ) -> Result<Self> {
        dataframe_validation(&table, config)?;
        let n = table.time.len();
        let period = (table.time[n - 1] - table.time[0]) / (n - 1) as f64;
        Ok(Self::build(name.into(), table, period, config.clone()))
    }

    fn build(name: String, mut table: Table, sampling_period: f64, config: DatasetConfig) -> Self {
        table.sort_groups();
        let coverage = compute_coverage(&table);
        let information_level = information_level(&table);
        info!(
            "dataset '{name}': {} rows, {} input(s), {} output(s), period {sampling_period} {}, information level {information_level:.3}",
            table.len(),
            table.group(Group::Input).count(),
            table.group(Group::Output).count(),
            table.time_unit,
        );
        Self {
            name,
            table,
            sampling_period,
            coverage,
            information_level,
            config,
        }
    }

    /// New dataset sharing name, period and configuration with `self`.
    pub(crate) fn derive(&self, table: Table) -> Self {
        Self::build(
            self.name.clone(),
            table,
            self.sampling_period,
            self.config.clone(),
        )
    }

    // -- accessors --

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    pub fn time_unit(&self) -> &str {
        &self.table.time_unit
    }

    pub fn time(&self) -> &[f64] {
        &self.table.time
    }

    /// Read-only view of the underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    pub fn information_level(&self) -> f64 {
        self.information_level
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // -- extraction --

    /// Copies of the time index and of the INPUT/OUTPUT columns, with the
    /// identities needed to rebuild the dataset.
    pub fn get_dataset_values(&self) -> DatasetValues {
        let collect = |g| -> (Vec<ColumnId>, Vec<Vec<f64>>) {
            self.table
                .group(g)
                .map(|c| (c.id.clone(), c.values.clone()))
                .unzip()
        };
        let (input_ids, inputs) = collect(Group::Input);
        let (output_ids, outputs) = collect(Group::Output);
        DatasetValues {
            time: self.table.time.clone(),
            time_unit: self.table.time_unit.clone(),
            sampling_period: self.sampling_period,
            input_ids,
            inputs,
            output_ids,
            outputs,
        }
    }

    /// `(group, name, unit)` of every column, INPUT first.
    pub fn get_signal_list(&self) -> Vec<ColumnId> {
        self.table.columns.iter().map(|c| c.id.clone()).collect()
    }

    /// The dataset as signals plus the role mapping that rebuilds it with
    /// [`Dataset::from_signals`].  Missing samples are carried as `NaN`, which
    /// signal validation rejects; replace them first if a rebuild is wanted.
    pub fn dump_to_signals(&self) -> (Vec<Signal>, BTreeMap<String, Group>) {
        let start = self.table.time.first().copied().unwrap_or(0.0);
        let signals = self
            .table
            .columns
            .iter()
            .map(|c| Signal {
                name: c.id.name.clone(),
                values: c.values.clone(),
                signal_unit: c.id.unit.clone(),
                sampling_period: self.sampling_period,
                time_unit: self.table.time_unit.clone(),
                start_time: start,
            })
            .collect();
        let roles = self
            .table
            .columns
            .iter()
            .map(|c| (c.id.name.clone(), c.id.group))
            .collect();
        (signals, roles)
    }

    /// Time ranges `(first, last)` covered by consecutive missing samples,
    /// per signal.  Signals without gaps map to an empty list.
    pub fn nan_intervals(&self) -> BTreeMap<String, Vec<(f64, f64)>> {
        let time = &self.table.time;
        self.table
            .columns
            .iter()
            .map(|c| {
                let mut intervals = Vec::new();
                let mut i = 0;
                while i < c.values.len() {
                    if !c.values[i].is_nan() {
                        i += 1;
                        continue;
                    }
                    let start = i;
                    while i < c.values.len() && c.values[i].is_nan() {
                        i += 1;
                    }
                    intervals.push((time[start], time[i - 1]));
                }
                (c.id.name.clone(), intervals)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

pub(crate) fn check_groups(groups: impl IntoIterator<Item = Group>) -> Result<()> {
    let (mut inputs, mut outputs) = (0usize, 0usize);
    for g in groups {
        match g {
            Group::Input => inputs += 1,
            Group::Output => outputs += 1,
        }
    }
    if inputs == 0 {
        return Err(DatasetError::NoInputSignals);
    }
    if outputs == 0 {
        return Err(DatasetError::NoOutputSignals);
    }
    Ok(())
}

/// Cut signals sharing one sampling period to their common time interval
/// and lay them on one index starting at the latest start time.
pub(crate) fn align(groups: &[Group], signals: &[Signal], config: &DatasetConfig) -> Result<Table> {
    let first = signals.first().ok_or(DatasetError::EmptyInput)?;
    let period = first.sampling_period;

    let start = signals
        .iter()
        .map(|s| s.start_time)
        .fold(f64::NEG_INFINITY, f64::max);
    let end = signals
        .iter()
        .map(Signal::end_time)
        .fold(f64::INFINITY, f64::min);
    if end - start < -SNAP * period {
        return Err(DatasetError::EmptyIntersection { start, end });
    }

    let n = grid_len((end - start).max(0.0), period);
    let time: Vec<f64> = (0..n).map(|k| start + k as f64 * period).collect();
    debug!("aligned grid: {n} rows from {start} to {end}");

    let columns = groups
        .iter()
        .zip(signals)
        .map(|(&group, sig)| {
            let dropped = 1.0 - n as f64 / sig.len() as f64;
            if dropped > config.truncation_warn_fraction {
                warn!(
                    "signal '{}': alignment discards {:.0}% of its samples",
                    sig.name,
                    dropped * 100.0
                );
            }
            let values = time
                .iter()
                .map(|&t| {
                    config
                        .interpolation
                        .sample(&sig.values, sig.start_time, sig.sampling_period, t)
                })
                .collect();
            Column {
                id: ColumnId::new(group, sig.name.clone(), sig.signal_unit.clone()),
                values,
            }
        })
        .collect();

    Ok(Table {
        time_unit: first.time_unit.clone(),
        time,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(pairs: &[(&str, Group)]) -> BTreeMap<String, Group> {
        pairs.iter().map(|(n, g)| (n.to_string(), *g)).collect()
    }

    fn ramp(name: &str, n: usize, period: f64) -> Signal {
        Signal::new(name, (0..n).map(|i| i as f64).collect(), "V", period, "s")
    }

    #[test]
    fn builds_from_uniform_signals() {
        let ds = Dataset::from_signals(
            "plant",
            vec![ramp("y", 5, 0.1), ramp("u", 5, 0.1)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap();

        assert_eq!(ds.name(), "plant");
        assert_eq!(ds.len(), 5);
        let list = ds.get_signal_list();
        assert_eq!(list[0], ColumnId::new(Group::Input, "u", "V"));
        assert_eq!(list[1], ColumnId::new(Group::Output, "y", "V"));
        assert_eq!(ds.information_level(), 1.0);
        assert_eq!(ds.coverage().get("u").unwrap().max, 4.0);
    }

    #[test]
    fn unclassified_signals_are_left_out() {
        let ds = Dataset::from_signals(
            "d",
            vec![ramp("u", 5, 0.1), ramp("y", 5, 0.1), ramp("spare", 3, 0.7)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap();
        assert_eq!(ds.get_signal_list().len(), 2);
        assert!((ds.sampling_period() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn role_errors() {
        let cfg = DatasetConfig::default();
        let sigs = || vec![ramp("u", 5, 0.1), ramp("y", 5, 0.1)];

        let err = Dataset::from_signals("d", sigs(), &roles(&[("u", Group::Input)]), &cfg);
        assert_eq!(err.unwrap_err(), DatasetError::NoOutputSignals);

        let err = Dataset::from_signals("d", sigs(), &roles(&[("y", Group::Output)]), &cfg);
        assert_eq!(err.unwrap_err(), DatasetError::NoInputSignals);

        let err = Dataset::from_signals(
            "d",
            sigs(),
            &roles(&[("u", Group::Input), ("w", Group::Output)]),
            &cfg,
        );
        assert_eq!(err.unwrap_err(), DatasetError::UnknownSignal("w".into()));
    }

    #[test]
    fn disjoint_signals_have_no_intersection() {
        let err = Dataset::from_signals(
            "d",
            vec![ramp("u", 11, 1.0), ramp("y", 11, 1.0).with_start_time(20.0)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::EmptyIntersection { .. }));
    }

    #[test]
    fn offset_grids_are_interpolated() {
        // y starts half a period later than u
        let ds = Dataset::from_signals(
            "d",
            vec![ramp("u", 11, 1.0), ramp("y", 11, 1.0).with_start_time(0.5)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap();
        assert_eq!(ds.len(), 10);
        assert_eq!(ds.time()[0], 0.5);
        let v = ds.get_dataset_values();
        assert!((v.inputs[0][0] - 0.5).abs() < 1e-12);
        assert_eq!(v.outputs[0][0], 0.0);
    }

    #[test]
    fn from_table_infers_period_and_orders_groups() {
        let table = Table::new("s", vec![1.0, 1.5, 2.0])
            .with_column(ColumnId::new(Group::Output, "y", "m"), vec![1.0, f64::NAN, 3.0])
            .with_column(ColumnId::new(Group::Input, "u", "V"), vec![0.0, 1.0, 2.0]);
        let ds = Dataset::from_table("t", table, &DatasetConfig::default()).unwrap();
        assert!((ds.sampling_period() - 0.5).abs() < 1e-12);
        assert_eq!(ds.get_signal_list()[0].name, "u");
        assert!((ds.information_level() - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(ds.nan_intervals()["y"], vec![(1.5, 1.5)]);
        assert!(ds.nan_intervals()["u"].is_empty());
    }

    #[test]
    fn extraction_returns_independent_copies() {
        let ds = Dataset::from_signals(
            "d",
            vec![ramp("u", 4, 0.1), ramp("y", 4, 0.1)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap();
        let mut values = ds.get_dataset_values();
        assert_eq!(values.input_ids, vec![ColumnId::new(Group::Input, "u", "V")]);
        assert_eq!(values.output_ids[0].name, "y");
        assert!((values.sampling_period - 0.1).abs() < 1e-12);
        values.inputs[0][0] = 99.0;
        values.time.clear();
        assert_eq!(ds.table().columns[0].values[0], 0.0);
        assert_eq!(ds.len(), 4);
    }

    #[test]
    fn dump_to_signals_rebuilds_the_dataset() {
        let ds = Dataset::from_signals(
            "d",
            vec![ramp("u", 6, 0.2).with_start_time(1.0), ramp("y", 6, 0.2).with_start_time(1.0)],
            &roles(&[("u", Group::Input), ("y", Group::Output)]),
            &DatasetConfig::default(),
        )
        .unwrap();
        let (signals, roles) = ds.dump_to_signals();
        assert_eq!(signals[0].start_time, 1.0);
        let rebuilt = Dataset::from_signals("d", signals, &roles, &DatasetConfig::default()).unwrap();
        assert_eq!(rebuilt.table(), ds.table());
    }
}
