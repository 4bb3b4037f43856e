use std::collections::BTreeMap;

use sigalign::{
    compare_datasets, datasets_match, fix_sampling_periods, ColumnId, Dataset, DatasetConfig,
    DatasetError, Group, NanMethod, Signal, Table, Tolerance,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn roles(pairs: &[(&str, Group)]) -> BTreeMap<String, Group> {
    pairs.iter().map(|(n, g)| (n.to_string(), *g)).collect()
}

fn sampled(name: &str, start: f64, period: f64, n: usize, f: impl Fn(f64) -> f64) -> Signal {
    let values = (0..n).map(|k| f(start + k as f64 * period)).collect();
    Signal::new(name, values, "V", period, "s").with_start_time(start)
}

/// Sine plus a deterministic sawtooth "noise" term.
fn noisy(t: f64) -> f64 {
    let k = (t * 100.0).round() as i64;
    (0.5 * t).sin() + 0.3 * ((k * 7919 % 13) as f64 / 13.0 - 0.5)
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

#[test]
fn rebuilding_from_extracted_values_round_trips() {
    init_logging();
    // u starts later and y ends later: only the overlap survives
    let u = sampled("u", 0.3, 0.1, 40, |t| (3.0 * t).cos());
    let y = sampled("y", 0.0, 0.1, 60, |t| t.sqrt());
    let ds = Dataset::from_signals(
        "rt",
        vec![u, y],
        &roles(&[("u", Group::Input), ("y", Group::Output)]),
        &DatasetConfig::default(),
    )
    .unwrap();
    assert_eq!(ds.len(), 40);

    let values = ds.get_dataset_values();
    let start = values.time[0];
    let ids = values.input_ids.iter().chain(&values.output_ids);
    let columns = values.inputs.iter().chain(&values.outputs);
    let signals: Vec<Signal> = ids
        .zip(columns)
        .map(|(id, v)| {
            Signal::new(
                id.name.clone(),
                v.clone(),
                id.unit.clone(),
                values.sampling_period,
                values.time_unit.clone(),
            )
            .with_start_time(start)
        })
        .collect();
    let rebuilt_roles: BTreeMap<String, Group> = ds
        .get_signal_list()
        .into_iter()
        .map(|id| (id.name, id.group))
        .collect();

    let rebuilt =
        Dataset::from_signals("rt", signals, &rebuilt_roles, &DatasetConfig::default()).unwrap();
    let report = compare_datasets(&ds, &rebuilt, Tolerance::Absolute(0.0));
    assert!(report.is_match(), "{report}");
}

#[test]
fn remove_means_is_idempotent() {
    init_logging();
    let ds = Dataset::from_signals(
        "m",
        vec![sampled("u", 0.0, 0.01, 500, noisy), sampled("y", 0.0, 0.01, 500, |t| 3.0 + t)],
        &roles(&[("u", Group::Input), ("y", Group::Output)]),
        &DatasetConfig::default(),
    )
    .unwrap();

    let once = ds.remove_means();
    let twice = once.remove_means();
    let report = compare_datasets(&once, &twice, Tolerance::Absolute(1e-9));
    assert!(report.is_match(), "{report}");
    assert!(!datasets_match(&ds, &once, Tolerance::Absolute(1e-9)));
}

#[test]
fn every_result_keeps_dataset_invariants() {
    init_logging();
    let ds = Dataset::from_signals(
        "inv",
        vec![
            sampled("u", 0.0, 0.01, 1001, noisy),
            sampled("w", 0.0, 0.05, 201, |t| t * t),
            sampled("y", 0.5, 0.02, 401, |t| (2.0 * t).cos()),
        ],
        &roles(&[("u", Group::Input), ("w", Group::Input), ("y", Group::Output)]),
        &DatasetConfig::default(),
    )
    .unwrap();

    let derived = [
        ds.clone(),
        ds.remove_means(),
        ds.remove_offset(&BTreeMap::from([("w".to_string(), 1.0)])).unwrap(),
        ds.low_pass_filter(&BTreeMap::from([("u".to_string(), 2.0)])).unwrap(),
        ds.replace_nans(NanMethod::Fill).unwrap(),
        ds.trim(1.0, 4.0).unwrap(),
        ds.remove_signals(&["w"]).unwrap(),
    ];
    for d in &derived {
        let time = d.time();
        assert!(time.len() >= 2);
        for pair in time.windows(2) {
            assert!((pair[1] - pair[0] - d.sampling_period()).abs() < 1e-9);
        }
        let list = d.get_signal_list();
        assert!(list.iter().any(|c| c.group == Group::Input));
        assert!(list.iter().any(|c| c.group == Group::Output));
        for col in &d.table().columns {
            assert_eq!(col.values.len(), time.len());
        }
        assert_eq!(d.coverage().len(), list.len());
        assert!((0.0..=1.0).contains(&d.information_level()));
    }
}

#[test]
fn signals_are_cut_to_their_intersection() {
    init_logging();
    let ds = Dataset::from_signals(
        "x",
        vec![
            sampled("a", 0.0, 1.0, 11, |t| t),
            sampled("b", 5.0, 1.0, 11, |t| -t),
        ],
        &roles(&[("a", Group::Input), ("b", Group::Output)]),
        &DatasetConfig::default(),
    )
    .unwrap();
    assert_eq!(ds.time(), &[5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    let values = ds.get_dataset_values();
    assert_eq!(values.inputs[0], vec![5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
    assert_eq!(values.outputs[0][0], -5.0);
}

#[test]
fn mixed_periods_reconcile_to_the_finest() {
    init_logging();
    let cfg = DatasetConfig::default();
    let fine = sampled("fast", 0.0, 0.1, 51, |t| t);
    let coarse = sampled("slow", 0.0, 0.5, 11, |t| 2.0 * t);

    let fixed = fix_sampling_periods(&[fine.clone(), coarse.clone()], None, &cfg).unwrap();
    assert!(fixed.iter().all(|s| (s.sampling_period - 0.1).abs() < 1e-12));
    let expected_len = (coarse.extent() / 0.1 + 1e-9).floor() as usize + 1;
    assert_eq!(fixed[1].len(), expected_len);
    assert!((fixed[1].values[3] - 0.6).abs() < 1e-9);

    let ds = Dataset::from_signals(
        "rec",
        vec![fine, coarse],
        &roles(&[("fast", Group::Input), ("slow", Group::Output)]),
        &cfg,
    )
    .unwrap();
    assert!((ds.sampling_period() - 0.1).abs() < 1e-12);
    assert_eq!(ds.len(), expected_len);
}

#[test]
fn low_pass_respects_nyquist_and_smooths() {
    init_logging();
    let ds = Dataset::from_signals(
        "f",
        vec![sampled("u", 0.0, 0.01, 2000, noisy), sampled("y", 0.0, 0.01, 2000, noisy)],
        &roles(&[("u", Group::Input), ("y", Group::Output)]),
        &DatasetConfig::default(),
    )
    .unwrap();
    let nyquist = 0.5 / ds.sampling_period();

    let err = ds
        .low_pass_filter(&BTreeMap::from([("y".to_string(), nyquist)]))
        .unwrap_err();
    assert!(matches!(err, DatasetError::InvalidCutoff { .. }));

    let smooth = ds
        .low_pass_filter(&BTreeMap::from([("y".to_string(), 0.01 * nyquist)]))
        .unwrap();
    let second_diff = |v: &[f64]| -> Vec<f64> {
        v.windows(3).map(|w| w[2] - 2.0 * w[1] + w[0]).collect()
    };
    let before = variance(&second_diff(&ds.table().columns[1].values));
    let after = variance(&second_diff(&smooth.table().columns[1].values));
    assert!(after < before, "{after} !< {before}");
}

#[test]
fn interpolation_restores_full_information() {
    init_logging();
    let n = 20;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
    let mut y: Vec<f64> = time.iter().map(|t| 2.0 * t).collect();
    y[7] = f64::NAN;
    let table = Table::new("s", time)
        .with_column(ColumnId::new(Group::Input, "u", "V"), vec![1.0; n])
        .with_column(ColumnId::new(Group::Output, "y", "m"), y);
    let ds = Dataset::from_table("gap", table, &DatasetConfig::default()).unwrap();

    let total = (2 * n) as f64;
    assert!((ds.information_level() - (total - 1.0) / total).abs() < 1e-12);
    assert_eq!(ds.nan_intervals()["y"], vec![(3.5, 3.5)]);

    let filled = ds.replace_nans(NanMethod::Interpolate).unwrap();
    assert_eq!(filled.information_level(), 1.0);
    assert!((filled.table().columns[1].values[7] - 7.0).abs() < 1e-12);
    // receiver is untouched
    assert!(ds.table().columns[1].values[7].is_nan());
}
