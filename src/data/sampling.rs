use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::DatasetConfig;
use crate::error::{DatasetError, Result};

use super::model::Signal;
use super::validation::{signals_validation, validate_period};

/// Fractional grid positions closer than this to a sample snap onto it.
pub(crate) const SNAP: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Interpolation kernels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Straight line between the two neighbouring samples.
    #[default]
    Linear,
    /// Hold the previous sample.
    ZeroOrderHold,
}

impl Interpolation {
    /// Evaluate a uniformly sampled series at time `t`.
    ///
    /// Times outside the series clamp to the first/last sample.  The lookup
    /// is plain index arithmetic, so evaluating a whole grid is linear in its
    /// length.
    pub fn sample(self, values: &[f64], start: f64, period: f64, t: f64) -> f64 {
        let Some(&last) = values.last() else {
            return f64::NAN;
        };
        let pos = (t - start) / period;
        if pos <= 0.0 {
            return values[0];
        }
        let max_pos = (values.len() - 1) as f64;
        if pos >= max_pos {
            return last;
        }

        let i = pos.floor() as usize;
        let frac = pos - i as f64;
        if frac < SNAP {
            return values[i];
        }
        if frac > 1.0 - SNAP {
            return values[i + 1];
        }
        match self {
            Interpolation::Linear => values[i] + frac * (values[i + 1] - values[i]),
            Interpolation::ZeroOrderHold => values[i],
        }
    }
}

/// Number of grid points of period `period` that fit in `extent`.
pub(crate) fn grid_len(extent: f64, period: f64) -> usize {
    (extent / period + SNAP).floor() as usize + 1
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Bring every signal to one sampling period.
///
/// Without `target_period` the finest period present is used.  Each signal
/// is resampled over its own extent; cutting to a common interval is left to
/// dataset construction.  Signals already at the target pass through
/// untouched.
pub fn fix_sampling_periods(
    signals: &[Signal],
    target_period: Option<f64>,
    config: &DatasetConfig,
) -> Result<Vec<Signal>> {
    signals_validation(signals)?;
    reconcile(signals.to_vec(), target_period, config)
}

/// Same as [`fix_sampling_periods`] on signals that are already validated.
pub(crate) fn reconcile(
    signals: Vec<Signal>,
    target_period: Option<f64>,
    config: &DatasetConfig,
) -> Result<Vec<Signal>> {
    let target = match target_period {
        Some(t) => {
            validate_period("<target>", t)?;
            t
        }
        None => signals
            .iter()
            .map(|s| s.sampling_period)
            .fold(f64::INFINITY, f64::min),
    };
    debug!("reconciling {} signal(s) to period {target}", signals.len());

    signals
        .into_iter()
        .map(|sig| {
            if config.same_period(sig.sampling_period, target) {
                Ok(sig)
            } else {
                resample(sig, target, config.interpolation)
            }
        })
        .collect()
}

fn resample(sig: Signal, target: f64, kernel: Interpolation) -> Result<Signal> {
    let extent = sig.extent();
    if extent + SNAP * target < target {
        return Err(DatasetError::UnresamplableSignal {
            name: sig.name,
            extent,
            target,
        });
    }

    let n = grid_len(extent, target);
    let values: Vec<f64> = (0..n)
        .map(|k| {
            kernel.sample(
                &sig.values,
                sig.start_time,
                sig.sampling_period,
                sig.start_time + k as f64 * target,
            )
        })
        .collect();
    debug!(
        "resampled '{}': {} samples @ {} -> {} samples @ {target}",
        sig.name,
        sig.values.len(),
        sig.sampling_period,
        n
    );

    Ok(Signal {
        values,
        sampling_period: target,
        ..sig
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(name: &str, n: usize, period: f64) -> Signal {
        let values = (0..n).map(|i| i as f64 * period).collect();
        Signal::new(name, values, "V", period, "s")
    }

    #[test]
    fn linear_interpolation_between_samples() {
        let v = [0.0, 10.0, 20.0];
        let k = Interpolation::Linear;
        assert!((k.sample(&v, 0.0, 1.0, 0.5) - 5.0).abs() < 1e-10);
        assert!((k.sample(&v, 0.0, 1.0, 1.5) - 15.0).abs() < 1e-10);
        assert_eq!(k.sample(&v, 0.0, 1.0, -3.0), 0.0);
        assert_eq!(k.sample(&v, 0.0, 1.0, 9.0), 20.0);
    }

    #[test]
    fn zero_order_hold_keeps_previous_sample() {
        let v = [1.0, 2.0, 3.0];
        let k = Interpolation::ZeroOrderHold;
        assert_eq!(k.sample(&v, 0.0, 1.0, 0.9), 1.0);
        assert_eq!(k.sample(&v, 0.0, 1.0, 1.2), 2.0);
    }

    #[test]
    fn exact_grid_points_are_copied() {
        let v = [0.1, 0.7, 0.3];
        let k = Interpolation::Linear;
        assert_eq!(k.sample(&v, 0.0, 0.1, 0.1 * 1.0), 0.7);
        assert_eq!(k.sample(&v, 5.0, 0.1, 5.0 + 0.1 * 2.0), 0.3);
    }

    #[test]
    fn finest_period_is_chosen_by_default() {
        let fast = ramp("fast", 101, 0.1);
        let slow = ramp("slow", 21, 0.5);
        let out = fix_sampling_periods(&[fast.clone(), slow], None, &DatasetConfig::default())
            .unwrap();

        assert_eq!(out[0], fast);
        assert!((out[1].sampling_period - 0.1).abs() < 1e-12);
        // extent 10.0 / 0.1 -> 101 samples
        assert_eq!(out[1].values.len(), 101);
        // a ramp stays a ramp under linear interpolation
        for (k, v) in out[1].values.iter().enumerate() {
            assert!((v - k as f64 * 0.1).abs() < 1e-9);
        }
    }

    #[test]
    fn explicit_target_decimates() {
        let s = ramp("u", 11, 0.1);
        let out = fix_sampling_periods(&[s], Some(0.25), &DatasetConfig::default()).unwrap();
        assert_eq!(out[0].values.len(), 5); // 0, .25, .5, .75, 1.0
        assert!((out[0].values[3] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn too_short_signal_is_unresamplable() {
        let s = ramp("u", 2, 0.1);
        let err = fix_sampling_periods(&[s], Some(0.5), &DatasetConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::UnresamplableSignal { .. }));
    }

    #[test]
    fn bad_target_is_rejected() {
        let s = ramp("u", 5, 0.1);
        let err = fix_sampling_periods(&[s], Some(-1.0), &DatasetConfig::default()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidSamplingPeriod { .. }));
    }
}
