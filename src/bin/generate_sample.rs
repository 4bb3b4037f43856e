use std::collections::BTreeMap;

use anyhow::{Context, Result};
use arrow::util::pretty::pretty_format_batches;
use log::info;
use parquet::arrow::ArrowWriter;

use sigalign::data::loader::to_record_batch;
use sigalign::{Dataset, DatasetConfig, Group, Signal};

/// Gaussian measurement noise from a splitmix64 stream.  The seed is fixed
/// so every run writes the same file.
struct Noise {
    state: u64,
    std_dev: f64,
}

impl Noise {
    fn new(seed: u64, std_dev: f64) -> Self {
        Noise { state: seed, std_dev }
    }

    fn uniform(&mut self) -> f64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        ((z ^ (z >> 31)) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller
    fn sample(&mut self) -> f64 {
        let u1 = self.uniform().max(1e-15);
        let u2 = self.uniform();
        self.std_dev * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Throttle command: steps every 5 s plus a slow sine.
fn throttle(t: f64) -> f64 {
    let step = [0.2, 0.6, 0.4, 0.8][((t / 5.0) as usize) % 4];
    step + 0.05 * (2.0 * std::f64::consts::PI * 0.1 * t).sin()
}

/// Sample `f` on `[start, start + duration]` with period `dt`.
fn log_signal(
    name: &str,
    unit: &str,
    start: f64,
    duration: f64,
    dt: f64,
    f: impl Fn(f64) -> f64,
) -> Signal {
    let n = (duration / dt).round() as usize + 1;
    let values = (0..n).map(|k| f(start + k as f64 * dt)).collect();
    Signal::new(name, values, unit, dt, "s").with_start_time(start)
}

fn main() -> Result<()> {
    env_logger::init();
    let mut noise = Noise::new(42, 0.2);

    // Input logged at 100 Hz, ambient temperature at 2 Hz.
    let throttle_sig = log_signal("throttle", "%", 0.0, 40.0, 0.01, throttle);
    let ambient_sig = log_signal("ambient", "degC", 0.0, 40.0, 0.5, |t| 20.0 + 0.05 * t);

    // Output: first-order response to the throttle, logged at 50 Hz and
    // starting late (logger switched on after the run began).
    let tau = 1.5;
    let dt_out = 0.02;
    let mut speed = 0.0;
    let speed_values: Vec<f64> = (0..=1900)
        .map(|k| {
            let t = 2.0 + k as f64 * dt_out;
            speed += dt_out / tau * (30.0 * throttle(t) - speed);
            speed + noise.sample()
        })
        .collect();
    let speed_sig = Signal::new("speed", speed_values, "m/s", dt_out, "s").with_start_time(2.0);

    let roles = BTreeMap::from([
        ("throttle".to_string(), Group::Input),
        ("ambient".to_string(), Group::Input),
        ("speed".to_string(), Group::Output),
    ]);
    let dataset = Dataset::from_signals(
        "sample-run",
        vec![throttle_sig, ambient_sig, speed_sig],
        &roles,
        &DatasetConfig::default(),
    )?;

    for (name, cov) in dataset.coverage().iter() {
        info!(
            "{name}: range [{:.3}, {:.3}], mean {:.3}, variance {:.4}",
            cov.min, cov.max, cov.mean, cov.variance
        );
    }

    let batch = to_record_batch(dataset.table())?;
    let preview = pretty_format_batches(&[batch.slice(0, batch.num_rows().min(5))])?;
    println!("{preview}");

    let output_path = "sample_dataset.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;

    println!(
        "Wrote {} rows ({} signals, period {} s) to {output_path}",
        dataset.len(),
        dataset.get_signal_list().len(),
        dataset.sampling_period()
    );
    Ok(())
}
