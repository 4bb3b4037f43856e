use std::f64::consts::{FRAC_1_SQRT_2, PI};

// ---------------------------------------------------------------------------
// Second-order low-pass section
// ---------------------------------------------------------------------------

/// Normalised biquad (`a0 == 1`), run in transposed direct form II.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    b: [f64; 3],
    a: [f64; 2],
}

impl Biquad {
    /// Butterworth low-pass (Q = 1/√2) via the bilinear transform with
    /// pre-warping.  `cutoff` must lie strictly between 0 and Nyquist.
    pub fn butterworth_lowpass(cutoff: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * FRAC_1_SQRT_2);

        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos_w0) / a0;
        Self {
            b: [b1 * 0.5, b1, b1 * 0.5],
            a: [-2.0 * cos_w0 / a0, (1.0 - alpha) / a0],
        }
    }

    /// Filter `x` in place.  State starts at the steady state for a constant
    /// input equal to `x[0]`, so a flat signal passes through unchanged.
    fn run(&self, x: &mut [f64]) {
        let Some(&x0) = x.first() else {
            return;
        };
        let [b0, b1, b2] = self.b;
        let [a1, a2] = self.a;
        // unit DC gain: y == x0 in steady state
        let mut z1 = x0 - b0 * x0;
        let mut z2 = (b2 - a2) * x0;
        for v in x.iter_mut() {
            let input = *v;
            let y = b0 * input + z1;
            z1 = b1 * input - a1 * y + z2;
            z2 = b2 * input - a2 * y;
            *v = y;
        }
    }
}

// ---------------------------------------------------------------------------
// Zero-phase filtering
// ---------------------------------------------------------------------------

/// Forward-backward application of a cascade of sections.
///
/// The input is extended at both ends by odd reflection to tame the edge
/// transients.  Phase distortion cancels; the magnitude response is squared.
pub fn filtfilt(values: &[f64], sections: &[Biquad]) -> Vec<f64> {
    let n = values.len();
    if n < 2 || sections.is_empty() {
        return values.to_vec();
    }
    let pad = (6 * sections.len()).min(n - 1);
    let (first, last) = (values[0], values[n - 1]);

    let mut ext = Vec::with_capacity(n + 2 * pad);
    ext.extend((1..=pad).rev().map(|i| 2.0 * first - values[i]));
    ext.extend_from_slice(values);
    ext.extend((1..=pad).map(|i| 2.0 * last - values[n - 1 - i]));

    for s in sections {
        s.run(&mut ext);
    }
    ext.reverse();
    for s in sections {
        s.run(&mut ext);
    }
    ext.reverse();

    ext[pad..pad + n].to_vec()
}

/// Zero-phase Butterworth low-pass of a column that may contain `NaN`s.
/// Every contiguous run of valid samples is filtered on its own; missing
/// samples stay missing.
pub fn zero_phase_lowpass(
    values: &[f64],
    cutoff: f64,
    sample_rate: f64,
    n_sections: usize,
) -> Vec<f64> {
    let section = Biquad::butterworth_lowpass(cutoff, sample_rate);
    let sections = vec![section; n_sections.max(1)];

    let mut out = values.to_vec();
    let mut i = 0;
    while i < values.len() {
        if values[i].is_nan() {
            i += 1;
            continue;
        }
        let start = i;
        while i < values.len() && !values[i].is_nan() {
            i += 1;
        }
        let filtered = filtfilt(&values[start..i], &sections);
        out[start..i].copy_from_slice(&filtered);
    }
    out
}
