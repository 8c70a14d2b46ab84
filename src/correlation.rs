//! Full linear cross-correlation between two equal-length signals.
//!
//! For inputs of length `N` the output has `2N - 1` entries. Entry `i`
//! corresponds to the lag `i - (N - 1)` and holds
//!
//! ```text
//! r[lag] = sum_n a[n] * b[n + lag]
//! ```
//!
//! so a positive lag means `b` trails `a`.
//!
//! The FFT path only approximates that sum, so [peak_index] rescores the
//! values near its peak exactly before picking one. Exact ties then still go
//! to the most negative lag, whichever method produced the sequence.

use crate::error::DoaError;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

type Complex64 = Complex<f64>;

/// Above this many samples, [CorrelationMethod::Auto] switches to the FFT.
pub const AUTO_FFT_THRESHOLD: usize = 2048;

/// FFT values within this fraction of `sqrt(energy(a) * energy(b))` of the
/// peak are rescored exactly.
pub const FFT_TIE_TOLERANCE: f64 = 1e-9;

/// How the correlation sequence gets computed. Both strategies produce the
/// same sequence up to floating point rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum CorrelationMethod {
    /// Straight from the definition, `O(N^2)`. Exact for short buffers.
    Direct,
    /// Zero-padded FFT, `O(N log N)`.
    Fft,
    /// Direct for short buffers, FFT for long ones.
    #[default]
    Auto,
}

impl CorrelationMethod {
    fn resolve(self, len: usize) -> Self {
        match self {
            Self::Auto if len > AUTO_FFT_THRESHOLD => Self::Fft,
            Self::Auto => Self::Direct,
            other => other,
        }
    }
}

/// Cross-correlates `a` against `b`. An empty input yields an empty output.
pub fn cross_correlate(
    a: &[f32],
    b: &[f32],
    method: CorrelationMethod,
) -> Result<Vec<f64>, DoaError> {
    check_lengths(a, b)?;
    if a.is_empty() {
        return Ok(Vec::new());
    }
    Ok(match method.resolve(a.len()) {
        CorrelationMethod::Fft => cross_correlate_fft(a, b),
        _ => cross_correlate_direct(a, b),
    })
}

/// Index of the correlation peak, ties going to the first (most negative
/// lag) index for both methods. `None` for empty input.
pub fn peak_index(
    a: &[f32],
    b: &[f32],
    method: CorrelationMethod,
) -> Result<Option<usize>, DoaError> {
    check_lengths(a, b)?;
    if a.is_empty() {
        return Ok(None);
    }
    Ok(match method.resolve(a.len()) {
        CorrelationMethod::Fft => fft_peak(a, b),
        _ => argmax_first(&cross_correlate_direct(a, b)),
    })
}

fn check_lengths(a: &[f32], b: &[f32]) -> Result<(), DoaError> {
    if a.len() != b.len() {
        return Err(DoaError::ChannelLengthMismatch(a.len(), b.len()));
    }
    Ok(())
}

/// `sum_n a[n] * b[n + lag]` over the overlapping samples.
fn lag_product(a: &[f32], b: &[f32], lag: isize) -> f64 {
    let n = a.len() as isize;
    let start = (-lag).max(0);
    let end = n.min(n - lag);
    (start..end)
        .map(|k| a[k as usize] as f64 * b[(k + lag) as usize] as f64)
        .sum::<f64>()
}

fn cross_correlate_direct(a: &[f32], b: &[f32]) -> Vec<f64> {
    let n = a.len() as isize;
    (0..2 * n - 1)
        .map(|i| lag_product(a, b, i - (n - 1)))
        .collect()
}

fn energy(x: &[f32]) -> f64 {
    x.iter().map(|&s| s as f64 * s as f64).sum()
}

fn fft_peak(a: &[f32], b: &[f32]) -> Option<usize> {
    let correlation = cross_correlate_fft(a, b);
    let scale = (energy(a) * energy(b)).sqrt();
    if scale == 0.0 {
        // one side is silent, every lag correlates to exactly zero
        return argmax_first(&correlation);
    }

    let peak = correlation[argmax_first(&correlation)?];
    let floor = peak - FFT_TIE_TOLERANCE * scale;
    let n = a.len() as isize;
    let rescored: Vec<(usize, f64)> = correlation
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v >= floor)
        .map(|(i, _)| (i, lag_product(a, b, i as isize - (n - 1))))
        .collect();

    let exact: Vec<f64> = rescored.iter().map(|&(_, v)| v).collect();
    argmax_first(&exact).map(|best| rescored[best].0)
}

fn cross_correlate_fft(a: &[f32], b: &[f32]) -> Vec<f64> {
    let n = a.len();
    let out_len = 2 * n - 1;
    let nfft = out_len.next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nfft);
    let ifft = planner.plan_fft_inverse(nfft);

    let pad = |x: &[f32]| -> Vec<Complex64> {
        let mut buf = vec![Complex64::new(0.0, 0.0); nfft];
        for (v, &s) in buf.iter_mut().zip(x) {
            *v = Complex64::new(s as f64, 0.0);
        }
        buf
    };
    let mut spec_a = pad(a);
    let mut spec_b = pad(b);
    fft.process(&mut spec_a);
    fft.process(&mut spec_b);

    // conj(A) * B transforms back to sum_n a[n] b[n + m], circularly indexed
    let mut product: Vec<Complex64> = spec_a
        .iter()
        .zip(&spec_b)
        .map(|(x, y)| x.conj() * y)
        .collect();
    ifft.process(&mut product);

    let scale = 1.0 / nfft as f64;
    (0..out_len)
        .map(|i| {
            let lag = i as isize - (n as isize - 1);
            let idx = if lag < 0 {
                (nfft as isize + lag) as usize
            } else {
                lag as usize
            };
            product[idx].re * scale
        })
        .collect()
}

/// Index of the largest value. Ties go to the first occurrence; NaNs never
/// win. Returns `None` for an empty slice.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
