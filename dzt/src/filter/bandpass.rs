//! Vertical triangular FIR bandpass.
//!
//! A 25-tap windowed-sinc design with a triangular window, scaled to unit
//! gain at the center of the passband, run down every trace.

use std::f64::consts::PI;

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, Axis};

use crate::structs::dataset::SampleMatrix;
use crate::utils::errors::BandpassError;

pub const NUM_TAPS: usize = 25;

/// Designs the bandpass for cutoffs and sampling frequency given in Hz.
pub fn design_triangular(freqmin: f64, freqmax: f64, fs: f64) -> Result<[f64; NUM_TAPS]> {
    if !(fs.is_finite() && fs > 0.0) {
        bail!(BandpassError::InvalidSamplingFrequency(fs));
    }

    let nyquist = fs / 2.0;
    if !(freqmin > 0.0 && freqmin < freqmax && freqmax < nyquist) {
        bail!(BandpassError::InvalidCutoff {
            low: freqmin,
            high: freqmax,
            nyquist,
        });
    }

    let left = freqmin / nyquist;
    let right = freqmax / nyquist;
    let alpha = (NUM_TAPS - 1) as f64 / 2.0;

    let mut taps = [0.0; NUM_TAPS];
    for (n, tap) in taps.iter_mut().enumerate() {
        let m = n as f64 - alpha;
        *tap = (right * sinc(right * m) - left * sinc(left * m)) * triangle(n, NUM_TAPS);
    }

    let center = (left + right) / 2.0;
    let gain: f64 = taps
        .iter()
        .enumerate()
        .map(|(n, &tap)| tap * (PI * (n as f64 - alpha) * center).cos())
        .sum();
    taps.iter_mut().for_each(|tap| *tap /= gain);

    Ok(taps)
}

/// Filters every trace of `data`.
///
/// `fs` is in Hz, cutoffs in MHz. With `zerophase` the filtered trace is
/// filtered again time-reversed and flipped back, cancelling the delay.
pub fn triangular_bandpass(
    data: &SampleMatrix,
    fs: f64,
    freqmin_mhz: f64,
    freqmax_mhz: f64,
    zerophase: bool,
) -> Result<SampleMatrix> {
    let taps = design_triangular(freqmin_mhz * 1e6, freqmax_mhz * 1e6, fs)?;

    let mut out = data.clone();
    for mut trace in out.axis_iter_mut(Axis(1)) {
        let mut filtered = lfilter(&taps, trace.view());
        if zerophase {
            filtered.invert_axis(Axis(0));
            filtered = lfilter(&taps, filtered.view());
            filtered.invert_axis(Axis(0));
        }
        trace.assign(&filtered);
    }

    Ok(out)
}

/// Direct-form FIR with zero initial state.
pub fn lfilter(taps: &[f64], signal: ArrayView1<f64>) -> Array1<f64> {
    Array1::from_shape_fn(signal.len(), |n| {
        taps.iter()
            .take(n + 1)
            .enumerate()
            .map(|(k, &b)| b * signal[n - k])
            .sum()
    })
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

/// Triangular window of odd length that does not reach zero at the ends.
fn triangle(n: usize, len: usize) -> f64 {
    let half = (len + 1) / 2;
    let k = if n < half { n + 1 } else { len - n };
    k as f64 / half as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    fn response(taps: &[f64], freq: f64, fs: f64) -> f64 {
        let (re, im) = taps.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, &b)| {
            let w = 2.0 * PI * freq / fs * n as f64;
            (re + b * w.cos(), im - b * w.sin())
        });
        (re * re + im * im).sqrt()
    }

    #[test]
    fn design_is_symmetric_with_unit_center_gain() -> Result<()> {
        let taps = design_triangular(100.0, 300.0, 1000.0)?;
        for n in 0..NUM_TAPS {
            assert!((taps[n] - taps[NUM_TAPS - 1 - n]).abs() < 1e-15);
        }
        assert!((taps[12] - 0.4330254287471013).abs() < 1e-12);
        assert!((taps[0] + 0.003399170145880337).abs() < 1e-12);
        assert!((response(&taps, 200.0, 1000.0) - 1.0).abs() < 1e-12);
        assert!(response(&taps, 0.0, 1000.0) < 0.1);
        assert!(response(&taps, 450.0, 1000.0) < 0.1);
        Ok(())
    }

    #[test]
    fn triangle_window_shape() {
        assert!((triangle(0, 25) - 1.0 / 13.0).abs() < 1e-15);
        assert_eq!(triangle(12, 25), 1.0);
        assert!((triangle(24, 25) - 1.0 / 13.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_invalid_cutoffs() {
        let cases = [
            (0.0, 100.0, 1000.0),
            (300.0, 100.0, 1000.0),
            (100.0, 500.0, 1000.0),
            (100.0, 200.0, 0.0),
        ];
        for (low, high, fs) in cases {
            let err = design_triangular(low, high, fs).unwrap_err();
            assert!(err.downcast_ref::<BandpassError>().is_some());
        }
    }

    #[test]
    fn lfilter_is_causal_convolution() {
        let out = lfilter(&[1.0, 0.5], array![1.0, 2.0, 3.0].view());
        assert_eq!(out, array![1.0, 2.5, 4.0]);
    }

    #[test]
    fn zerophase_impulse_response_is_symmetric() -> Result<()> {
        let mut data = Array2::zeros((201, 1));
        data[[100, 0]] = 1.0;

        let out = triangular_bandpass(&data, 1000e6, 100.0, 300.0, true)?;
        let trace = out.column(0);
        for i in 0..100 {
            assert!((trace[100 - i] - trace[100 + i]).abs() < 1e-12);
        }
        let peak = trace
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        assert_eq!(peak.0, 100);
        Ok(())
    }

    #[test]
    fn double_reversal_reproduces_zero_phase_output() -> Result<()> {
        let data = Array2::from_shape_fn((64, 3), |(r, c)| ((r * (c + 1)) as f64 * 0.9).sin());
        let out = triangular_bandpass(&data, 1000e6, 100.0, 300.0, true)?;

        let mut twice = out.clone();
        twice.invert_axis(Axis(0));
        twice.invert_axis(Axis(0));
        assert_eq!(twice, out);

        let again = triangular_bandpass(&data, 1000e6, 100.0, 300.0, true)?;
        assert_eq!(again, out);
        Ok(())
    }

    #[test]
    fn causal_mode_delays_impulse() -> Result<()> {
        let mut data = Array2::zeros((60, 1));
        data[[10, 0]] = 1.0;
        let out = triangular_bandpass(&data, 1000e6, 100.0, 300.0, false)?;
        let taps = design_triangular(100e6, 300e6, 1000e6)?;
        assert!(out.column(0).iter().take(10).all(|&v| v == 0.0));
        assert!((out[[22, 0]] - taps[12]).abs() < 1e-15);
        Ok(())
    }
}
