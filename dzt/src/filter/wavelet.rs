//! Wavelet decomposition of traces.
//!
//! Nothing here modifies a dataset: coefficients are computed per trace and
//! returned to the caller.

use std::f64::consts::PI;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::{Result, bail};
use ndarray::{Array2, Array3, ArrayView1, Axis};

use crate::structs::dataset::SampleMatrix;
use crate::utils::errors::FilterError;

/// Upper bound on the number of CWT scales.
pub const MAX_CWT_SCALES: usize = 32;

/// Both continuous wavelets are below 1e-5 past this many scale units.
const CWT_SUPPORT: f64 = 5.0;

const DB1: [f64; 2] = [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2];
const DB2: [f64; 4] = [
    0.48296291314469025,
    0.836516303737469,
    0.22414386804185735,
    -0.12940952255092145,
];
const DB3: [f64; 6] = [
    0.3326705529509569,
    0.8068915093133388,
    0.4598775021193313,
    -0.13501102001039084,
    -0.08544127388224149,
    0.035226291882100656,
];
const DB4: [f64; 8] = [
    0.23037781330885523,
    0.7148465705525415,
    0.6308807679295904,
    -0.02798376941698385,
    -0.18703481171888114,
    0.030841381835986965,
    0.032883011666982945,
    -0.010597401784997278,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveletFamily {
    Haar,
    Daubechies(u8),
    Symlet(u8),
    MexicanHat,
    Morlet,
}

impl WaveletFamily {
    pub fn is_discrete(&self) -> bool {
        !matches!(self, WaveletFamily::MexicanHat | WaveletFamily::Morlet)
    }

    /// Reconstruction low-pass filter of a discrete family.
    fn rec_lo(&self) -> Option<&'static [f64]> {
        match self {
            WaveletFamily::Haar | WaveletFamily::Daubechies(1) => Some(&DB1),
            WaveletFamily::Daubechies(2) | WaveletFamily::Symlet(2) => Some(&DB2),
            WaveletFamily::Daubechies(3) | WaveletFamily::Symlet(3) => Some(&DB3),
            WaveletFamily::Daubechies(4) => Some(&DB4),
            _ => None,
        }
    }

    fn psi(&self, t: f64) -> f64 {
        match self {
            WaveletFamily::MexicanHat => {
                2.0 / (3f64.sqrt() * PI.powf(0.25)) * (1.0 - t * t) * (-t * t / 2.0).exp()
            }
            WaveletFamily::Morlet => (-t * t / 2.0).exp() * (5.0 * t).cos(),
            _ => 0.0,
        }
    }
}

impl FromStr for WaveletFamily {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let family = match s.trim().to_ascii_lowercase().as_str() {
            "haar" => WaveletFamily::Haar,
            "db1" => WaveletFamily::Daubechies(1),
            "db2" => WaveletFamily::Daubechies(2),
            "db3" => WaveletFamily::Daubechies(3),
            "db4" => WaveletFamily::Daubechies(4),
            "sym2" => WaveletFamily::Symlet(2),
            "sym3" => WaveletFamily::Symlet(3),
            "mexh" => WaveletFamily::MexicanHat,
            "morl" => WaveletFamily::Morlet,
            _ => return Err(FilterError::UnsupportedWavelet(s.to_string())),
        };
        Ok(family)
    }
}

impl Display for WaveletFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveletFamily::Haar => write!(f, "haar"),
            WaveletFamily::Daubechies(n) => write!(f, "db{n}"),
            WaveletFamily::Symlet(n) => write!(f, "sym{n}"),
            WaveletFamily::MexicanHat => write!(f, "mexh"),
            WaveletFamily::Morlet => write!(f, "morl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaveletCoefficients {
    /// Single-level DWT; one column per trace.
    Discrete {
        approximation: SampleMatrix,
        detail: SampleMatrix,
    },
    /// CWT indexed as `(scale, sample, trace)`.
    Continuous {
        scales: Vec<usize>,
        coefficients: Array3<f64>,
    },
}

impl Display for WaveletCoefficients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaveletCoefficients::Discrete {
                approximation,
                detail,
            } => write!(
                f,
                "approximation {}x{}, detail {}x{}",
                approximation.nrows(),
                approximation.ncols(),
                detail.nrows(),
                detail.ncols()
            ),
            WaveletCoefficients::Continuous {
                scales,
                coefficients,
            } => {
                let (_, rows, cols) = coefficients.dim();
                write!(f, "{} scales of {rows}x{cols}", scales.len())
            }
        }
    }
}

/// Decomposes every trace of `data` with the named wavelet family.
pub fn wavelet_coefficients(data: &SampleMatrix, family: &str) -> Result<WaveletCoefficients> {
    let family: WaveletFamily = family.parse()?;

    if let Some(rec_lo) = family.rec_lo() {
        let dec_lo: Vec<f64> = rec_lo.iter().rev().copied().collect();
        let dec_hi: Vec<f64> = rec_lo
            .iter()
            .enumerate()
            .map(|(k, &c)| if k % 2 == 0 { -c } else { c })
            .collect();

        let out_len = dwt_len(data.nrows(), rec_lo.len());
        let mut approximation = Array2::zeros((out_len, data.ncols()));
        let mut detail = Array2::zeros((out_len, data.ncols()));

        for (col, trace) in data.axis_iter(Axis(1)).enumerate() {
            approximation
                .column_mut(col)
                .assign(&ndarray::Array1::from(downsample(trace, &dec_lo)));
            detail
                .column_mut(col)
                .assign(&ndarray::Array1::from(downsample(trace, &dec_hi)));
        }

        return Ok(WaveletCoefficients::Discrete {
            approximation,
            detail,
        });
    }

    if family.is_discrete() {
        bail!(FilterError::UnsupportedWavelet(family.to_string()));
    }

    let rows = data.nrows();
    let scales: Vec<usize> = (1..=rows.min(MAX_CWT_SCALES)).collect();
    let mut coefficients = Array3::zeros((scales.len(), rows, data.ncols()));

    for (si, &scale) in scales.iter().enumerate() {
        let s = scale as f64;
        let reach = (CWT_SUPPORT * s).ceil() as usize;
        let norm = 1.0 / s.sqrt();
        for (col, trace) in data.axis_iter(Axis(1)).enumerate() {
            for b in 0..rows {
                let lo = b.saturating_sub(reach);
                let hi = (b + reach + 1).min(rows);
                let sum: f64 = (lo..hi)
                    .map(|n| trace[n] * family.psi((n as f64 - b as f64) / s))
                    .sum();
                coefficients[[si, b, col]] = norm * sum;
            }
        }
    }

    Ok(WaveletCoefficients::Continuous {
        scales,
        coefficients,
    })
}

/// Output length of a single-level DWT with symmetric extension.
pub fn dwt_len(samples: usize, taps: usize) -> usize {
    if samples == 0 {
        0
    } else {
        (samples + taps - 1) / 2
    }
}

/// Convolves with `filter` and keeps every odd-indexed output, reading past
/// the ends by half-sample symmetric reflection.
fn downsample(signal: ArrayView1<f64>, filter: &[f64]) -> Vec<f64> {
    let n = signal.len() as isize;
    let reflect = |idx: isize| -> f64 {
        let m = idx.rem_euclid(2 * n);
        let m = if m < n { m } else { 2 * n - 1 - m };
        signal[m as usize]
    };

    (0..dwt_len(signal.len(), filter.len()))
        .map(|k| {
            filter
                .iter()
                .enumerate()
                .map(|(j, &f)| f * reflect(2 * k as isize + 1 - j as isize))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn coeffs(result: WaveletCoefficients) -> (SampleMatrix, SampleMatrix) {
        match result {
            WaveletCoefficients::Discrete {
                approximation,
                detail,
            } => (approximation, detail),
            other => panic!("expected discrete coefficients, got {other}"),
        }
    }

    #[test]
    fn haar_pairs() -> Result<()> {
        let data = array![[1.0], [2.0], [3.0], [4.0]];
        let (a, d) = coeffs(wavelet_coefficients(&data, "haar")?);
        assert_eq!(a.dim(), (2, 1));
        assert!((a[[0, 0]] - 3.0 * FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((a[[1, 0]] - 7.0 * FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((d[[0, 0]] + FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((d[[1, 0]] + FRAC_1_SQRT_2).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn symmetric_extension_repeats_edge() -> Result<()> {
        let data = array![[1.0], [2.0], [3.0]];
        let (a, _) = coeffs(wavelet_coefficients(&data, "db1")?);
        assert!((a[[1, 0]] - 6.0 * FRAC_1_SQRT_2).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn constant_trace_has_no_detail() -> Result<()> {
        let data = Array2::from_elem((17, 3), 2.5);
        for family in ["db2", "db3", "db4", "sym2", "sym3"] {
            let (a, d) = coeffs(wavelet_coefficients(&data, family)?);
            let taps = family[family.len() - 1..].parse::<usize>()? * 2;
            assert_eq!(a.dim(), (dwt_len(17, taps), 3));
            assert!(d.iter().all(|v| v.abs() < 1e-9), "{family}");
            assert!(
                a.iter().all(|v| (v - 2.5 * 2f64.sqrt()).abs() < 1e-9),
                "{family}"
            );
        }
        Ok(())
    }

    #[test]
    fn input_is_not_modified() -> Result<()> {
        let data = Array2::from_shape_fn((10, 4), |(r, c)| (r + c) as f64);
        let before = data.clone();
        wavelet_coefficients(&data, "db2")?;
        wavelet_coefficients(&data, "mexh")?;
        assert_eq!(data, before);
        Ok(())
    }

    #[test]
    fn continuous_scales_are_bounded() -> Result<()> {
        let short = Array2::from_elem((8, 2), 1.0);
        match wavelet_coefficients(&short, "morl")? {
            WaveletCoefficients::Continuous {
                scales,
                coefficients,
            } => {
                assert_eq!(scales, (1..=8).collect::<Vec<_>>());
                assert_eq!(coefficients.dim(), (8, 8, 2));
            }
            other => panic!("expected continuous coefficients, got {other}"),
        }

        let long = Array2::zeros((64, 1));
        match wavelet_coefficients(&long, "mexh")? {
            WaveletCoefficients::Continuous {
                scales,
                coefficients,
            } => {
                assert_eq!(scales.len(), MAX_CWT_SCALES);
                assert!(coefficients.iter().all(|&v| v == 0.0));
            }
            other => panic!("expected continuous coefficients, got {other}"),
        }
        Ok(())
    }

    #[test]
    fn mexican_hat_peaks_on_impulse() -> Result<()> {
        let mut data = Array2::zeros((21, 1));
        data[[10, 0]] = 1.0;
        if let WaveletCoefficients::Continuous { coefficients, .. } =
            wavelet_coefficients(&data, "mexh")?
        {
            let at_scale_1 = coefficients.index_axis(Axis(0), 0);
            assert!(at_scale_1[[10, 0]] > at_scale_1[[9, 0]]);
            assert!((at_scale_1[[9, 0]] - at_scale_1[[11, 0]]).abs() < 1e-12);
        } else {
            panic!("expected continuous coefficients");
        }
        Ok(())
    }

    #[test]
    fn unknown_family() {
        let err = wavelet_coefficients(&Array2::zeros((4, 1)), "bior1.3").unwrap_err();
        assert_eq!(
            err.downcast_ref::<FilterError>(),
            Some(&FilterError::UnsupportedWavelet("bior1.3".to_string()))
        );
        assert_eq!("DB3".parse::<WaveletFamily>(), Ok(WaveletFamily::Daubechies(3)));
    }
}
