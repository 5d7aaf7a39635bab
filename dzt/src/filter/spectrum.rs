//! Two-dimensional frequency transform.

use ndarray::{Array1, Array2, ArrayView1};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

use crate::structs::dataset::SampleMatrix;

/// Real part of the 2-D FFT of a real matrix.
///
/// Traces are transformed with a real-input FFT, keeping the
/// `cols / 2 + 1` non-negative bins, and the result is then transformed
/// along the sample axis. The output is `rows x (cols / 2 + 1)` and holds
/// frequency-domain values.
pub fn frequency_transform(data: &SampleMatrix) -> SampleMatrix {
    let (rows, cols) = data.dim();
    if rows == 0 || cols == 0 {
        return Array2::zeros((rows, 0));
    }
    let bins = cols / 2 + 1;

    let mut planner = FftPlanner::<f64>::new();
    let across = planner.plan_fft_forward(cols);
    let down = planner.plan_fft_forward(rows);

    let mut spectrum = Array2::<Complex64>::zeros((rows, bins));
    let mut buffer = vec![Complex64::default(); cols];
    for (row, mut out) in data.rows().into_iter().zip(spectrum.rows_mut()) {
        for (slot, &v) in buffer.iter_mut().zip(row) {
            *slot = Complex64::new(v, 0.0);
        }
        across.process(&mut buffer);
        out.assign(&ArrayView1::from(&buffer[..bins]));
    }

    let mut column = vec![Complex64::default(); rows];
    for mut bin in spectrum.columns_mut() {
        for (slot, &v) in column.iter_mut().zip(bin.iter()) {
            *slot = v;
        }
        down.process(&mut column);
        bin.assign(&Array1::from_vec(column.clone()));
    }

    spectrum.mapv(|c| c.re)
}
