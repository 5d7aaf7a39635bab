//! Horizontal background removal.

use ndarray::{Array1, ArrayView1, Axis};

use crate::structs::dataset::SampleMatrix;

/// Subtracts each row's mean across all traces.
///
/// When `1 < window < traces` a centered moving average of `window` traces
/// (zero outside the section) is subtracted afterwards as well. Windows
/// below 3 are raised to 3 and even windows are widened by one.
pub fn remove_background(mut data: SampleMatrix, window: usize) -> SampleMatrix {
    let traces = data.ncols();
    if traces == 0 {
        return data;
    }

    for mut row in data.axis_iter_mut(Axis(0)) {
        let mean = row.sum() / traces as f64;
        row.mapv_inplace(|v| v - mean);
    }

    if window > 1 && window < traces {
        let window = effective_window(window);
        for mut row in data.axis_iter_mut(Axis(0)) {
            let average = moving_average(row.view(), window);
            row -= &average;
        }
    }

    data
}

/// The boxcar width actually applied for a requested window.
pub fn effective_window(window: usize) -> usize {
    if window < 3 {
        3
    } else if window % 2 == 0 {
        window + 1
    } else {
        window
    }
}

/// Centered boxcar of odd width `size`, treating samples past either end
/// as zero.
fn moving_average(row: ArrayView1<f64>, size: usize) -> Array1<f64> {
    let n = row.len();
    let half = size / 2;

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &v in row {
        prefix.push(prefix[prefix.len() - 1] + v);
    }

    Array1::from_shape_fn(n, |j| {
        let lo = j.saturating_sub(half);
        let hi = (j + half + 1).min(n);
        (prefix[hi] - prefix[lo]) / size as f64
    })
}
