//! Grayscale radargram images.

use std::path::Path;

use anyhow::{Context, Result, ensure};
use image::{GrayImage, ImageFormat, Luma};

use dzt::structs::dataset::{Dataset, SampleMatrix};

/// Number of standard deviations either side of the mean mapped to black
/// and white.
pub const CONTRAST_SIGMA: f64 = 3.0;

/// Color limits `mean ± 3σ` over the finite values of `data`.
pub fn color_limits(data: &SampleMatrix) -> (f64, f64) {
    let (count, sum) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let var = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    let spread = CONTRAST_SIGMA * var.sqrt();
    (mean - spread, mean + spread)
}

fn to_gray(value: f64, (lo, hi): (f64, f64)) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    if hi <= lo {
        return 128;
    }
    ((value - lo) / (hi - lo) * 255.0).clamp(0.0, 255.0).round() as u8
}

/// Renders every channel with its own limits, stacked top to bottom.
pub fn render(dataset: &Dataset) -> Result<GrayImage> {
    let width = dataset.traces();
    let height: usize = dataset.channels().iter().map(|c| c.samples()).sum();
    ensure!(
        width > 0 && height > 0,
        "Cannot render an empty dataset ({}x{})",
        height,
        width
    );

    let mut img = GrayImage::new(u32::try_from(width)?, u32::try_from(height)?);
    let mut top = 0u32;
    for channel in dataset.channels() {
        let limits = color_limits(&channel.data);
        for ((row, col), &value) in channel.data.indexed_iter() {
            img.put_pixel(col as u32, top + row as u32, Luma([to_gray(value, limits)]));
        }
        top += channel.samples() as u32;
    }

    Ok(img)
}

pub fn write_png(dataset: &Dataset, path: &Path) -> Result<()> {
    let img = render(dataset)?;
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write image {}", path.display()))?;
    log::debug!("Wrote {}x{} image to {}", img.width(), img.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dzt::structs::dataset::Channel;
    use dzt::structs::header::ChannelHeader;
    use ndarray::{Array2, array};

    #[test]
    fn limits_are_three_sigma() {
        let (lo, hi) = color_limits(&array![[1.0, -1.0], [1.0, -1.0]]);
        assert!((lo + 3.0).abs() < 1e-12);
        assert!((hi - 3.0).abs() < 1e-12);
    }

    #[test]
    fn flat_channel_is_mid_gray() {
        let limits = color_limits(&Array2::from_elem((2, 2), 5.0));
        assert_eq!(to_gray(5.0, limits), 128);
        assert_eq!(to_gray(f64::NAN, limits), 0);
    }

    #[test]
    fn channels_stack_vertically() -> Result<()> {
        let a = Channel::new(ChannelHeader::default(), array![[-1.0, 1.0], [1.0, -1.0]]);
        let b = Channel::new(ChannelHeader::default(), Array2::zeros((3, 2)));
        let img = render(&Dataset::new(vec![a, b], Vec::new())?)?;

        assert_eq!((img.width(), img.height()), (2, 5));
        assert!(img.get_pixel(0, 0)[0] < 128);
        assert!(img.get_pixel(1, 0)[0] > 128);
        assert_eq!(img.get_pixel(0, 4)[0], 128);
        Ok(())
    }
}
