//! Quick-look preview model. Not radiometrically meaningful.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};
use tracing::debug;

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::{BayerPlane, min_max};
use crate::image_pipeline::debayer::basic::ensure_bayer_geometry;
use crate::image_pipeline::debayer::types::{
    ColorImage, ModelOptions, WhiteBalanceGains, WorkingRange,
};

const TEN_BIT_MAX: f64 = 1023.0;

pub fn demosaic_model(
    plane: &BayerPlane,
    gains: Option<WhiteBalanceGains>,
    options: &ModelOptions,
) -> Result<ColorImage> {
    ensure_bayer_geometry(plane)?;
    let gains = gains.unwrap_or(WhiteBalanceGains::MODEL_DEFAULT);
    let channel_gain = [gains.red, 1.0, gains.blue];

    let (out_w, out_h) = (plane.width / 2, plane.height / 2);
    let mut channels: [Vec<f64>; 3] = std::array::from_fn(|_| Vec::with_capacity(out_w * out_h));

    for by in 0..out_h {
        let top = plane.row(2 * by);
        let bottom = plane.row(2 * by + 1);
        for bx in 0..out_w {
            let x = 2 * bx;
            let raw = [
                f64::from(bottom[x]),
                (f64::from(top[x]) + f64::from(bottom[x + 1])) / 2.0,
                f64::from(top[x + 1]),
            ];
            let rgb = model_pixel(raw, channel_gain, options);
            for (channel, v) in channels.iter_mut().zip(rgb) {
                channel.push(v);
            }
        }
    }

    // One min/max across all three channels.
    let (lo, hi) = channels
        .iter()
        .map(|c| min_max(c))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), (lo, hi)| (a.min(lo), b.max(hi)));
    if !(hi > lo) {
        return Err(CalibrationError::NumericError(format!(
            "preview has no dynamic range (min {}, max {})",
            lo, hi
        )));
    }
    for channel in channels.iter_mut() {
        for v in channel.iter_mut() {
            *v = (*v - lo) / (hi - lo);
        }
    }

    let image = ColorImage::new(out_w, out_h, channels, WorkingRange::Unit)?;
    match options.output_size {
        Some((w, h)) if (w as usize, h as usize) != (out_w, out_h) => resize_unit(&image, w, h),
        _ => Ok(image),
    }
}

/// Gain, gamma and optional color matrix applied to one (red, green, blue)
/// sample, before normalization.
fn model_pixel(raw: [f64; 3], gain: [f64; 3], options: &ModelOptions) -> [f64; 3] {
    let rgb: [f64; 3] = std::array::from_fn(|c| {
        gain[c] * TEN_BIT_MAX * (raw[c] / TEN_BIT_MAX).powf(options.gamma[c])
    });
    match &options.color_matrix {
        Some(m) => std::array::from_fn(|j| (0..3).map(|i| rgb[i] * m[i][j]).sum()),
        None => rgb,
    }
}

/// Catmull-Rom resize of a unit-range image.
fn resize_unit(image: &ColorImage, width: u32, height: u32) -> Result<ColorImage> {
    if width == 0 || height == 0 {
        return Err(CalibrationError::ValidationError(format!(
            "preview output size must be non-zero, got {}x{}",
            width, height
        )));
    }
    debug!(
        from_width = image.width,
        from_height = image.height,
        width,
        height,
        "Resizing preview"
    );

    let samples: Vec<f32> = image.to_interleaved().iter().map(|&v| v as f32).collect();
    let buffer: ImageBuffer<Rgb<f32>, Vec<f32>> =
        ImageBuffer::from_raw(image.width as u32, image.height as u32, samples).ok_or_else(|| {
            CalibrationError::InvalidLength {
                context: "preview buffer".to_string(),
                expected: image.width * image.height * 3,
                actual: image.red.len() * 3,
            }
        })?;

    let resized = imageops::resize(&buffer, width, height, FilterType::CatmullRom);
    let data: Vec<f64> = resized.into_raw().into_iter().map(|v| f64::from(v).clamp(0.0, 1.0)).collect();
    ColorImage::from_interleaved(width as usize, height as usize, 3, &data, WorkingRange::Unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> BayerPlane {
        BayerPlane::from_fn(8, 4, |x, y| (x * 100 + y * 10) as u16)
    }

    #[test]
    fn output_is_normalized_to_unit_range() {
        let image = demosaic_model(&gradient(), None, &ModelOptions::default()).unwrap();
        assert_eq!((image.width, image.height), (4, 2));
        assert_eq!(image.range, WorkingRange::Unit);

        let all: Vec<f64> = image.to_interleaved();
        let (lo, hi) = min_max(&all);
        assert_eq!(lo, 0.0);
        assert!((hi - 1.0).abs() < 1e-12);
    }

    #[test]
    fn default_gains_weight_red_and_blue() {
        // G B / R G with equal raw values: red 1.8x, blue 1.3x, green 1x.
        let plane = BayerPlane::new(4, 2, vec![0, 0, 100, 100, 0, 0, 100, 100]).unwrap();
        let image = demosaic_model(&plane, None, &ModelOptions::default()).unwrap();
        // Block 0 is all zeros and provides the minimum; block 1 the rest.
        let [r, g, b] = image.pixel(1, 0);
        assert!((r - 1.0).abs() < 1e-12);
        assert!((g - 100.0 / 180.0).abs() < 1e-12);
        assert!((b - 130.0 / 180.0).abs() < 1e-12);
    }

    fn assert_close(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn gamma_is_applied_per_channel() {
        let options = ModelOptions {
            gamma: [2.0, 1.0, 0.5],
            ..ModelOptions::default()
        };
        let rgb = model_pixel([256.0, 256.0, 256.0], [1.8, 1.0, 1.3], &options);
        assert_close(
            rgb,
            [
                1.8 * 256.0 * 256.0 / 1023.0,
                256.0,
                1.3 * 16.0 * 1023f64.sqrt(),
            ],
        );

        // Full scale is a fixed point of every gamma.
        let rgb = model_pixel([1023.0; 3], [1.0; 3], &options);
        assert_close(rgb, [1023.0; 3]);
    }

    #[test]
    fn color_matrix_multiplies_row_vector() {
        let options = ModelOptions {
            color_matrix: Some(ModelOptions::DCRAW_MATRIX),
            ..ModelOptions::default()
        };
        // in = (300, 100, 200):
        // r = 300*1.20 - 100*0.05 + 200*0.20 = 395
        // g = -300*0.30 + 100*0.80 + 200*0.20 = 30
        // b = 100*0.14 + 200*0.70 = 154
        let rgb = model_pixel([300.0, 100.0, 200.0], [1.0; 3], &options);
        assert_close(rgb, [395.0, 30.0, 154.0]);

        // G B / R G; block 0 is black and block 1 carries the sample above.
        let plane = BayerPlane::new(4, 2, vec![0, 0, 100, 200, 0, 0, 300, 100]).unwrap();
        let image = demosaic_model(&plane, Some(WhiteBalanceGains::UNITY), &options).unwrap();
        assert_close(image.pixel(0, 0), [0.0; 3]);
        assert_close(image.pixel(1, 0), [1.0, 30.0 / 395.0, 154.0 / 395.0]);
    }

    #[test]
    fn resizes_to_requested_output() {
        let options = ModelOptions {
            output_size: Some((8, 4)),
            ..ModelOptions::default()
        };
        let image = demosaic_model(&gradient(), None, &options).unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        assert!(image.to_interleaved().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn flat_input_is_numeric_error() {
        let plane = BayerPlane::filled(4, 4, 0);
        assert!(matches!(
            demosaic_model(&plane, None, &ModelOptions::default()),
            Err(CalibrationError::NumericError(_))
        ));
    }
}
