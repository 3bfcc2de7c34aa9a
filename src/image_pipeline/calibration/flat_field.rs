//! Harmonic flat-field model
//!
//! Each channel's vignetting profile is described by a second order Fourier
//! series `f(x) = a0 + a1 cos(wx) + b1 sin(wx) + a2 cos(2wx) + b2 sin(2wx)`
//! fitted per channel.

use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::stretch;
use crate::image_pipeline::debayer::types::{ColorImage, WORKING_MAX, WorkingRange};

/// Coefficients of one channel's correction curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatFieldCurve {
    pub a0: f64,
    pub a1: f64,
    pub b1: f64,
    pub a2: f64,
    pub b2: f64,
    pub w: f64,
}

impl FlatFieldCurve {
    pub const RED: FlatFieldCurve = FlatFieldCurve {
        a0: -1.234,
        a1: 1.962,
        b1: -1.751,
        a2: 0.2604,
        b2: 0.07941,
        w: -0.0007905,
    };
    pub const GREEN: FlatFieldCurve = FlatFieldCurve {
        a0: 0.4900,
        a1: 0.4123,
        b1: 0.1851,
        a2: 0.09083,
        b2: -0.05701,
        w: 0.001312,
    };
    pub const BLUE: FlatFieldCurve = FlatFieldCurve {
        a0: 0.4935,
        a1: 0.4216,
        b1: 0.1736,
        a2: 0.08101,
        b2: -0.06155,
        w: 0.001284,
    };

    pub fn eval(&self, x: f64) -> f64 {
        let wx = self.w * x;
        self.a0
            + self.a1 * wx.cos()
            + self.b1 * wx.sin()
            + self.a2 * (2.0 * wx).cos()
            + self.b2 * (2.0 * wx).sin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatFieldModel {
    /// Red, green, blue
    pub curves: [FlatFieldCurve; 3],
}

impl Default for FlatFieldModel {
    fn default() -> Self {
        Self {
            curves: [FlatFieldCurve::RED, FlatFieldCurve::GREEN, FlatFieldCurve::BLUE],
        }
    }
}

const CHANNEL_NAMES: [&str; 3] = ["red", "green", "blue"];

fn normalize(values: &[f64], upper: f64, channel: &str) -> Result<Vec<f64>> {
    stretch(values, upper).ok_or_else(|| {
        CalibrationError::NumericError(format!(
            "{} channel has no dynamic range to normalize",
            channel
        ))
    })
}

impl FlatFieldModel {
    pub fn new(curves: [FlatFieldCurve; 3]) -> Self {
        Self { curves }
    }

    /// Evaluates each channel's curve on the reference values and stretches
    /// the result to `[0, 65535]`. Values are not rounded.
    #[instrument(skip_all, fields(width = reference.width, height = reference.height))]
    pub fn generate_field(&self, reference: &ColorImage) -> Result<ColorImage> {
        let mut planes: [Vec<f64>; 3] = Default::default();
        for (((out, values), curve), name) in planes
            .iter_mut()
            .zip(reference.channels())
            .zip(&self.curves)
            .zip(CHANNEL_NAMES)
        {
            let evaluated: Vec<f64> = values.iter().map(|&x| curve.eval(x)).collect();
            *out = normalize(&evaluated, WORKING_MAX, name)?;
        }
        debug!("Generated flat field");
        ColorImage::new(reference.width, reference.height, planes, WorkingRange::Working16)
    }

    /// Field of a synthetic all-ones white frame. An all-ones reference has
    /// zero dynamic range, so normalization fails with a `NumericError`.
    pub fn generate_uniform_field(&self, width: usize, height: usize) -> Result<ColorImage> {
        let reference = ColorImage::filled(width, height, 1.0, WorkingRange::Unit);
        self.generate_field(&reference)
    }

    /// Direct flat-fielding: each channel is normalized to `[0, 1]`, passed
    /// through its curve and stretched to `[0, 65535]`, rounded.
    #[instrument(skip_all, fields(width = frame.width, height = frame.height))]
    pub fn apply(&self, frame: &ColorImage) -> Result<ColorImage> {
        let mut planes: [Vec<f64>; 3] = Default::default();
        for (((out, values), curve), name) in planes
            .iter_mut()
            .zip(frame.channels())
            .zip(&self.curves)
            .zip(CHANNEL_NAMES)
        {
            let unit = normalize(values, 1.0, name)?;
            let corrected: Vec<f64> = unit.into_iter().map(|x| curve.eval(x)).collect();
            *out = normalize(&corrected, WORKING_MAX, name)?
                .into_iter()
                .map(f64::round)
                .collect();
        }
        debug!("Applied flat field");
        ColorImage::new(frame.width, frame.height, planes, WorkingRange::Working16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> ColorImage {
        let n = width * height;
        let ramp: Vec<f64> = (0..n).map(|i| i as f64 * 100.0).collect();
        let reversed: Vec<f64> = ramp.iter().rev().copied().collect();
        ColorImage::new(
            width,
            height,
            [ramp.clone(), reversed, ramp],
            WorkingRange::Working16,
        )
        .unwrap()
    }

    #[test]
    fn curve_at_zero_is_sum_of_cosine_terms() {
        let c = FlatFieldCurve::GREEN;
        assert!((c.eval(0.0) - (c.a0 + c.a1 + c.a2)).abs() < 1e-12);
    }

    #[test]
    fn generated_field_spans_working_range() {
        let field = FlatFieldModel::default().generate_field(&gradient(4, 3)).unwrap();
        assert_eq!(field.range, WorkingRange::Working16);
        for channel in field.channels() {
            let lo = channel.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = channel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(lo, 0.0);
            assert!((hi - WORKING_MAX).abs() < 1e-6);
            assert!(channel.iter().all(|&v| (0.0..=WORKING_MAX + 1e-6).contains(&v)));
        }
    }

    #[test]
    fn uniform_reference_has_no_dynamic_range() {
        let result = FlatFieldModel::default().generate_uniform_field(8, 4);
        assert!(matches!(result, Err(CalibrationError::NumericError(_))));
    }

    #[test]
    fn apply_rounds_into_working_range() {
        let out = FlatFieldModel::default().apply(&gradient(4, 3)).unwrap();
        for channel in out.channels() {
            assert!(channel.iter().all(|&v| v.fract() == 0.0));
            assert!(channel.iter().all(|&v| (0.0..=WORKING_MAX).contains(&v)));
            assert!(channel.contains(&0.0));
            assert!(channel.contains(&WORKING_MAX));
        }
    }

    #[test]
    fn apply_rejects_flat_channel() {
        let mut frame = gradient(4, 3);
        frame.blue = vec![5.0; 12];
        assert!(matches!(
            FlatFieldModel::default().apply(&frame),
            Err(CalibrationError::NumericError(_))
        ));
    }
}
