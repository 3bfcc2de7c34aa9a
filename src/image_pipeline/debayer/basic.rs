//! Block-local demosaicing at 16-bit working precision.
//!
//! Each 2x2 Bayer block becomes one output pixel; no neighbourhood
//! interpolation is done.

use tracing::debug;

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::BayerPlane;
use crate::image_pipeline::debayer::types::{
    ColorImage, WORKING_MAX, WhiteBalanceGains, WorkingRange,
};

const UINT14_MAX: u32 = (1 << 14) - 1;

pub(crate) fn ensure_bayer_geometry(plane: &BayerPlane) -> Result<()> {
    if plane.is_empty() || plane.width % 2 != 0 || plane.height % 2 != 0 {
        return Err(CalibrationError::ValidationError(format!(
            "Bayer plane must have non-zero even dimensions, got {}x{}",
            plane.width, plane.height
        )));
    }
    if plane.len() != plane.width * plane.height {
        return Err(CalibrationError::InvalidLength {
            context: format!("{}x{} Bayer plane", plane.width, plane.height),
            expected: plane.width * plane.height,
            actual: plane.len(),
        });
    }
    Ok(())
}

/// Black level subtraction, 14-bit rescale, white balance and a two bit shift
/// up to the 16-bit working range.
pub fn demosaic_basic(plane: &BayerPlane, gains: WhiteBalanceGains) -> Result<ColorImage> {
    ensure_bayer_geometry(plane)?;

    let (black, saturation) = plane.min_max();
    if saturation == black {
        return Err(CalibrationError::NumericError(format!(
            "Bayer plane has no dynamic range (every sample is {})",
            black
        )));
    }
    // Integer factor, so the observed maximum lands at or just below 14 bits.
    let factor = UINT14_MAX / u32::from(saturation - black);
    let uint14_max = f64::from(UINT14_MAX);
    debug!(black, saturation, factor, "Rescaling Bayer plane to 14 bits");

    let width = plane.width;
    let scaled: Vec<f64> = plane
        .data
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let (x, y) = (i % width, i / width);
            let rescaled = (u32::from(v - black) * factor).min(UINT14_MAX) as f64;
            let gain = match (y % 2, x % 2) {
                (0, 1) => gains.blue,
                (1, 0) => gains.red,
                _ => 1.0,
            };
            (rescaled * gain).clamp(0.0, uint14_max) * 4.0
        })
        .collect();

    let (out_w, out_h) = (plane.width / 2, plane.height / 2);
    let mut red = Vec::with_capacity(out_w * out_h);
    let mut green = Vec::with_capacity(out_w * out_h);
    let mut blue = Vec::with_capacity(out_w * out_h);

    for by in 0..out_h {
        let top = &scaled[2 * by * width..(2 * by + 1) * width];
        let bottom = &scaled[(2 * by + 1) * width..(2 * by + 2) * width];
        for bx in 0..out_w {
            let x = 2 * bx;
            blue.push(top[x + 1]);
            red.push(bottom[x]);
            let g = (top[x] / 2.0).floor() + (bottom[x + 1] / 2.0).floor();
            green.push(g.clamp(0.0, WORKING_MAX));
        }
    }

    ColorImage::new(out_w, out_h, [red, green, blue], WorkingRange::Working16)
}
