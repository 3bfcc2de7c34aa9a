//! Reduction to 8-bit display images.
//!
//! The two conversions belong to different working ranges and are not
//! interchangeable: `Working16` images are divided by 256, `Unit` images are
//! min-max stretched.

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::min_max;
use crate::image_pipeline::debayer::types::{ColorImage, Rgb8Image, WorkingRange};

fn ensure_range(image: &ColorImage, range: WorkingRange) -> Result<()> {
    if image.range != range {
        return Err(CalibrationError::ValidationError(format!(
            "display conversion for {:?} images called on a {:?} image",
            range, image.range
        )));
    }
    Ok(())
}

/// `floor(v / 256)` clipped to 0..=255.
pub fn to_rgb8_scaled(image: &ColorImage) -> Result<Rgb8Image> {
    ensure_range(image, WorkingRange::Working16)?;
    let data = image
        .to_interleaved()
        .into_iter()
        .map(|v| (v / 256.0).floor().clamp(0.0, 255.0) as u8)
        .collect();
    Ok(Rgb8Image {
        width: image.width,
        height: image.height,
        data,
    })
}

/// Subtracts the global minimum and scales the maximum to 255, truncating.
pub fn to_rgb8_stretched(image: &ColorImage) -> Result<Rgb8Image> {
    ensure_range(image, WorkingRange::Unit)?;
    let samples = image.to_interleaved();
    let (lo, hi) = min_max(&samples);
    let span = hi - lo;
    if !(span > 0.0) {
        return Err(CalibrationError::NumericError(
            "cannot stretch an image without dynamic range".to_string(),
        ));
    }
    let data = samples
        .into_iter()
        .map(|v| ((v - lo) * (255.0 / span)) as u8)
        .collect();
    Ok(Rgb8Image {
        width: image.width,
        height: image.height,
        data,
    })
}

/// Picks the conversion matching the image's working range.
pub fn to_rgb8(image: &ColorImage) -> Result<Rgb8Image> {
    match image.range {
        WorkingRange::Working16 => to_rgb8_scaled(image),
        WorkingRange::Unit => to_rgb8_stretched(image),
    }
}
