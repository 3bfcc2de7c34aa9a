//! Percentile clipping color balance

use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::stretch;
use crate::image_pipeline::debayer::types::{ColorImage, WORKING_MAX, WorkingRange};

/// Saturates `percent / 2` of the samples at each end of every channel,
/// then stretches the channel to the 16-bit working range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBalancer {
    percent: f64,
}

impl ColorBalancer {
    /// `percent` must lie strictly between 0 and 100.
    pub fn new(percent: f64) -> Result<Self> {
        if !(percent > 0.0 && percent < 100.0) {
            return Err(CalibrationError::ValidationError(format!(
                "color balance percent must be in (0, 100), got {}",
                percent
            )));
        }
        Ok(Self { percent })
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    #[instrument(skip_all, fields(percent = self.percent, width = image.width, height = image.height))]
    pub fn balance(&self, image: &ColorImage) -> Result<ColorImage> {
        let half = self.percent / 200.0;
        let mut planes: [Vec<f64>; 3] = Default::default();
        for (out, channel) in planes.iter_mut().zip(image.channels()) {
            *out = balance_channel(channel, half);
        }
        ColorImage::new(image.width, image.height, planes, WorkingRange::Working16)
    }
}

fn balance_channel(channel: &[f64], half: f64) -> Vec<f64> {
    let n = channel.len();
    if n == 0 {
        return Vec::new();
    }

    let mut sorted = channel.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);
    let low = sorted[((n as f64 * half).floor() as usize).min(n - 1)];
    let high = sorted[((n as f64 * (1.0 - half)).ceil() as usize).min(n - 1)];
    debug!(low, high, "Channel percentiles");

    let clipped: Vec<f64> = channel.iter().map(|&v| v.max(low).min(high)).collect();
    // a flat channel normalizes to zero
    stretch(&clipped, WORKING_MAX).unwrap_or_else(|| vec![0.0; n])
}

pub fn color_balance(image: &ColorImage, percent: f64) -> Result<ColorImage> {
    ColorBalancer::new(percent)?.balance(image)
}
