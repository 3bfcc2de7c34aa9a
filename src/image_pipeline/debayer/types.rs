//! Types for demosaicing operations

use crate::image_pipeline::common::error::{CalibrationError, Result};

/// Top of the 16-bit working range.
pub const WORKING_MAX: f64 = 65535.0;

/// Value range a [`ColorImage`] is expressed in. Display conversion must
/// match the range, see [`crate::image_pipeline::debayer::display`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingRange {
    /// 0..=65535, produced by basic demosaicing and the calibration stages
    Working16,
    /// 0..=1, produced by the preview model
    Unit,
}

/// Demosaicing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemosaicMode {
    /// Per-frame black level and rescale to 16-bit working precision
    #[default]
    Basic,
    /// Fixed gains, optional color matrix and gamma, resized preview
    Model,
}

/// White balance gains; green is always 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBalanceGains {
    pub red: f64,
    pub blue: f64,
}

impl WhiteBalanceGains {
    pub const UNITY: WhiteBalanceGains = WhiteBalanceGains { red: 1.0, blue: 1.0 };
    /// Gains the preview model falls back to when none are supplied.
    pub const MODEL_DEFAULT: WhiteBalanceGains = WhiteBalanceGains { red: 1.8, blue: 1.3 };

    pub fn new(red: f64, blue: f64) -> Result<Self> {
        for (name, gain) in [("red", red), ("blue", blue)] {
            if !gain.is_finite() || gain <= 0.0 {
                return Err(CalibrationError::ValidationError(format!(
                    "{} gain must be positive and finite, got {}",
                    name, gain
                )));
            }
        }
        Ok(Self { red, blue })
    }
}

impl Default for WhiteBalanceGains {
    fn default() -> Self {
        Self::UNITY
    }
}

/// Three-channel image at half the Bayer resolution, stored as planes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorImage {
    pub width: usize,
    pub height: usize,
    pub red: Vec<f64>,
    pub green: Vec<f64>,
    pub blue: Vec<f64>,
    pub range: WorkingRange,
}

impl ColorImage {
    pub fn new(
        width: usize,
        height: usize,
        [red, green, blue]: [Vec<f64>; 3],
        range: WorkingRange,
    ) -> Result<Self> {
        let expected = width * height;
        for (name, plane) in [("red", &red), ("green", &green), ("blue", &blue)] {
            if plane.len() != expected {
                return Err(CalibrationError::InvalidLength {
                    context: format!("{} channel of {}x{} image", name, width, height),
                    expected,
                    actual: plane.len(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            red,
            green,
            blue,
            range,
        })
    }

    /// Every channel filled with `value`.
    pub fn filled(width: usize, height: usize, value: f64, range: WorkingRange) -> Self {
        let plane = vec![value; width * height];
        Self {
            width,
            height,
            red: plane.clone(),
            green: plane.clone(),
            blue: plane,
            range,
        }
    }

    /// Builds an image from interleaved samples. Only three channels are
    /// accepted.
    pub fn from_interleaved(
        width: usize,
        height: usize,
        channels: usize,
        data: &[f64],
        range: WorkingRange,
    ) -> Result<Self> {
        if channels != 3 {
            return Err(CalibrationError::ValidationError(format!(
                "expected a 3 channel image, got {} channels",
                channels
            )));
        }
        if data.len() != width * height * 3 {
            return Err(CalibrationError::InvalidLength {
                context: format!("{}x{} interleaved RGB image", width, height),
                expected: width * height * 3,
                actual: data.len(),
            });
        }

        let mut planes: [Vec<f64>; 3] = std::array::from_fn(|_| Vec::with_capacity(width * height));
        for pixel in data.chunks_exact(3) {
            for (plane, &v) in planes.iter_mut().zip(pixel) {
                plane.push(v);
            }
        }
        Self::new(width, height, planes, range)
    }

    /// Interleaved [R, G, B, R, G, B, ...] samples.
    pub fn to_interleaved(&self) -> Vec<f64> {
        self.red
            .iter()
            .zip(&self.green)
            .zip(&self.blue)
            .flat_map(|((&r, &g), &b)| [r, g, b])
            .collect()
    }

    pub fn channels(&self) -> [&[f64]; 3] {
        [&self.red, &self.green, &self.blue]
    }

    pub fn channels_mut(&mut self) -> [&mut Vec<f64>; 3] {
        [&mut self.red, &mut self.green, &mut self.blue]
    }

    pub fn pixel(&self, x: usize, y: usize) -> [f64; 3] {
        let i = y * self.width + x;
        [self.red[i], self.green[i], self.blue[i]]
    }
}

/// 8-bit display image
#[derive(Debug, Clone, PartialEq)]
pub struct Rgb8Image {
    pub width: usize,
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

/// Settings of the preview model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Gamma exponent per channel (red, green, blue)
    pub gamma: [f64; 3],
    /// Row-vector color matrix, `out[j] = sum_i in[i] * m[i][j]`
    pub color_matrix: Option<[[f64; 3]; 3]>,
    /// Output width and height; `None` keeps half resolution
    pub output_size: Option<(u32, u32)>,
}

impl ModelOptions {
    /// Camera to RGB matrix from the raspi_dng/dcraw conversion.
    pub const DCRAW_MATRIX: [[f64; 3]; 3] = [
        [1.20, -0.30, 0.00],
        [-0.05, 0.80, 0.14],
        [0.20, 0.20, 0.7],
    ];
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            gamma: [1.0; 3],
            color_matrix: None,
            output_size: None,
        }
    }
}
