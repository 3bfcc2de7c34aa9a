//! Single-channel 2D sample grid

use crate::image_pipeline::common::error::{CalibrationError, Result};

/// Row-major grid of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    /// Width in samples
    pub width: usize,
    /// Height in samples
    pub height: usize,
    /// Samples, `width * height` long
    pub data: Vec<T>,
}

/// Bayer mosaic at native sensor resolution. Pixel sites by (row, column)
/// parity: (even, even) green, (even, odd) blue, (odd, even) red,
/// (odd, odd) green.
pub type BayerPlane = Plane<u16>;

/// Floating-point plane used for accumulations and dark-subtracted frames.
pub type FloatPlane = Plane<f64>;

impl<T: Copy> Plane<T> {
    pub fn new(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CalibrationError::InvalidLength {
                context: format!("{}x{} plane", width, height),
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Plane<U> {
        Plane {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn ensure_same_size<U>(&self, other: &Plane<U>) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(CalibrationError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: other.width,
                actual_height: other.height,
            });
        }
        Ok(())
    }
}

impl<T: Copy + Into<f64>> Plane<T> {
    pub fn to_f64(&self) -> FloatPlane {
        self.map(Into::into)
    }
}

impl FloatPlane {
    /// Casts back to the unsigned working range. Fractions are truncated and
    /// out-of-range values saturate.
    pub fn to_u16(&self) -> BayerPlane {
        self.map(|v| v as u16)
    }

    pub fn min_max(&self) -> (f64, f64) {
        min_max(&self.data)
    }
}

impl BayerPlane {
    pub fn min_max(&self) -> (u16, u16) {
        self.data
            .iter()
            .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Linearly maps `[min, max]` of `values` onto `[0, upper]`. `None` when
/// the values have no dynamic range.
pub(crate) fn stretch(values: &[f64], upper: f64) -> Option<Vec<f64>> {
    let (lo, hi) = min_max(values);
    let span = hi - lo;
    if !(span > 0.0) || !span.is_finite() {
        return None;
    }
    let scale = upper / span;
    Some(values.iter().map(|&v| (v - lo) * scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_length() {
        let result = Plane::new(4, 2, vec![0u16; 7]);
        assert!(matches!(
            result,
            Err(CalibrationError::InvalidLength { expected: 8, actual: 7, .. })
        ));
    }

    #[test]
    fn to_u16_truncates_and_saturates() {
        let plane = Plane::new(4, 1, vec![1.9, -3.0, 70000.0, 102.0]).unwrap();
        assert_eq!(plane.to_u16().data, vec![1, 0, u16::MAX, 102]);
    }

    #[test]
    fn from_fn_is_row_major() {
        let plane = Plane::from_fn(3, 2, |x, y| (y * 10 + x) as u16);
        assert_eq!(plane.row(1), &[10, 11, 12]);
        assert_eq!(plane.get(2, 0), 2);
    }

    #[test]
    fn stretch_maps_extremes_to_bounds() {
        assert_eq!(stretch(&[2.0, 4.0, 3.0], 10.0), Some(vec![0.0, 10.0, 5.0]));
        assert_eq!(stretch(&[7.0, 7.0], 10.0), None);
    }
}
