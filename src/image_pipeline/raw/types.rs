//! Sensor geometry of the packed capture block

use crate::image_pipeline::common::error::{CalibrationError, Result};

/// Packed samples per group.
pub const SAMPLES_PER_GROUP: usize = 4;
/// Bytes per packed group: four high bytes plus one byte of low bits.
pub const BYTES_PER_GROUP: usize = 5;

/// Layout of the raw block appended to a Bayer capture.
///
/// The block starts with a `header_bytes` long header followed by
/// `buffer_rows` rows of `stride` bytes. Only the top-left
/// `width` x `height` pixels are active; the rest is padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMode {
    pub header_bytes: usize,
    pub stride: usize,
    pub buffer_rows: usize,
    pub width: usize,
    pub height: usize,
}

impl SensorMode {
    /// Raspberry Pi camera v2 (IMX219) full-resolution still mode.
    pub const PI_V2_FULL: SensorMode = SensorMode {
        header_bytes: 32768,
        stride: 4128,
        buffer_rows: 2480,
        width: 3296,
        height: 2464,
    };

    pub fn new(
        header_bytes: usize,
        stride: usize,
        buffer_rows: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        let mode = Self {
            header_bytes,
            stride,
            buffer_rows,
            width,
            height,
        };
        mode.validate()?;
        Ok(mode)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CalibrationError::ValidationError(format!(
                "sensor mode has empty active area {}x{}",
                self.width, self.height
            )));
        }
        // Demosaicing works on whole 2x2 blocks and unpacking on whole groups.
        if self.width % SAMPLES_PER_GROUP != 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(CalibrationError::ValidationError(format!(
                "active area {}x{} must have a width divisible by {} and an even height",
                self.width, self.height, SAMPLES_PER_GROUP
            )));
        }
        if self.packed_row_len() > self.stride {
            return Err(CalibrationError::ValidationError(format!(
                "packed row of {} bytes exceeds stride {}",
                self.packed_row_len(),
                self.stride
            )));
        }
        if self.height > self.buffer_rows {
            return Err(CalibrationError::ValidationError(format!(
                "active height {} exceeds buffer rows {}",
                self.height, self.buffer_rows
            )));
        }
        Ok(())
    }

    /// Bytes of one active row, packing column included.
    pub fn packed_row_len(&self) -> usize {
        self.width / SAMPLES_PER_GROUP * BYTES_PER_GROUP
    }

    /// Exact length of a raw block in this mode.
    pub fn raw_block_len(&self) -> usize {
        self.header_bytes + self.stride * self.buffer_rows
    }

    /// Width and height of the demosaiced image.
    pub fn half_resolution(&self) -> (usize, usize) {
        (self.width / 2, self.height / 2)
    }

    /// Byte length of an unpacked `.data` frame.
    pub fn data_file_len(&self) -> usize {
        self.width * self.height * std::mem::size_of::<u16>()
    }
}

impl Default for SensorMode {
    fn default() -> Self {
        Self::PI_V2_FULL
    }
}
