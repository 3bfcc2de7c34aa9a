//! Bit-exact conversion between the 10-bit packed raw block and a Bayer plane.
//!
//! Every group of five bytes carries four samples: bytes 0..4 hold the upper
//! eight bits of each sample and byte 4 holds the two low bits of all four,
//! sample 0 in the most significant pair.

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::BayerPlane;
use crate::image_pipeline::raw::types::{BYTES_PER_GROUP, SAMPLES_PER_GROUP, SensorMode};

#[inline]
fn low_bits_shift(sample: usize) -> u32 {
    (6 - 2 * sample) as u32
}

/// Unpacks one active row. `packed` must hold `out.len() / 4 * 5` bytes.
pub fn unpack_row(packed: &[u8], out: &mut [u16]) {
    for (o, i) in out
        .chunks_exact_mut(SAMPLES_PER_GROUP)
        .zip(packed.chunks_exact(BYTES_PER_GROUP))
    {
        let low = i[4];
        for k in 0..SAMPLES_PER_GROUP {
            o[k] = ((i[k] as u16) << 2) | ((low >> low_bits_shift(k)) & 0b11) as u16;
        }
    }
}

/// Packs one row of 10-bit samples. Bits above the tenth are dropped.
pub fn pack_row(samples: &[u16], out: &mut [u8]) {
    for (o, i) in out
        .chunks_exact_mut(BYTES_PER_GROUP)
        .zip(samples.chunks_exact(SAMPLES_PER_GROUP))
    {
        let mut low = 0u8;
        for k in 0..SAMPLES_PER_GROUP {
            o[k] = ((i[k] >> 2) & 0xff) as u8;
            low |= ((i[k] & 0b11) as u8) << low_bits_shift(k);
        }
        o[4] = low;
    }
}

/// Unpacks a complete raw block into the active area of `mode`.
pub fn unpack(bytes: &[u8], mode: &SensorMode) -> Result<BayerPlane> {
    mode.validate()?;
    let expected = mode.raw_block_len();
    if bytes.len() != expected {
        return Err(CalibrationError::InvalidLength {
            context: "raw block".to_string(),
            expected,
            actual: bytes.len(),
        });
    }

    let packed_len = mode.packed_row_len();
    let mut data = vec![0u16; mode.width * mode.height];
    for (row, line) in data.chunks_exact_mut(mode.width).enumerate() {
        let start = mode.header_bytes + row * mode.stride;
        unpack_row(&bytes[start..start + packed_len], line);
    }

    Ok(BayerPlane {
        width: mode.width,
        height: mode.height,
        data,
    })
}

/// Inverse of [`unpack`]. Header and padding bytes are zero.
pub fn pack(plane: &BayerPlane, mode: &SensorMode) -> Result<Vec<u8>> {
    mode.validate()?;
    if plane.width != mode.width || plane.height != mode.height {
        return Err(CalibrationError::DimensionMismatch {
            expected_width: mode.width,
            expected_height: mode.height,
            actual_width: plane.width,
            actual_height: plane.height,
        });
    }

    let packed_len = mode.packed_row_len();
    let mut bytes = vec![0u8; mode.raw_block_len()];
    for (row, line) in plane.data.chunks_exact(mode.width).enumerate() {
        let start = mode.header_bytes + row * mode.stride;
        pack_row(line, &mut bytes[start..start + packed_len]);
    }
    Ok(bytes)
}

/// Returns the raw block at the tail of a JPEG+raw capture stream.
pub fn extract_raw_block<'a>(stream: &'a [u8], mode: &SensorMode) -> Result<&'a [u8]> {
    let len = mode.raw_block_len();
    if stream.len() < len {
        return Err(CalibrationError::FormatError(format!(
            "capture stream of {} bytes is shorter than the {} byte raw block",
            stream.len(),
            len
        )));
    }
    Ok(&stream[stream.len() - len..])
}
