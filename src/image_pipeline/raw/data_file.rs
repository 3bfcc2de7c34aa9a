//! `.data` frame storage: unpacked samples as flat native-endian u16,
//! row-major, no header.

use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::BayerPlane;
use crate::image_pipeline::raw::reader::FrameReader;
use crate::image_pipeline::raw::types::SensorMode;

const SAMPLE_BYTES: usize = std::mem::size_of::<u16>();

/// Reads unpacked frames of a fixed resolution.
#[derive(Debug, Clone, Copy)]
pub struct DataFileReader {
    width: usize,
    height: usize,
}

impl DataFileReader {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn for_mode(mode: &SensorMode) -> Self {
        Self::new(mode.width, mode.height)
    }
}

impl FrameReader for DataFileReader {
    fn read_frame(&self, data: &[u8]) -> Result<BayerPlane> {
        let expected = self.width * self.height * SAMPLE_BYTES;
        if data.len() != expected {
            return Err(CalibrationError::InvalidLength {
                context: format!("{}x{} data frame", self.width, self.height),
                expected,
                actual: data.len(),
            });
        }

        let samples = data
            .chunks_exact(SAMPLE_BYTES)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();

        Ok(BayerPlane {
            width: self.width,
            height: self.height,
            data: samples,
        })
    }
}

/// Reads a file and decodes it with `reader`.
pub fn read_frame_file<R: FrameReader + ?Sized, P: AsRef<Path>>(
    reader: &R,
    path: P,
) -> Result<BayerPlane> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| CalibrationError::InputReadError(format!("{}: {}", path.display(), e)))?;
    reader.read_frame(&bytes)
}

pub fn encode_data(plane: &BayerPlane) -> Vec<u8> {
    plane.data.iter().flat_map(|&v| v.to_ne_bytes()).collect()
}

pub fn write_data_file<P: AsRef<Path>>(path: P, plane: &BayerPlane) -> Result<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), width = plane.width, height = plane.height, "Writing data frame");

    let mut file = std::fs::File::create(path)
        .map_err(|e| CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
    file.write_all(&encode_data(plane))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_native_endian_samples() {
        let bytes: Vec<u8> = [1u16, 1023, 512, 7]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let plane = DataFileReader::new(2, 2).read_frame(&bytes).unwrap();
        assert_eq!(plane.data, vec![1, 1023, 512, 7]);
    }

    #[test]
    fn rejects_truncated_frame() {
        let result = DataFileReader::new(2, 2).read_frame(&[0u8; 7]);
        assert!(matches!(
            result,
            Err(CalibrationError::InvalidLength { expected: 8, actual: 7, .. })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1_df.data");
        let plane = BayerPlane::from_fn(4, 2, |x, y| (x + 4 * y) as u16 * 100);

        write_data_file(&path, &plane).unwrap();
        let read = read_frame_file(&DataFileReader::new(4, 2), &path).unwrap();
        assert_eq!(read, plane);
    }

    #[test]
    fn missing_file_is_input_read_error() {
        let result = read_frame_file(&DataFileReader::new(4, 2), "/nonexistent/1_df.data");
        assert!(matches!(result, Err(CalibrationError::InputReadError(_))));
    }
}
