//! Reader for raw captures straight from the camera.
//!
//! Accepts either the bare raw block or a complete JPEG+raw capture stream,
//! in which case the raw block is taken from the tail of the stream.

use tracing::debug;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::plane::BayerPlane;
use crate::image_pipeline::raw::reader::FrameReader;
use crate::image_pipeline::raw::types::SensorMode;
use crate::image_pipeline::raw::unpack::{extract_raw_block, unpack};

pub struct PackedRawReader {
    mode: SensorMode,
}

impl PackedRawReader {
    pub fn new(mode: SensorMode) -> Self {
        Self { mode }
    }
}

impl FrameReader for PackedRawReader {
    fn read_frame(&self, data: &[u8]) -> Result<BayerPlane> {
        debug!("Unpacking raw capture, {} bytes", data.len());
        let block = extract_raw_block(data, &self.mode)?;
        let plane = unpack(block, &self.mode)?;
        debug!("Unpacked Bayer plane: {}x{}", plane.width, plane.height);
        Ok(plane)
    }
}
