use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::{ColorImage, Rgb8Image};
use crate::image_pipeline::tiff::types::OutputConfig;

pub trait PreviewWriter {
    /// 8-bit RGB display preview.
    fn write_rgb8(&self, image: &Rgb8Image, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
    /// 16-bit RGB image of a `Working16` color image.
    fn write_rgb16(&self, image: &ColorImage, output: &mut dyn Write, config: &OutputConfig) -> Result<()>;
}
