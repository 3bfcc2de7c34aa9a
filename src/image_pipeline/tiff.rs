//! TIFF writing module
//!
//! Writes 8-bit previews and 16-bit fields or corrected frames.

mod writer;
mod standard_tiff_writer;
pub mod types;

pub use writer::PreviewWriter;
pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{TiffCompression, OutputConfig, OutputConfigBuilder};
