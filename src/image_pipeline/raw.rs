//! RAW frame reading module
//!
//! Unpacking of the sensor's 10-bit packed readout and storage of unpacked
//! frames as `.data` files.

mod reader;
mod packed_reader;
pub mod data_file;
pub mod types;
pub mod unpack;

pub use reader::FrameReader;
pub use packed_reader::PackedRawReader;
pub use data_file::{DataFileReader, read_frame_file, write_data_file};
pub use types::SensorMode;
pub use unpack::{extract_raw_block, pack, unpack};
