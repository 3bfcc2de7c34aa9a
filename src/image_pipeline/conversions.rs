//! Pipeline conversions module
//!
//! Orchestration of the calibration stages over stored frames.

mod radiometric;


pub use radiometric::RadiometricPipeline;
