//! Demosaicing module for converting Bayer planes to color images

pub mod basic;
pub mod display;
mod demosaicer;
pub mod model;
pub mod types;

pub use demosaicer::{Demosaicer, demosaic};
pub use display::{to_rgb8, to_rgb8_scaled, to_rgb8_stretched};
pub use types::{
    ColorImage, DemosaicMode, ModelOptions, Rgb8Image, WORKING_MAX, WhiteBalanceGains,
    WorkingRange,
};
