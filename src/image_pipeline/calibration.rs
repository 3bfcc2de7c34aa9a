//! Radiometric calibration stages
//!
//! Frame averaging, dark-frame subtraction, flat-field modeling and color
//! balancing, plus the configuration and diagnostics they share.

mod averager;
pub mod color_balance;
pub mod config;
mod dark;
pub mod flat_field;
pub mod frame_set;
pub mod sink;
pub mod stats;
pub mod types;

pub use averager::{AverageFrame, AveragePair, FrameAverager};
pub use color_balance::{ColorBalancer, color_balance};
pub use config::{CalibrationConfig, CalibrationConfigBuilder, DEFAULT_ROOT};
pub use dark::{CalibrationProfile, Calibrator};
pub use flat_field::{FlatFieldCurve, FlatFieldModel};
pub use frame_set::FrameSet;
pub use sink::{FrameStatsRecord, FrameStatsSink, TracingStatsSink};
pub use stats::FrameStats;
pub use types::{BaselineBlend, DivisorPolicy, ExposureLabel, FrameKind};
