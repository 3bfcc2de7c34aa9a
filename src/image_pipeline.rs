//! Radiometric calibration pipeline module
//!
//! Separate modules for raw frame reading, demosaicing, the calibration
//! stages, TIFF writing and their orchestration.

pub mod calibration;
pub mod common;
pub mod conversions;
pub mod debayer;
pub mod raw;
pub mod tiff;

pub use common::{
    BayerPlane,
    CalibrationError,
    FloatPlane,
    Plane,
    Result,
};

pub use raw::{
    DataFileReader,
    FrameReader,
    PackedRawReader,
    SensorMode,
};

pub use debayer::{
    ColorImage,
    DemosaicMode,
    Demosaicer,
    WhiteBalanceGains,
};

pub use calibration::{
    CalibrationConfig,
    CalibrationConfigBuilder,
    ColorBalancer,
    DivisorPolicy,
    BaselineBlend,
    ExposureLabel,
    FlatFieldModel,
    FrameAverager,
    FrameKind,
    TracingStatsSink,
};

pub use tiff::{
    TiffCompression,
    OutputConfig,
    PreviewWriter,
    StandardTiffWriter,
};

pub use conversions::{
    RadiometricPipeline,
};
