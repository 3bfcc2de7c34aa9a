//! Calibration run configuration

use std::path::{Path, PathBuf};

use crate::image_pipeline::calibration::flat_field::FlatFieldModel;
use crate::image_pipeline::calibration::frame_set::DATA_EXTENSION;
use crate::image_pipeline::calibration::types::{
    BaselineBlend, DivisorPolicy, ExposureLabel, FrameKind,
};
use crate::image_pipeline::debayer::types::{ModelOptions, WhiteBalanceGains};
use crate::image_pipeline::raw::types::SensorMode;
use crate::image_pipeline::tiff::types::OutputConfig;

/// Directory holding the frame sets and averages when none is given.
pub const DEFAULT_ROOT: &str = "radiometric";

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Root of the `df5/`, `df50/`, `wf5/`, `wf50/` layout
    pub root: PathBuf,
    pub sensor_mode: SensorMode,
    pub divisor_policy: DivisorPolicy,
    pub baseline_blend: BaselineBlend,
    pub flat_field: FlatFieldModel,
    /// Gains of the basic demosaic; unity when `None`
    pub white_balance: Option<WhiteBalanceGains>,
    pub model: ModelOptions,
    pub output: OutputConfig,
    /// Percentage clipped by color balancing, split over both tails
    pub color_balance_percent: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            sensor_mode: SensorMode::PI_V2_FULL,
            divisor_policy: DivisorPolicy::default(),
            baseline_blend: BaselineBlend::default(),
            flat_field: FlatFieldModel::default(),
            white_balance: None,
            model: ModelOptions::default(),
            output: OutputConfig::default(),
            color_balance_percent: 1.0,
        }
    }
}

impl CalibrationConfig {
    pub fn builder() -> CalibrationConfigBuilder {
        CalibrationConfigBuilder::default()
    }

    pub fn gains(&self) -> WhiteBalanceGains {
        self.white_balance.unwrap_or_default()
    }

    /// `<root>/df5`, `<root>/wf50`, ...
    pub fn frame_dir(&self, kind: FrameKind, exposure: ExposureLabel) -> PathBuf {
        self.root
            .join(format!("{}{}", kind.prefix(), exposure.millis()))
    }

    /// `<root>/df_avg5ms.data`, ...
    pub fn average_path(&self, kind: FrameKind, exposure: ExposureLabel) -> PathBuf {
        self.root.join(format!(
            "{}_avg{}.{}",
            kind.prefix(),
            exposure,
            DATA_EXTENSION
        ))
    }

    /// TIFF written next to `path`, sharing its stem.
    pub fn preview_path(path: &Path) -> PathBuf {
        path.with_extension("tiff")
    }
}

/// Builder for CalibrationConfig
#[derive(Default)]
pub struct CalibrationConfigBuilder {
    root: Option<PathBuf>,
    sensor_mode: Option<SensorMode>,
    divisor_policy: Option<DivisorPolicy>,
    baseline_blend: Option<BaselineBlend>,
    flat_field: Option<FlatFieldModel>,
    white_balance: Option<Option<WhiteBalanceGains>>,
    model: Option<ModelOptions>,
    output: Option<OutputConfig>,
    color_balance_percent: Option<f64>,
}

impl CalibrationConfigBuilder {
    pub fn root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn sensor_mode(mut self, mode: SensorMode) -> Self {
        self.sensor_mode = Some(mode);
        self
    }

    pub fn divisor_policy(mut self, policy: DivisorPolicy) -> Self {
        self.divisor_policy = Some(policy);
        self
    }

    pub fn baseline_blend(mut self, blend: BaselineBlend) -> Self {
        self.baseline_blend = Some(blend);
        self
    }

    pub fn flat_field(mut self, model: FlatFieldModel) -> Self {
        self.flat_field = Some(model);
        self
    }

    pub fn white_balance(mut self, gains: Option<WhiteBalanceGains>) -> Self {
        self.white_balance = Some(gains);
        self
    }

    pub fn model(mut self, options: ModelOptions) -> Self {
        self.model = Some(options);
        self
    }

    pub fn output(mut self, output: OutputConfig) -> Self {
        self.output = Some(output);
        self
    }

    pub fn color_balance_percent(mut self, percent: f64) -> Self {
        self.color_balance_percent = Some(percent);
        self
    }

    pub fn build(self) -> CalibrationConfig {
        let default = CalibrationConfig::default();
        CalibrationConfig {
            root: self.root.unwrap_or(default.root),
            sensor_mode: self.sensor_mode.unwrap_or(default.sensor_mode),
            divisor_policy: self.divisor_policy.unwrap_or(default.divisor_policy),
            baseline_blend: self.baseline_blend.unwrap_or(default.baseline_blend),
            flat_field: self.flat_field.unwrap_or(default.flat_field),
            white_balance: self.white_balance.unwrap_or(default.white_balance),
            model: self.model.unwrap_or(default.model),
            output: self.output.unwrap_or(default.output),
            color_balance_percent: self
                .color_balance_percent
                .unwrap_or(default.color_balance_percent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_directory_layout() {
        let config = CalibrationConfig::builder().root("/data/radiometric").build();
        assert_eq!(
            config.frame_dir(FrameKind::Dark, ExposureLabel::Short),
            Path::new("/data/radiometric/df5")
        );
        assert_eq!(
            config.frame_dir(FrameKind::White, ExposureLabel::Long),
            Path::new("/data/radiometric/wf50")
        );
        let average = config.average_path(FrameKind::Dark, ExposureLabel::Long);
        assert_eq!(average, Path::new("/data/radiometric/df_avg50ms.data"));
        assert_eq!(
            CalibrationConfig::preview_path(&average),
            Path::new("/data/radiometric/df_avg50ms.tiff")
        );
    }

    #[test]
    fn builder_falls_back_to_defaults() {
        let config = CalibrationConfig::builder()
            .divisor_policy(DivisorPolicy::SummedFrameCount)
            .build();
        assert_eq!(config.divisor_policy, DivisorPolicy::SummedFrameCount);
        assert_eq!(config.baseline_blend, BaselineBlend::Both);
        assert_eq!(config.sensor_mode, SensorMode::PI_V2_FULL);
        assert_eq!(config.color_balance_percent, 1.0);
        assert_eq!(config.gains(), WhiteBalanceGains::UNITY);
    }
}
