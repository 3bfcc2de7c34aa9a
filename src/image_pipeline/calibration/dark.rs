//! Dark-frame subtraction

use std::path::Path;

use tracing::{debug, instrument};

use crate::image_pipeline::calibration::averager::AveragePair;
use crate::image_pipeline::calibration::types::{BaselineBlend, ExposureLabel};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::plane::{BayerPlane, FloatPlane, Plane};
use crate::image_pipeline::raw::{FrameReader, read_frame_file};

/// Averaged dark frames for both exposures, as persisted between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationProfile {
    short: BayerPlane,
    long: BayerPlane,
}

impl CalibrationProfile {
    pub fn new(short: BayerPlane, long: BayerPlane) -> Result<Self> {
        short.ensure_same_size(&long)?;
        Ok(Self { short, long })
    }

    /// Uses the averages in their stored (truncated u16) form.
    pub fn from_pair(pair: &AveragePair) -> Result<Self> {
        Self::new(pair.short.to_plane(), pair.long.to_plane())
    }

    pub fn load<R, P, Q>(reader: &R, short_path: P, long_path: Q) -> Result<Self>
    where
        R: FrameReader + ?Sized,
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let short = read_frame_file(reader, short_path)?;
        let long = read_frame_file(reader, long_path)?;
        Self::new(short, long)
    }

    pub fn baseline(&self, exposure: ExposureLabel) -> &BayerPlane {
        match exposure {
            ExposureLabel::Short => &self.short,
            ExposureLabel::Long => &self.long,
        }
    }
}

pub struct Calibrator {
    profile: CalibrationProfile,
    blend: BaselineBlend,
}

impl Calibrator {
    pub fn new(profile: CalibrationProfile, blend: BaselineBlend) -> Self {
        Self { profile, blend }
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Baseline subtracted from a target captured with `exposure`.
    pub fn baseline(&self, exposure: ExposureLabel) -> FloatPlane {
        match self.blend {
            BaselineBlend::Both => {
                let short = &self.profile.short;
                let long = &self.profile.long;
                FloatPlane {
                    width: short.width,
                    height: short.height,
                    data: short
                        .data
                        .iter()
                        .zip(&long.data)
                        .map(|(&s, &l)| (f64::from(s) + f64::from(l)) / 2.0)
                        .collect(),
                }
            }
            BaselineBlend::ExposureMatched => self.profile.baseline(exposure).to_f64(),
        }
    }

    /// `max(target - baseline, 0)` element-wise. With
    /// [`BaselineBlend::Both`] the exposure is ignored.
    #[instrument(skip(self, target), fields(width = target.width, height = target.height))]
    pub fn subtract_dark<T>(&self, target: &Plane<T>, exposure: ExposureLabel) -> Result<FloatPlane>
    where
        T: Copy + Into<f64>,
    {
        self.profile.short.ensure_same_size(target)?;
        debug!(blend = ?self.blend, %exposure, "Subtracting dark baseline");

        let baseline = self.baseline(exposure);
        let data = target
            .data
            .iter()
            .zip(&baseline.data)
            .map(|(&t, &b)| (t.into() - b).max(0.0))
            .collect();
        Ok(FloatPlane {
            width: target.width,
            height: target.height,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::CalibrationError;

    fn profile() -> CalibrationProfile {
        CalibrationProfile::new(BayerPlane::filled(2, 2, 10), BayerPlane::filled(2, 2, 30)).unwrap()
    }

    #[test]
    fn both_baselines_are_blended_regardless_of_exposure() {
        let calibrator = Calibrator::new(profile(), BaselineBlend::Both);
        let target = BayerPlane::new(2, 2, vec![100, 20, 25, 0]).unwrap();
        for exposure in ExposureLabel::ALL {
            let out = calibrator.subtract_dark(&target, exposure).unwrap();
            assert_eq!(out.data, vec![80.0, 0.0, 5.0, 0.0]);
        }
    }

    #[test]
    fn exposure_matched_uses_one_baseline() {
        let calibrator = Calibrator::new(profile(), BaselineBlend::ExposureMatched);
        let target = BayerPlane::filled(2, 2, 25);
        let short = calibrator.subtract_dark(&target, ExposureLabel::Short).unwrap();
        let long = calibrator.subtract_dark(&target, ExposureLabel::Long).unwrap();
        assert!(short.data.iter().all(|&v| v == 15.0));
        assert!(long.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn result_is_never_negative() {
        let calibrator = Calibrator::new(profile(), BaselineBlend::Both);
        let target = FloatPlane::new(2, 2, vec![-5.0, 0.0, 19.9, 19.0]).unwrap();
        let out = calibrator.subtract_dark(&target, ExposureLabel::Short).unwrap();
        assert!(out.data.iter().all(|&v| v >= 0.0));
        assert_eq!(out.data, vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let calibrator = Calibrator::new(profile(), BaselineBlend::Both);
        let target = BayerPlane::filled(4, 2, 0);
        assert!(matches!(
            calibrator.subtract_dark(&target, ExposureLabel::Long),
            Err(CalibrationError::DimensionMismatch { .. })
        ));
        assert!(CalibrationProfile::new(BayerPlane::filled(2, 2, 0), BayerPlane::filled(2, 4, 0)).is_err());
    }
}
