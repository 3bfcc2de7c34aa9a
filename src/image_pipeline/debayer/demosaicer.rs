use tracing::{debug, instrument};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::plane::BayerPlane;
use crate::image_pipeline::debayer::basic::demosaic_basic;
use crate::image_pipeline::debayer::model::demosaic_model;
use crate::image_pipeline::debayer::types::{ColorImage, DemosaicMode, ModelOptions, WhiteBalanceGains};

/// Reduces Bayer planes to half-resolution color images.
#[derive(Debug, Clone, Default)]
pub struct Demosaicer {
    model: ModelOptions,
}

impl Demosaicer {
    pub fn new(model: ModelOptions) -> Self {
        Self { model }
    }

    /// `gains` of `None` means unity gains in `Basic` mode and the model's
    /// default gains in `Model` mode.
    #[instrument(skip(self, plane, gains), fields(width = plane.width, height = plane.height))]
    pub fn demosaic(
        &self,
        plane: &BayerPlane,
        mode: DemosaicMode,
        gains: Option<WhiteBalanceGains>,
    ) -> Result<ColorImage> {
        debug!(?mode, ?gains, "Demosaicing");
        match mode {
            DemosaicMode::Basic => demosaic_basic(plane, gains.unwrap_or_default()),
            DemosaicMode::Model => demosaic_model(plane, gains, &self.model),
        }
    }
}

/// Demosaics with default model options.
pub fn demosaic(
    plane: &BayerPlane,
    mode: DemosaicMode,
    gains: Option<WhiteBalanceGains>,
) -> Result<ColorImage> {
    Demosaicer::default().demosaic(plane, mode, gains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::debayer::types::WorkingRange;

    #[test]
    fn mode_selects_working_range() {
        let plane = BayerPlane::from_fn(4, 4, |x, y| (x * 50 + y * 7) as u16);
        let basic = demosaic(&plane, DemosaicMode::Basic, None).unwrap();
        let model = demosaic(&plane, DemosaicMode::Model, None).unwrap();
        assert_eq!(basic.range, WorkingRange::Working16);
        assert_eq!(model.range, WorkingRange::Unit);
        assert_eq!((basic.width, basic.height), (2, 2));
    }
}
