use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::common::plane::BayerPlane;

/// Turns the bytes of one stored frame into a Bayer plane.
pub trait FrameReader {
    fn read_frame(&self, data: &[u8]) -> Result<BayerPlane>;
}

impl<R: FrameReader + ?Sized> FrameReader for &R {
    fn read_frame(&self, data: &[u8]) -> Result<BayerPlane> {
        (**self).read_frame(data)
    }
}
