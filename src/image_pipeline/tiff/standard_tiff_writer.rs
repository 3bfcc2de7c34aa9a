use std::io::{Cursor, Write};

use tiff::encoder::colortype::{RGB8, RGB16};
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::debayer::types::{ColorImage, Rgb8Image, WorkingRange};
use crate::image_pipeline::tiff::types::{OutputConfig, TiffCompression};
use crate::image_pipeline::tiff::writer::PreviewWriter;

pub struct StandardTiffWriter;

fn compression(config: &OutputConfig) -> Compression {
    match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

fn encoder<'a>(
    buffer: &'a mut Vec<u8>,
    config: &OutputConfig,
) -> Result<TiffEncoder<Cursor<&'a mut Vec<u8>>>> {
    let mut encoder = TiffEncoder::new(Cursor::new(buffer))
        .map_err(|e| CalibrationError::EncodeError(e.to_string()))?
        .with_compression(compression(config));

    if let Some(predictor) = config.predictor {
        encoder = encoder.with_predictor(match predictor {
            2 => Predictor::Horizontal,
            _ => Predictor::None,
        });
    }
    Ok(encoder)
}

impl PreviewWriter for StandardTiffWriter {
    fn write_rgb8(&self, image: &Rgb8Image, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        debug!("Encoding RGB8 TIFF image: {}x{}", image.width, image.height);
        let mut buffer = Vec::new();
        encoder(&mut buffer, config)?
            .write_image::<RGB8>(image.width as u32, image.height as u32, &image.data)
            .map_err(|e| CalibrationError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;
        Ok(())
    }

    fn write_rgb16(&self, image: &ColorImage, output: &mut dyn Write, config: &OutputConfig) -> Result<()> {
        if image.range != WorkingRange::Working16 {
            return Err(CalibrationError::ValidationError(format!(
                "16-bit TIFF output needs a Working16 image, got {:?}",
                image.range
            )));
        }
        debug!("Encoding RGB16 TIFF image: {}x{}", image.width, image.height);

        // saturating cast, fractions truncated
        let samples: Vec<u16> = image.to_interleaved().into_iter().map(|v| v as u16).collect();
        let mut buffer = Vec::new();
        encoder(&mut buffer, config)?
            .write_image::<RGB16>(image.width as u32, image.height as u32, &samples)
            .map_err(|e| CalibrationError::EncodeError(e.to_string()))?;
        output.write_all(&buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb8_output_is_a_little_endian_tiff() {
        let image = Rgb8Image {
            width: 2,
            height: 1,
            data: vec![0, 64, 128, 255, 1, 2],
        };
        let mut out = Vec::new();
        StandardTiffWriter
            .write_rgb8(&image, &mut out, &OutputConfig::default())
            .unwrap();
        assert_eq!(&out[..4], b"II*\0");
    }

    #[test]
    fn rgb16_rejects_unit_images() {
        let image = ColorImage::filled(2, 2, 0.5, WorkingRange::Unit);
        let mut out = Vec::new();
        let result = StandardTiffWriter.write_rgb16(&image, &mut out, &OutputConfig::default());
        assert!(matches!(result, Err(CalibrationError::ValidationError(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn rgb16_decodes_back() {
        let image = ColorImage::new(
            2,
            1,
            [vec![0.0, 65535.0], vec![1.0, 2.0], vec![300.7, 4.0]],
            WorkingRange::Working16,
        )
        .unwrap();
        let mut out = Vec::new();
        let config = OutputConfig::builder().compression(TiffCompression::Lzw).build();
        StandardTiffWriter.write_rgb16(&image, &mut out, &config).unwrap();

        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(out)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (2, 1));
        match decoder.read_image().unwrap() {
            tiff::decoder::DecodingResult::U16(samples) => {
                assert_eq!(samples, vec![0, 1, 300, 65535, 2, 4]);
            }
            _ => panic!("expected 16-bit samples"),
        }
    }
}
