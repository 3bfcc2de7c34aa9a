use std::path::PathBuf;

use anyhow::Context;
use picam_radiometry::image_pipeline::calibration::{
    CalibrationConfig, DEFAULT_ROOT, ExposureLabel, FrameKind, TracingStatsSink,
};
use picam_radiometry::image_pipeline::RadiometricPipeline;
use picam_radiometry::logger;

use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    logger::init();

    let root = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));

    info!("Starting picam_radiometry...");

    let config = CalibrationConfig::builder().root(&root).build();
    let pipeline = RadiometricPipeline::new(config)
        .context("invalid calibration configuration")?;

    info!(root = %root.display(), "Radiometric pipeline initialized");
    info!("Divisor policy: {:?}", pipeline.config().divisor_policy);
    info!("Baseline blend: {:?}", pipeline.config().baseline_blend);

    pipeline
        .average_frames(FrameKind::Dark, TracingStatsSink)
        .with_context(|| format!("averaging dark frames under {}", root.display()))?;

    let average = pipeline
        .config()
        .average_path(FrameKind::Dark, ExposureLabel::Long);
    let balanced = average.with_file_name(format!(
        "{}_wb.tiff",
        average
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    let percent = pipeline.config().color_balance_percent;

    match pipeline.color_balance_file(&average, percent, &balanced) {
        Ok(()) => info!(output = %balanced.display(), "Color balance successful!"),
        Err(e) => error!("Color balance failed: {}", e),
    }

    Ok(())
}
