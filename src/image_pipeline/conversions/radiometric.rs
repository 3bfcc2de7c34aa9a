use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{info, info_span, instrument, warn};

use crate::image_pipeline::{
    calibration::{
        AveragePair, CalibrationConfig, CalibrationProfile, Calibrator, ColorBalancer,
        ExposureLabel, FrameAverager, FrameKind, FrameSet, FrameStatsSink,
        frame_set::frame_name,
    },
    common::{
        error::{CalibrationError, Result},
        plane::BayerPlane,
    },
    debayer::{
        ColorImage, DemosaicMode, Demosaicer, basic::demosaic_basic, to_rgb8, to_rgb8_scaled,
    },
    raw::{DataFileReader, FrameReader, PackedRawReader, read_frame_file, write_data_file},
    tiff::{PreviewWriter, StandardTiffWriter},
};

/// Runs the calibration stages over the directory layout of a
/// [`CalibrationConfig`].
pub struct RadiometricPipeline<R: FrameReader, W: PreviewWriter> {
    reader: R,
    writer: W,
    config: CalibrationConfig,
}

impl RadiometricPipeline<DataFileReader, StandardTiffWriter> {
    pub fn new(config: CalibrationConfig) -> Result<Self> {
        config.sensor_mode.validate()?;
        Ok(Self {
            reader: DataFileReader::for_mode(&config.sensor_mode),
            writer: StandardTiffWriter,
            config,
        })
    }
}

impl<R: FrameReader, W: PreviewWriter> RadiometricPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: CalibrationConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: CalibrationConfig) {
        self.config = config;
    }

    fn create_output(path: &Path) -> Result<File> {
        File::create(path)
            .map_err(|e| CalibrationError::OutputWriteError(format!("{}: {}", path.display(), e)))
    }

    fn write_preview(&self, plane: &BayerPlane, path: &Path) -> Result<()> {
        let image = demosaic_basic(plane, self.config.gains())?;
        let preview = to_rgb8_scaled(&image)?;
        let mut output = Self::create_output(path)?;
        self.writer
            .write_rgb8(&preview, &mut output, &self.config.output)
    }

    /// Averages the short and long exposure sets of `kind`, stores both
    /// averages as `.data` files and renders a preview next to each.
    #[instrument(skip(self, sink), fields(root = %self.config.root.display()))]
    pub fn average_frames<S: FrameStatsSink>(&self, kind: FrameKind, sink: S) -> Result<AveragePair> {
        info!("Averaging frame sets");

        let (short, long) = {
            let _span = info_span!("scan_frame_sets").entered();
            (
                FrameSet::scan(self.config.frame_dir(kind, ExposureLabel::Short), kind, ExposureLabel::Short)?,
                FrameSet::scan(self.config.frame_dir(kind, ExposureLabel::Long), kind, ExposureLabel::Long)?,
            )
        };

        let pair = {
            let _span = info_span!("average", short = short.len(), long = long.len()).entered();
            FrameAverager::new(&self.reader, sink, self.config.divisor_policy)
                .average_pair(&short, &long)?
        };

        for average in [&pair.short, &pair.long] {
            let _span = info_span!("store_average", exposure = %average.exposure).entered();
            let path = self.config.average_path(kind, average.exposure);
            let plane = average.to_plane();
            write_data_file(&path, &plane)?;

            if let Some(stats) = average.summary() {
                info!(
                    path = %path.display(),
                    mean = stats.mean,
                    median = stats.median,
                    std = stats.std_dev,
                    var = stats.variance,
                    "{} {}: full set: mean: {:.2}, median: {:.2}, std: {:.2}, var: {:.2}",
                    kind,
                    average.exposure,
                    stats.mean,
                    stats.median,
                    stats.std_dev,
                    stats.variance
                );
            }

            let preview = CalibrationConfig::preview_path(&path);
            match self.write_preview(&plane, &preview) {
                Ok(()) => {}
                Err(CalibrationError::NumericError(reason)) => {
                    warn!(path = %preview.display(), %reason, "Skipping preview of average");
                }
                Err(e) => return Err(e),
            }
        }

        info!(kind = %kind, "Averages stored");
        Ok(pair)
    }

    /// Loads the stored dark averages of both exposures.
    pub fn load_profile(&self) -> Result<CalibrationProfile> {
        let _span = info_span!("load_profile").entered();
        CalibrationProfile::load(
            &self.reader,
            self.config.average_path(FrameKind::Dark, ExposureLabel::Short),
            self.config.average_path(FrameKind::Dark, ExposureLabel::Long),
        )
    }

    pub fn calibrator(&self) -> Result<Calibrator> {
        Ok(Calibrator::new(self.load_profile()?, self.config.baseline_blend))
    }

    /// Dark subtraction, basic demosaic, direct flat-fielding and color
    /// balance.
    #[instrument(skip_all, fields(width = plane.width, height = plane.height, exposure = %exposure))]
    pub fn calibrate(
        &self,
        calibrator: &Calibrator,
        plane: &BayerPlane,
        exposure: ExposureLabel,
    ) -> Result<ColorImage> {
        let corrected = {
            let _span = info_span!("subtract_dark").entered();
            calibrator.subtract_dark(plane, exposure)?.to_u16()
        };
        let image = {
            let _span = info_span!("demosaic").entered();
            demosaic_basic(&corrected, self.config.gains())?
        };
        let flat = {
            let _span = info_span!("flat_field").entered();
            self.config.flat_field.apply(&image)?
        };
        let _span = info_span!("color_balance").entered();
        ColorBalancer::new(self.config.color_balance_percent)?.balance(&flat)
    }

    /// Calibrates one stored frame and writes it as a 16-bit TIFF.
    #[instrument(skip(self, calibrator, input_path, output_path))]
    pub fn calibrate_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        calibrator: &Calibrator,
        input_path: P,
        exposure: ExposureLabel,
        output_path: Q,
    ) -> Result<ColorImage> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Calibrating file"
        );

        let plane = read_frame_file(&self.reader, input_path)?;
        let image = self.calibrate(calibrator, &plane, exposure)?;

        let mut output = Self::create_output(output_path)?;
        self.writer
            .write_rgb16(&image, &mut output, &self.config.output)?;
        Ok(image)
    }

    /// Calibrates every frame of `set` into `out_dir/<stem>.tiff` and returns
    /// the paths written. Frames that fail on their own are logged and
    /// skipped.
    #[instrument(skip_all, fields(kind = %set.kind(), exposure = %set.exposure(), frames = set.len()))]
    pub fn calibrate_set<P: AsRef<Path>>(
        &self,
        calibrator: &Calibrator,
        set: &FrameSet,
        out_dir: P,
    ) -> Result<Vec<PathBuf>> {
        let out_dir = out_dir.as_ref();
        let mut written = Vec::with_capacity(set.len());

        for input in set.paths() {
            let output = out_dir.join(format!("{}.tiff", frame_name(input)));
            match self.calibrate_file(calibrator, input, set.exposure(), &output) {
                Ok(_) => written.push(output),
                Err(e) if e.is_per_file() => {
                    warn!(frame = %input.display(), error = %e, "Skipping frame");
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            calibrated = written.len(),
            skipped = set.len() - written.len(),
            "Frame set calibrated"
        );
        Ok(written)
    }

    /// Basic demosaic and color balance of one stored frame, written as an
    /// 8-bit preview.
    #[instrument(skip(self, input_path, output_path))]
    pub fn color_balance_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        percent: f64,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Color balancing file"
        );

        let balancer = ColorBalancer::new(percent)?;
        let plane = read_frame_file(&self.reader, input_path)?;
        let image = demosaic_basic(&plane, self.config.gains())?;
        let balanced = balancer.balance(&image)?;
        let preview = to_rgb8_scaled(&balanced)?;

        let mut output = Self::create_output(output_path)?;
        self.writer
            .write_rgb8(&preview, &mut output, &self.config.output)
    }

    /// Renders one stored frame with the chosen demosaic mode.
    #[instrument(skip(self, input_path, output_path))]
    pub fn preview_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        mode: DemosaicMode,
        output_path: Q,
    ) -> Result<()> {
        let plane = read_frame_file(&self.reader, input_path)?;
        let image = Demosaicer::new(self.config.model.clone()).demosaic(
            &plane,
            mode,
            self.config.white_balance,
        )?;
        let preview = to_rgb8(&image)?;

        let mut output = Self::create_output(output_path.as_ref())?;
        self.writer
            .write_rgb8(&preview, &mut output, &self.config.output)
    }

    /// Generates a flat field from a stored white frame, or from the
    /// synthetic uniform frame when `reference` is `None`, and writes it as a
    /// 16-bit TIFF.
    #[instrument(skip(self, reference, output_path))]
    pub fn create_flat_field<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        reference: Option<P>,
        output_path: Q,
    ) -> Result<ColorImage> {
        let model = &self.config.flat_field;
        let field = match reference {
            Some(path) => {
                let plane = read_frame_file(&self.reader, path)?;
                let image = demosaic_basic(&plane, self.config.gains())?;
                model.generate_field(&image)?
            }
            None => {
                let (width, height) = self.config.sensor_mode.half_resolution();
                model.generate_uniform_field(width, height)?
            }
        };

        let mut output = Self::create_output(output_path.as_ref())?;
        self.writer
            .write_rgb16(&field, &mut output, &self.config.output)?;
        info!(output = %output_path.as_ref().display(), "Flat field written");
        Ok(field)
    }

    /// Unpacks a captured raw stream into a `.data` frame.
    #[instrument(skip(self, input_path, output_path))]
    pub fn unpack_capture<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<BayerPlane> {
        let reader = PackedRawReader::new(self.config.sensor_mode);
        let plane = read_frame_file(&reader, input_path)?;
        write_data_file(output_path, &plane)?;
        Ok(plane)
    }
}
