//! Folding frame sets into average frames.
//!
//! Accumulation happens in f64 on the raw Bayer plane, before demosaicing.
//! The first frame seeds the accumulator; statistics are recorded for every
//! frame after it.

use tracing::{info, instrument, warn};

use crate::image_pipeline::calibration::frame_set::{FrameSet, frame_name};
use crate::image_pipeline::calibration::sink::{FrameStatsRecord, FrameStatsSink};
use crate::image_pipeline::calibration::stats::FrameStats;
use crate::image_pipeline::calibration::types::{DivisorPolicy, ExposureLabel, FrameKind};
use crate::image_pipeline::common::error::{CalibrationError, Result};
use crate::image_pipeline::common::plane::{BayerPlane, FloatPlane};
use crate::image_pipeline::raw::{FrameReader, read_frame_file};

/// Element-wise mean of a frame set.
#[derive(Debug, Clone, PartialEq)]
pub struct AverageFrame {
    pub kind: FrameKind,
    pub exposure: ExposureLabel,
    /// Accumulated sum divided by `divisor`
    pub mean: FloatPlane,
    /// Frames that were read and added
    pub frames_summed: usize,
    pub divisor: usize,
    /// Statistics of every summed frame after the first
    pub frame_stats: Vec<FrameStatsRecord>,
}

impl AverageFrame {
    /// The mean cast back to the unsigned working range (truncating).
    pub fn to_plane(&self) -> BayerPlane {
        self.mean.to_u16()
    }

    /// Statistics of the averaged frame itself.
    pub fn summary(&self) -> Option<FrameStats> {
        FrameStats::from_f64(&self.mean.data)
    }
}

/// Short and long exposure averages built together.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragePair {
    pub short: AverageFrame,
    pub long: AverageFrame,
}

struct Accumulation {
    sum: FloatPlane,
    summed: usize,
    records: Vec<FrameStatsRecord>,
}

pub struct FrameAverager<R: FrameReader, S: FrameStatsSink> {
    reader: R,
    sink: S,
    policy: DivisorPolicy,
}

impl<R: FrameReader, S: FrameStatsSink> FrameAverager<R, S> {
    pub fn new(reader: R, sink: S, policy: DivisorPolicy) -> Self {
        Self {
            reader,
            sink,
            policy,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn accumulate<I>(sink: &mut S, kind: FrameKind, exposure: ExposureLabel, frames: I) -> Result<Accumulation>
    where
        I: IntoIterator<Item = (String, Result<BayerPlane>)>,
    {
        let mut acc: Option<Accumulation> = None;

        for (name, frame) in frames {
            let plane = match frame {
                Ok(plane) => plane,
                Err(e) if e.is_per_file() => {
                    warn!(frame = %name, error = %e, "Skipping unreadable frame");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let Some(current) = acc.as_mut() else {
                acc = Some(Accumulation {
                    sum: plane.to_f64(),
                    summed: 1,
                    records: Vec::new(),
                });
                continue;
            };

            if let Err(e) = current.sum.ensure_same_size(&plane) {
                warn!(frame = %name, error = %e, "Skipping frame with mismatched size");
                continue;
            }
            for (a, &v) in current.sum.data.iter_mut().zip(&plane.data) {
                *a += f64::from(v);
            }
            current.summed += 1;

            if let Some(stats) = FrameStats::from_samples(&plane.data) {
                let record = FrameStatsRecord {
                    kind,
                    exposure,
                    frame: name,
                    stats,
                };
                sink.record(record.clone());
                current.records.push(record);
            }
        }

        acc.ok_or_else(|| {
            CalibrationError::ValidationError(format!(
                "{} {} frame set has no readable frames",
                kind, exposure
            ))
        })
    }

    fn finish(kind: FrameKind, exposure: ExposureLabel, acc: Accumulation, divisor: usize) -> Result<AverageFrame> {
        if divisor == 0 {
            return Err(CalibrationError::ValidationError(
                "averaging divisor must be non-zero".to_string(),
            ));
        }
        if divisor != acc.summed {
            warn!(
                %kind,
                %exposure,
                summed = acc.summed,
                divisor,
                "Averaging divisor differs from the number of frames summed"
            );
        }

        let mut mean = acc.sum;
        let d = divisor as f64;
        for v in mean.data.iter_mut() {
            *v /= d;
        }

        info!(%kind, %exposure, summed = acc.summed, divisor, "Averaged frame set");
        Ok(AverageFrame {
            kind,
            exposure,
            mean,
            frames_summed: acc.summed,
            divisor,
            frame_stats: acc.records,
        })
    }

    /// Frames are read lazily, one at a time.
    fn read_set(&mut self, set: &FrameSet) -> Result<Accumulation> {
        let Self { reader, sink, .. } = self;
        let frames = set
            .paths()
            .iter()
            .map(|path| (frame_name(path), read_frame_file(&*reader, path)));
        Self::accumulate(sink, set.kind(), set.exposure(), frames)
    }

    /// Averages in-memory frames, dividing by `divisor` or, when `None`, by
    /// the number of frames summed.
    pub fn average_planes<I>(
        &mut self,
        kind: FrameKind,
        exposure: ExposureLabel,
        frames: I,
        divisor: Option<usize>,
    ) -> Result<AverageFrame>
    where
        I: IntoIterator<Item = (String, BayerPlane)>,
    {
        let acc = Self::accumulate(
            &mut self.sink,
            kind,
            exposure,
            frames.into_iter().map(|(n, p)| (n, Ok(p))),
        )?;
        let divisor = divisor.unwrap_or(acc.summed);
        Self::finish(kind, exposure, acc, divisor)
    }

    /// Averages one frame set on its own. The divisor is the set's file count
    /// or, with [`DivisorPolicy::SummedFrameCount`], the frames summed.
    #[instrument(skip(self, set), fields(kind = %set.kind(), exposure = %set.exposure(), files = set.len()))]
    pub fn average_set(&mut self, set: &FrameSet) -> Result<AverageFrame> {
        let acc = self.read_set(set)?;
        let divisor = match self.policy {
            DivisorPolicy::ShortSetFileCount => set.len(),
            DivisorPolicy::SummedFrameCount => acc.summed,
        };
        Self::finish(set.kind(), set.exposure(), acc, divisor)
    }

    /// Averages a short and a long exposure set under the configured
    /// [`DivisorPolicy`].
    #[instrument(skip(self, short, long), fields(kind = %short.kind()))]
    pub fn average_pair(&mut self, short: &FrameSet, long: &FrameSet) -> Result<AveragePair> {
        if short.exposure() != ExposureLabel::Short || long.exposure() != ExposureLabel::Long {
            return Err(CalibrationError::ValidationError(format!(
                "expected a short and a long exposure set, got {} and {}",
                short.exposure(),
                long.exposure()
            )));
        }

        let short_acc = self.read_set(short)?;
        let long_acc = self.read_set(long)?;
        let (short_divisor, long_divisor) = match self.policy {
            DivisorPolicy::ShortSetFileCount => (short.len(), short.len()),
            DivisorPolicy::SummedFrameCount => (short_acc.summed, long_acc.summed),
        };

        Ok(AveragePair {
            short: Self::finish(short.kind(), short.exposure(), short_acc, short_divisor)?,
            long: Self::finish(long.kind(), long.exposure(), long_acc, long_divisor)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::raw::DataFileReader;
    use crate::image_pipeline::raw::write_data_file;
    use std::path::Path;

    fn averager(policy: DivisorPolicy) -> FrameAverager<DataFileReader, Vec<FrameStatsRecord>> {
        FrameAverager::new(DataFileReader::new(4, 2), Vec::new(), policy)
    }

    fn constant_frames(values: &[u16]) -> Vec<(String, BayerPlane)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (format!("{}_df", i + 1), BayerPlane::filled(4, 2, v)))
            .collect()
    }

    fn write_set(dir: &Path, values: &[u16]) {
        std::fs::create_dir_all(dir).unwrap();
        for (name, plane) in constant_frames(values) {
            write_data_file(dir.join(format!("{}.data", name)), &plane).unwrap();
        }
    }

    #[test]
    fn identical_frames_average_to_themselves() {
        let mut averager = averager(DivisorPolicy::default());
        let frames = vec![("a".to_string(), BayerPlane::from_fn(4, 2, |x, y| (x + y) as u16)); 4];
        let avg = averager
            .average_planes(FrameKind::Dark, ExposureLabel::Short, frames.clone(), None)
            .unwrap();

        assert_eq!(avg.to_plane(), frames[0].1);
        assert_eq!(avg.frame_stats.len(), 3);
        assert_eq!(averager.sink().len(), 3);
        // Per-frame spread is spatial; identical frames share it.
        let first = avg.frame_stats[0].stats;
        assert!(avg.frame_stats.iter().all(|r| r.stats == first));
    }

    #[test]
    fn constant_frames_have_zero_variance() {
        let mut averager = averager(DivisorPolicy::default());
        let avg = averager
            .average_planes(FrameKind::Dark, ExposureLabel::Short, constant_frames(&[7, 7, 7]), None)
            .unwrap();
        assert!(avg.frame_stats.iter().all(|r| r.stats.variance == 0.0 && r.stats.std_dev == 0.0));
    }

    #[test]
    fn distinct_constants_give_exact_mean() {
        let mut averager = averager(DivisorPolicy::default());
        let avg = averager
            .average_planes(FrameKind::Dark, ExposureLabel::Short, constant_frames(&[10, 20, 30]), None)
            .unwrap();

        assert!(avg.mean.data.iter().all(|&v| v == 20.0));
        let logged: Vec<f64> = avg.frame_stats.iter().map(|r| r.stats.mean).collect();
        assert_eq!(logged, vec![20.0, 30.0]);
        assert_eq!(avg.frame_stats[0].frame, "2_df");
    }

    #[test]
    fn explicit_divisor_is_honoured() {
        let mut averager = averager(DivisorPolicy::default());
        let avg = averager
            .average_planes(FrameKind::Dark, ExposureLabel::Long, constant_frames(&[30, 30, 30]), Some(2))
            .unwrap();
        assert!(avg.mean.data.iter().all(|&v| v == 45.0));
        assert_eq!((avg.frames_summed, avg.divisor), (3, 2));
    }

    #[test]
    fn long_set_divided_by_short_file_count_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_set(&dir.path().join("df5"), &[100, 100]);
        write_set(&dir.path().join("df50"), &[200, 200, 200, 200]);
        let short = FrameSet::scan(dir.path().join("df5"), FrameKind::Dark, ExposureLabel::Short).unwrap();
        let long = FrameSet::scan(dir.path().join("df50"), FrameKind::Dark, ExposureLabel::Long).unwrap();

        let pair = averager(DivisorPolicy::ShortSetFileCount).average_pair(&short, &long).unwrap();
        assert_eq!(pair.short.mean.get(0, 0), 100.0);
        assert_eq!(pair.long.divisor, 2);
        assert_eq!(pair.long.mean.get(0, 0), 400.0);

        let pair = averager(DivisorPolicy::SummedFrameCount).average_pair(&short, &long).unwrap();
        assert_eq!(pair.long.divisor, 4);
        assert_eq!(pair.long.mean.get(0, 0), 200.0);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_set(dir.path(), &[10, 30]);
        std::fs::write(dir.path().join("0_broken.data"), b"short").unwrap();
        let set = FrameSet::scan(dir.path(), FrameKind::White, ExposureLabel::Short).unwrap();
        assert_eq!(set.len(), 3);

        let avg = averager(DivisorPolicy::SummedFrameCount).average_set(&set).unwrap();
        assert_eq!(avg.frames_summed, 2);
        assert!(avg.mean.data.iter().all(|&v| v == 20.0));

        // The reference divisor still counts the broken file.
        let avg = averager(DivisorPolicy::ShortSetFileCount).average_set(&set).unwrap();
        assert_eq!(avg.divisor, 3);
    }

    #[test]
    fn set_without_readable_frames_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1_df.data"), b"bad").unwrap();
        let set = FrameSet::scan(dir.path(), FrameKind::Dark, ExposureLabel::Short).unwrap();
        let result = averager(DivisorPolicy::default()).average_set(&set);
        assert!(matches!(result, Err(CalibrationError::ValidationError(_))));
    }

    #[test]
    fn pair_requires_matching_labels() {
        let set = FrameSet::new(FrameKind::Dark, ExposureLabel::Long, vec!["x.data".into()]).unwrap();
        let result = averager(DivisorPolicy::default()).average_pair(&set, &set);
        assert!(matches!(result, Err(CalibrationError::ValidationError(_))));
    }
}
