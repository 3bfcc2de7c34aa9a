//! Destinations for per-frame diagnostics.
//!
//! The averager is handed a sink instead of logging through a global so that
//! callers decide where the diagnostic log goes.

use tracing::info;

use crate::image_pipeline::calibration::stats::FrameStats;
use crate::image_pipeline::calibration::types::{ExposureLabel, FrameKind};

/// One line of the diagnostic log.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStatsRecord {
    pub kind: FrameKind,
    pub exposure: ExposureLabel,
    pub frame: String,
    pub stats: FrameStats,
}

impl FrameStatsRecord {
    /// `DF 5ms: 2_df: mean: 102.00, median: 102.00, std: 0.00, var: 0.00`
    pub fn legend(&self) -> String {
        format!(
            "{} {}: {}: mean: {:.2}, median: {:.2}, std: {:.2}, var: {:.2}",
            self.kind,
            self.exposure,
            self.frame,
            self.stats.mean,
            self.stats.median,
            self.stats.std_dev,
            self.stats.variance
        )
    }
}

/// Append-only receiver of frame statistics.
pub trait FrameStatsSink {
    fn record(&mut self, record: FrameStatsRecord);
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatsSink;

impl FrameStatsSink for TracingStatsSink {
    fn record(&mut self, record: FrameStatsRecord) {
        info!(
            kind = %record.kind,
            exposure = %record.exposure,
            frame = %record.frame,
            mean = record.stats.mean,
            median = record.stats.median,
            std = record.stats.std_dev,
            var = record.stats.variance,
            "{}",
            record.legend()
        );
    }
}

/// Collects records in memory.
impl FrameStatsSink for Vec<FrameStatsRecord> {
    fn record(&mut self, record: FrameStatsRecord) {
        self.push(record);
    }
}

impl<S: FrameStatsSink + ?Sized> FrameStatsSink for &mut S {
    fn record(&mut self, record: FrameStatsRecord) {
        (**self).record(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_uses_two_decimals() {
        let record = FrameStatsRecord {
            kind: FrameKind::Dark,
            exposure: ExposureLabel::Short,
            frame: "2_df".to_string(),
            stats: FrameStats {
                mean: 102.0,
                median: 102.0,
                std_dev: 0.0,
                variance: 0.0,
            },
        };
        assert_eq!(
            record.legend(),
            "DF 5ms: 2_df: mean: 102.00, median: 102.00, std: 0.00, var: 0.00"
        );
    }

    #[test]
    fn vec_sink_appends_in_order() {
        let mut sink: Vec<FrameStatsRecord> = Vec::new();
        let stats = FrameStats { mean: 1.0, median: 1.0, std_dev: 0.0, variance: 0.0 };
        for frame in ["a", "b"] {
            sink.record(FrameStatsRecord {
                kind: FrameKind::White,
                exposure: ExposureLabel::Long,
                frame: frame.to_string(),
                stats,
            });
        }
        assert_eq!(sink.iter().map(|r| r.frame.as_str()).collect::<Vec<_>>(), ["a", "b"]);
    }
}
