//! Labels and policies of the calibration stages

use std::fmt;

/// Exposure duration a frame set was captured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExposureLabel {
    /// 5 ms
    Short,
    /// 50 ms
    Long,
}

impl ExposureLabel {
    pub const ALL: [ExposureLabel; 2] = [ExposureLabel::Short, ExposureLabel::Long];

    pub fn millis(self) -> u32 {
        match self {
            ExposureLabel::Short => 5,
            ExposureLabel::Long => 50,
        }
    }
}

impl fmt::Display for ExposureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.millis())
    }
}

/// What a frame set characterizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Captured without light
    Dark,
    /// Captured under uniform illumination
    White,
}

impl FrameKind {
    /// Prefix used in directory and file names.
    pub fn prefix(self) -> &'static str {
        match self {
            FrameKind::Dark => "df",
            FrameKind::White => "wf",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameKind::Dark => "DF",
            FrameKind::White => "WF",
        })
    }
}

/// Divisor used when averaging a pair of frame sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DivisorPolicy {
    /// Both sets are divided by the number of files listed in the
    /// short-exposure set. Wrong whenever the two sets differ in size; kept
    /// so averages stay comparable with previously stored ones.
    #[default]
    ShortSetFileCount,
    /// Each set is divided by the number of frames actually summed.
    SummedFrameCount,
}

/// Dark baseline used by the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselineBlend {
    /// Mean of the short and long baselines, whatever the target's exposure.
    #[default]
    Both,
    /// Only the baseline with the target's exposure.
    ExposureMatched,
}
