use std::path::{Path, PathBuf};

use tracing::debug;

use crate::image_pipeline::calibration::types::{ExposureLabel, FrameKind};
use crate::image_pipeline::common::error::{CalibrationError, Result};

/// Extension of stored unpacked frames.
pub const DATA_EXTENSION: &str = "data";

/// Ordered, non-empty list of frame files sharing one exposure.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    kind: FrameKind,
    exposure: ExposureLabel,
    paths: Vec<PathBuf>,
}

impl FrameSet {
    pub fn new(kind: FrameKind, exposure: ExposureLabel, paths: Vec<PathBuf>) -> Result<Self> {
        if paths.is_empty() {
            return Err(CalibrationError::ValidationError(format!(
                "{} {} frame set is empty",
                kind, exposure
            )));
        }
        Ok(Self {
            kind,
            exposure,
            paths,
        })
    }

    /// Collects the `*.data` regular files of `dir`, sorted by path. Hidden
    /// files are not frames.
    pub fn scan<P: AsRef<Path>>(dir: P, kind: FrameKind, exposure: ExposureLabel) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CalibrationError::InputReadError(format!("{}: {}", dir.display(), e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_hidden = path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with('.'));
            let is_data = path
                .extension()
                .is_some_and(|ext| ext == DATA_EXTENSION);
            if is_data && !is_hidden && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        debug!(dir = %dir.display(), frames = paths.len(), "Scanned frame set");
        Self::new(kind, exposure, paths)
            .map_err(|_| CalibrationError::ValidationError(format!(
                "no .data frames in {}",
                dir.display()
            )))
    }

    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    pub fn exposure(&self) -> ExposureLabel {
        self.exposure
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of files listed, readable or not.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Name a frame is logged under: its file stem.
pub fn frame_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_keeps_sorted_data_files_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2_df.data", "1_df.data", "notes.txt", "10_df.data"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.data")).unwrap();

        let set = FrameSet::scan(dir.path(), FrameKind::Dark, ExposureLabel::Short).unwrap();
        let names: Vec<String> = set.paths().iter().map(|p| frame_name(p)).collect();
        assert_eq!(names, ["10_df", "1_df", "2_df"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn scan_skips_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [".tmp.data", "1_wf.data", ".2_wf.data"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let set = FrameSet::scan(dir.path(), FrameKind::White, ExposureLabel::Short).unwrap();
        assert_eq!(set.paths(), [dir.path().join("1_wf.data")]);

        std::fs::remove_file(dir.path().join("1_wf.data")).unwrap();
        let result = FrameSet::scan(dir.path(), FrameKind::White, ExposureLabel::Short);
        assert!(matches!(result, Err(CalibrationError::ValidationError(_))));
    }

    #[test]
    fn empty_directory_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FrameSet::scan(dir.path(), FrameKind::White, ExposureLabel::Long);
        assert!(matches!(result, Err(CalibrationError::ValidationError(_))));
    }

    #[test]
    fn missing_directory_is_input_read_error() {
        let result = FrameSet::scan("/nonexistent/df5", FrameKind::Dark, ExposureLabel::Short);
        assert!(matches!(result, Err(CalibrationError::InputReadError(_))));
    }
}
