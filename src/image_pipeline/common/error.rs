use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Malformed raw buffer: {0}")]
    FormatError(String),

    #[error("Invalid buffer length for {context}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Frame dimensions {actual_width}x{actual_height} do not match {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Degenerate normalization: {0}")]
    NumericError(String),

    #[error("Invalid parameter: {0}")]
    ValidationError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CalibrationError {
    /// True for errors caused by the content of one input file. Batch
    /// operations skip such files instead of aborting.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            CalibrationError::InputReadError(_)
                | CalibrationError::FormatError(_)
                | CalibrationError::InvalidLength { .. }
                | CalibrationError::DimensionMismatch { .. }
                | CalibrationError::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
