use thiserror::Error;

/// Errors terminating a calibration run.
///
/// A run producing zero matches is not an error: it proceeds with a bias of
/// zero and a warning flag on the report.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The calibrant list could not be used, the run aborts before matching.
    #[error("invalid calibrant list: {0}")]
    InvalidStandardsList(String),

    /// I/O failure while reading a calibrant list file.
    #[error("failed to read calibrant list: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed calibrant list file.
    #[error("failed to parse calibrant list: {0}")]
    Csv(#[from] csv::Error),

    /// The raw data file has no scan with a mass list, fatal for this file
    /// only.
    #[error("{file} has no mass list")]
    NoMassList { file: String },

    /// The run was cancelled by the caller, nothing was written back.
    #[error("calibration cancelled")]
    Cancelled,
}
