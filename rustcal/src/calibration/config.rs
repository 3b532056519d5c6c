use mscal::algorithm::distribution::RangeExtractionStrategy;
use mscal::algorithm::matching::MzTolerance;
use mscal::algorithm::trend::TrendStrategy;
use serde::{Deserialize, Serialize};

/// Full configuration of one mass calibration run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Max m/z difference between a calibrant and a measured peak.
    pub mz_tolerance: MzTolerance,
    /// Max retention time difference between a calibrant and the scan it is
    /// matched in. `None` matches across the whole run.
    pub rt_tolerance: Option<f64>,
    /// Peaks below this intensity are ignored during matching, 0 disables.
    pub intensity_threshold: f64,
    /// Collapse exact-duplicate error values before bias estimation so a
    /// calibrant recurring in many scans does not dominate the estimate.
    pub filter_duplicate_errors: bool,
    /// How the representative error sub-distribution is extracted.
    pub range_extraction: RangeExtractionStrategy,
    /// Error-versus-m/z trend; `None` applies the scalar bias estimate to
    /// every peak.
    pub trend: Option<TrendStrategy>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            mz_tolerance: MzTolerance::new(0.001, 5.0),
            rt_tolerance: None,
            intensity_threshold: 0.0,
            filter_duplicate_errors: false,
            range_extraction: RangeExtractionStrategy::PercentileRange {
                lower: 25.0,
                upper: 75.0,
            },
            trend: None,
        }
    }
}
