use std::path::Path;

use mscal::data::calibrant::{Calibrant, CalibrantList};

use crate::calibration::error::CalibrationError;

/// Reads a calibrant list from a CSV file.
///
/// The first column is the calibrant m/z, an optional second column is its
/// retention time. Lines starting with `#` and blank fields are skipped. An
/// empty result is an error, calibrating against nothing is never intended.
pub fn read_calibrants_csv(path: &Path) -> Result<CalibrantList, CalibrationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut calibrants = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mz_field = match record.get(0) {
            Some(field) if !field.is_empty() => field,
            _ => continue,
        };
        let mz: f64 = mz_field.parse().map_err(|_| {
            CalibrationError::InvalidStandardsList(format!("invalid m/z value '{}'", mz_field))
        })?;

        let retention_time = match record.get(1) {
            Some(field) if !field.is_empty() => Some(field.parse().map_err(|_| {
                CalibrationError::InvalidStandardsList(format!(
                    "invalid retention time '{}'",
                    field
                ))
            })?),
            _ => None,
        };

        calibrants.push(Calibrant::new(mz, retention_time));
    }

    if calibrants.is_empty() {
        return Err(CalibrationError::InvalidStandardsList(
            "empty calibrant list, expected at least one row with an m/z value".to_string(),
        ));
    }

    Ok(CalibrantList::new(calibrants))
}
