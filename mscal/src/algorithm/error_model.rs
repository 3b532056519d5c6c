use serde::{Deserialize, Serialize};

/// Defines how a scalar measurement error is computed from a measured and a
/// reference value, and how a measured value is corrected given such an error.
pub trait MassErrorModel {
    fn error(&self, measured: f64, reference: f64) -> f64;
    fn correct(&self, measured: f64, error: f64) -> f64;
}

/// Mass measurement error in parts-per-million of the reference mass.
///
/// `correct(measured, error(measured, reference))` recovers the reference up
/// to floating point precision for any non-zero reference. Reference masses
/// are positive by construction of the calibrant list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PpmError;

impl MassErrorModel for PpmError {
    fn error(&self, measured: f64, reference: f64) -> f64 {
        (measured - reference) / reference * 1e6
    }

    fn correct(&self, measured: f64, error: f64) -> f64 {
        measured / (1.0 + error * 1e-6)
    }
}
