use serde::{Deserialize, Serialize};

use crate::algorithm::error_model::{MassErrorModel, PpmError};
use crate::data::calibrant::CalibrantList;
use crate::data::peak::MassList;

/// Maximum allowed m/z difference, the larger of an absolute and a ppm window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MzTolerance {
    pub absolute: f64,
    pub ppm: f64,
}

impl MzTolerance {
    pub fn new(absolute: f64, ppm: f64) -> Self {
        MzTolerance { absolute, ppm }
    }

    /// Inclusive tolerance window around the given m/z.
    pub fn bounds(&self, mz: f64) -> (f64, f64) {
        let half_window = f64::max(self.absolute, mz * self.ppm * 1e-6);
        (mz - half_window, mz + half_window)
    }
}

/// One accepted pairing between a measured m/z peak and a calibrant.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MassPeakMatch {
    pub measured_mz: f64,
    pub measured_rt: f64,
    pub calibrant_mz: f64,
    pub calibrant_rt: Option<f64>,
    pub mz_error: f64,
    pub scan_index: usize,
    pub peak_index: usize,
}

/// Counters over peak matching outcomes, accumulated across scans.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct MatchStats {
    pub considered: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub ambiguous: usize,
}

impl MatchStats {
    pub fn add(&mut self, other: &MatchStats) {
        self.considered += other.considered;
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.ambiguous += other.ambiguous;
    }
}

/// Matches m/z peaks of one mass list against a calibrant list.
///
/// When more than a single calibrant is within the tolerance window no match
/// is made, the peak might correspond to different ions giving different m/z
/// errors in later calibration stages. Only peaks with intensity equal or
/// above the threshold are considered.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PeakMatcher {
    pub mz_tolerance: MzTolerance,
    pub rt_tolerance: Option<f64>,
    pub intensity_threshold: f64,
}

impl PeakMatcher {
    pub fn new(mz_tolerance: MzTolerance) -> Self {
        PeakMatcher {
            mz_tolerance,
            rt_tolerance: None,
            intensity_threshold: 0.0,
        }
    }

    /// Pairs each sufficiently intense peak with at most one calibrant within
    /// tolerance, counting unmatched and ambiguous peaks in `stats`.
    pub fn match_mass_list(
        &self,
        calibrants: &CalibrantList,
        mass_list: &MassList,
        retention_time: f64,
        scan_index: usize,
        stats: &mut MatchStats,
    ) -> Vec<MassPeakMatch> {
        let rt_narrowed;
        let candidates_source: &CalibrantList = match self.rt_tolerance {
            Some(tolerance) => {
                rt_narrowed = calibrants.in_ranges(
                    None,
                    Some((retention_time - tolerance, retention_time + tolerance)),
                );
                &rt_narrowed
            }
            None => calibrants,
        };

        let error_model = PpmError;
        let mut matches = Vec::new();

        for (peak_index, (mz, intensity)) in mass_list.iter().enumerate() {
            if intensity < self.intensity_threshold {
                continue;
            }
            stats.considered += 1;

            let (mz_min, mz_max) = self.mz_tolerance.bounds(mz);
            let candidates = candidates_source.in_ranges(Some((mz_min, mz_max)), None);

            match candidates.calibrants() {
                [calibrant] => {
                    stats.matched += 1;
                    matches.push(MassPeakMatch {
                        measured_mz: mz,
                        measured_rt: retention_time,
                        calibrant_mz: calibrant.mz,
                        calibrant_rt: calibrant.retention_time,
                        mz_error: error_model.error(mz, calibrant.mz),
                        scan_index,
                        peak_index,
                    });
                }
                [] => stats.unmatched += 1,
                _ => stats.ambiguous += 1,
            }
        }

        matches
    }
}
