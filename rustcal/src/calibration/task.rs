use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use mscal::algorithm::bias;
use mscal::algorithm::distribution::DistributionRange;
use mscal::algorithm::error_model::{MassErrorModel, PpmError};
use mscal::algorithm::matching::{MassPeakMatch, MatchStats, PeakMatcher};
use mscal::algorithm::trend::TrendModel;
use mscal::data::calibrant::CalibrantList;
use mscal::data::peak::MassList;

use crate::calibration::config::CalibrationConfig;
use crate::calibration::error::CalibrationError;
use crate::data::scans::ScanStorage;

/// Stage of a calibration run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RunStage {
    Pending,
    MatchingPeaks,
    EstimatingBias,
    CalibratingMassLists,
    Finished,
    Failed,
    Cancelled,
}

/// Cooperative cancellation flag shared between a run and its caller.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Scan-level progress of a two-pass run, readable from other threads.
///
/// Every scan is counted twice, once per pass, so the fraction climbs
/// monotonically from 0 to 1 and reaches 0.5 at the pass boundary.
#[derive(Debug, Default)]
pub struct RunProgress {
    processed_scans: AtomicUsize,
    total_scans: AtomicUsize,
}

impl RunProgress {
    pub fn finished_fraction(&self) -> f64 {
        let total = self.total_scans.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let processed = self.processed_scans.load(Ordering::Relaxed);
        processed as f64 / (2 * total) as f64
    }
}

/// Artifacts of a finished calibration run.
#[derive(Clone, Debug, Serialize)]
pub struct CalibrationReport {
    /// All accepted matches, sorted by measured m/z.
    pub matches: Vec<MassPeakMatch>,
    /// All observed errors, sorted ascending, duplicates included.
    pub errors: Vec<f64>,
    /// Every distribution range computed during bias estimation, keyed by a
    /// display name.
    pub error_ranges: HashMap<String, DistributionRange>,
    /// The scalar ppm bias estimate, zero when nothing matched.
    pub bias_estimate: f64,
    /// The fitted trend when one was configured, queryable at arbitrary m/z.
    pub trend: Option<TrendModel>,
    pub match_stats: MatchStats,
    /// Set when zero matches were made; the mass lists were shifted by zero.
    pub no_matches: bool,
}

/// Calibrates the mass lists of one raw data file against a calibrant list.
///
/// The run is an explicit two-pass pipeline: match peaks over all scans,
/// estimate the bias (and optionally fit a trend) from the complete error
/// population, then rewrite every mass list against the frozen estimate.
pub struct CalibrationTask<'a> {
    config: CalibrationConfig,
    calibrants: &'a CalibrantList,
    token: CancellationToken,
    progress: Arc<RunProgress>,
    stage: RunStage,
}

impl<'a> CalibrationTask<'a> {
    pub fn new(config: CalibrationConfig, calibrants: &'a CalibrantList) -> Self {
        CalibrationTask {
            config,
            calibrants,
            token: CancellationToken::new(),
            progress: Arc::new(RunProgress::default()),
            stage: RunStage::Pending,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Runs the full calibration on one file.
    ///
    /// Fails only when the file has no mass list at all or the caller
    /// cancelled; zero matches is reported, not raised. On cancellation no
    /// calibrated mass list has been written back.
    pub fn run<S: ScanStorage>(&mut self, file: &mut S) -> Result<CalibrationReport, CalibrationError> {
        info!("started mass calibration on {}", file.name());
        self.stage = RunStage::MatchingPeaks;

        let total_scans = file.scan_count();
        self.progress.total_scans.store(total_scans, Ordering::Relaxed);

        if !(0..total_scans).any(|scan_index| file.mass_list(scan_index).is_some()) {
            self.stage = RunStage::Failed;
            return Err(CalibrationError::NoMassList {
                file: file.name().to_string(),
            });
        }

        let matcher = PeakMatcher {
            mz_tolerance: self.config.mz_tolerance,
            rt_tolerance: self.config.rt_tolerance,
            intensity_threshold: self.config.intensity_threshold,
        };

        // first pass: match peaks over all scans
        let mut matches: Vec<MassPeakMatch> = Vec::new();
        let mut match_stats = MatchStats::default();
        for scan_index in 0..total_scans {
            if self.token.is_cancelled() {
                self.stage = RunStage::Cancelled;
                return Err(CalibrationError::Cancelled);
            }

            if let Some(mass_list) = file.mass_list(scan_index) {
                let scan_matches = matcher.match_mass_list(
                    self.calibrants,
                    mass_list,
                    file.retention_time(scan_index),
                    scan_index,
                    &mut match_stats,
                );
                matches.extend(scan_matches);
            } else {
                debug!("scan {} of {} has no mass list, skipped", scan_index, file.name());
            }
            self.progress.processed_scans.fetch_add(1, Ordering::Relaxed);
        }

        self.stage = RunStage::EstimatingBias;

        let mut errors: Vec<f64> = matches.iter().map(|m| m.mz_error).collect();
        errors.sort_by(|a, b| a.total_cmp(b));

        let no_matches = errors.is_empty();
        if no_matches {
            warn!(
                "no matches were made between the calibrant list and the mass lists in {}, \
                 the bias estimate is zero and mass peaks will be shifted by zero",
                file.name()
            );
        }

        let estimate = bias::estimate_bias(
            &errors,
            self.config.range_extraction,
            self.config.filter_duplicate_errors,
        );
        info!(
            "{}: errors {}, extracted {}, bias estimate {:.4} ppm",
            file.name(),
            errors.len(),
            estimate.extracted.len(),
            estimate.bias
        );

        // the trend is fit from the full match set, duplicates included, to
        // preserve positional information across the m/z range
        let trend = self.config.trend.map(|strategy| {
            let points: Vec<(f64, f64)> =
                matches.iter().map(|m| (m.measured_mz, m.mz_error)).collect();
            TrendModel::fit(strategy, &points)
        });

        // second pass: rewrite every mass list against the frozen estimate
        self.stage = RunStage::CalibratingMassLists;
        let error_model = PpmError;
        let mut calibrated: Vec<(usize, MassList)> = Vec::new();
        for scan_index in 0..total_scans {
            if self.token.is_cancelled() {
                self.stage = RunStage::Cancelled;
                return Err(CalibrationError::Cancelled);
            }

            if let Some(mass_list) = file.mass_list(scan_index) {
                let mz = mass_list
                    .mz
                    .iter()
                    .map(|&mz| {
                        let error = match &trend {
                            Some(trend) => trend.evaluate(mz),
                            None => estimate.bias,
                        };
                        error_model.correct(mz, error)
                    })
                    .collect();
                calibrated.push((scan_index, MassList::new(mz, mass_list.intensity.clone())));
            }
            self.progress.processed_scans.fetch_add(1, Ordering::Relaxed);
        }

        // commit only once the whole pass survived cancellation
        for (scan_index, mass_list) in calibrated {
            file.add_calibrated_mass_list(scan_index, mass_list);
        }

        matches.sort_by(|a, b| a.measured_mz.total_cmp(&b.measured_mz));

        self.stage = RunStage::Finished;
        info!("finished mass calibration on {}", file.name());

        Ok(CalibrationReport {
            matches,
            errors,
            error_ranges: estimate.ranges,
            bias_estimate: estimate.bias,
            trend,
            match_stats,
            no_matches,
        })
    }
}

/// Calibrates several files in parallel. Runs are fully independent and share
/// only the immutable calibrant list.
pub fn calibrate_files<S: ScanStorage + Send>(
    files: &mut [S],
    config: &CalibrationConfig,
    calibrants: &CalibrantList,
) -> Vec<Result<CalibrationReport, CalibrationError>> {
    files
        .par_iter_mut()
        .map(|file| CalibrationTask::new(config.clone(), calibrants).run(file))
        .collect()
}
