use mscal::algorithm::distribution::RangeExtractionStrategy;
use mscal::algorithm::matching::MzTolerance;
use mscal::data::calibrant::{Calibrant, CalibrantList};
use mscal::data::peak::MassList;
use rustcal::calibration::config::CalibrationConfig;
use rustcal::calibration::task::CalibrationTask;
use rustcal::data::scans::{InMemoryScanFile, Scan};

fn main() {
    env_logger::init();

    // Example: ten scans of three known ions, all drifted by roughly +2.5 ppm
    let calibrants = CalibrantList::new(vec![
        Calibrant::new(150.0, None),
        Calibrant::new(400.0, None),
        Calibrant::new(750.0, None),
    ]);

    let mut file = InMemoryScanFile::new("demo_run");
    for scan_index in 0..10 {
        let drift_ppm = 2.5 + 0.05 * scan_index as f64;
        let mz: Vec<f64> = [150.0, 400.0, 750.0]
            .iter()
            .map(|reference| reference * (1.0 + drift_ppm * 1e-6))
            .collect();
        let intensity = vec![1e4, 5e4, 2e4];
        file.push_scan(Scan::new(
            scan_index as f64,
            Some(MassList::new(mz, intensity)),
        ));
    }

    let config = CalibrationConfig {
        mz_tolerance: MzTolerance::new(0.001, 10.0),
        range_extraction: RangeExtractionStrategy::PercentileRange {
            lower: 10.0,
            upper: 90.0,
        },
        ..CalibrationConfig::default()
    };

    let mut task = CalibrationTask::new(config, &calibrants);
    match task.run(&mut file) {
        Ok(report) => {
            println!("bias estimate: {:.4} ppm", report.bias_estimate);
            println!("matches: {}", report.matches.len());
            println!(
                "report: {}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        }
        Err(e) => eprintln!("calibration failed: {}", e),
    }
}
