use mscal::data::peak::MassList;
use serde::{Deserialize, Serialize};

/// One acquisition: a retention time, the detected mass list (absent when no
/// peak detection ran on this scan) and, after calibration, the corrected
/// mass list. The detected mass list is never overwritten.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scan {
    pub retention_time: f64,
    pub mass_list: Option<MassList>,
    pub calibrated_mass_list: Option<MassList>,
}

impl Scan {
    pub fn new(retention_time: f64, mass_list: Option<MassList>) -> Self {
        Scan {
            retention_time,
            mass_list,
            calibrated_mass_list: None,
        }
    }
}

/// Storage abstraction over the scans of one raw data file.
pub trait ScanStorage {
    fn name(&self) -> &str;
    fn scan_count(&self) -> usize;
    fn retention_time(&self, scan_index: usize) -> f64;
    fn mass_list(&self, scan_index: usize) -> Option<&MassList>;
    fn add_calibrated_mass_list(&mut self, scan_index: usize, mass_list: MassList);
}

/// In-memory scan storage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryScanFile {
    pub name: String,
    pub scans: Vec<Scan>,
}

impl InMemoryScanFile {
    pub fn new(name: &str) -> Self {
        InMemoryScanFile {
            name: name.to_string(),
            scans: Vec::new(),
        }
    }

    pub fn push_scan(&mut self, scan: Scan) {
        self.scans.push(scan);
    }
}

impl ScanStorage for InMemoryScanFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan_count(&self) -> usize {
        self.scans.len()
    }

    fn retention_time(&self, scan_index: usize) -> f64 {
        self.scans[scan_index].retention_time
    }

    fn mass_list(&self, scan_index: usize) -> Option<&MassList> {
        self.scans[scan_index].mass_list.as_ref()
    }

    fn add_calibrated_mass_list(&mut self, scan_index: usize, mass_list: MassList) {
        self.scans[scan_index].calibrated_mass_list = Some(mass_list);
    }
}
