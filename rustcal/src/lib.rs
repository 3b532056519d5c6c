// data module
pub mod data {
    pub mod scans;
    pub mod standards;
}

// calibration module
pub mod calibration {
    pub mod config;
    pub mod error;
    pub mod task;
}
