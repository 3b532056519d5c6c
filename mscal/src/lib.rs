// data module
pub mod data {
    pub mod calibrant;
    pub mod peak;
}

// algorithm module
pub mod algorithm {
    pub mod bias;
    pub mod distribution;
    pub mod error_model;
    pub mod matching;
    pub mod trend;
}
