use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Represents the detected peaks of one scan, m/z values with parallel intensities.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MassList {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl MassList {
    /// Constructs a new `MassList`.
    ///
    /// # Arguments
    ///
    /// * `mz` - A vector of m/z values.
    /// * `intensity` - A vector of intensity values corresponding to the m/z values.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mscal::data::peak::MassList;
    /// let mass_list = MassList::new(vec![100.0, 200.0], vec![10.0, 20.0]);
    /// assert_eq!(mass_list.mz, vec![100.0, 200.0]);
    /// assert_eq!(mass_list.intensity, vec![10.0, 20.0]);
    /// ```
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        MassList { mz, intensity }
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Iterates over `(mz, intensity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.mz.iter().copied().zip(self.intensity.iter().copied())
    }
}

impl Display for MassList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let max_peak = self
            .mz
            .iter()
            .zip(self.intensity.iter())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

        match max_peak {
            Some((mz, intensity)) => write!(
                f,
                "MassList(data points: {}, max by intensity: ({:.4}, {}))",
                self.len(),
                mz,
                intensity
            ),
            None => write!(f, "MassList(empty)"),
        }
    }
}
