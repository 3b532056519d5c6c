use serde::{Deserialize, Serialize};

/// A reference ion with known m/z and optionally known retention time,
/// expected to appear in the sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibrant {
    pub mz: f64,
    pub retention_time: Option<f64>,
}

impl Calibrant {
    pub fn new(mz: f64, retention_time: Option<f64>) -> Self {
        Calibrant { mz, retention_time }
    }
}

/// An immutable collection of calibrants ordered by m/z.
///
/// Range queries return a new filtered `CalibrantList` without mutating the
/// source, so a single list can be queried concurrently from multiple runs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CalibrantList {
    calibrants: Vec<Calibrant>,
}

impl CalibrantList {
    /// Constructs a new list, sorting the calibrants by m/z once so range
    /// queries can binary-search their bounds.
    pub fn new(mut calibrants: Vec<Calibrant>) -> Self {
        calibrants.sort_by(|a, b| a.mz.total_cmp(&b.mz));
        CalibrantList { calibrants }
    }

    pub fn len(&self) -> usize {
        self.calibrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calibrants.is_empty()
    }

    pub fn calibrants(&self) -> &[Calibrant] {
        &self.calibrants
    }

    /// Returns a new list holding the calibrants whose m/z and retention time
    /// fall inside the given inclusive ranges. A `None` range is unbounded, so
    /// `in_ranges(None, None)` returns the whole list. Calibrants without a
    /// retention time are excluded by a retention-time-bounded query.
    pub fn in_ranges(
        &self,
        mz_range: Option<(f64, f64)>,
        rt_range: Option<(f64, f64)>,
    ) -> CalibrantList {
        let slice = match mz_range {
            Some((mz_min, mz_max)) => {
                let start = self.calibrants.partition_point(|c| c.mz < mz_min);
                let end = self.calibrants.partition_point(|c| c.mz <= mz_max);
                &self.calibrants[start..end]
            }
            None => &self.calibrants[..],
        };

        let calibrants = match rt_range {
            Some((rt_min, rt_max)) => slice
                .iter()
                .filter(|c| {
                    c.retention_time
                        .map_or(false, |rt| rt_min <= rt && rt <= rt_max)
                })
                .copied()
                .collect(),
            None => slice.to_vec(),
        };

        // slices of a sorted list stay sorted
        CalibrantList { calibrants }
    }
}
