use serde::{Deserialize, Serialize};

/// Selects how the representative error sub-distribution is extracted from
/// the sorted list of all observed errors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RangeExtractionStrategy {
    /// Errors between two interpolated percentile values, bounds inclusive.
    PercentileRange { lower: f64, upper: f64 },
    /// The window of fixed value-width containing the most errors, then
    /// stretched by absorbing nearby errors within the extension tolerance.
    HighDensityRange {
        max_length: f64,
        extension_tolerance: f64,
    },
    /// The largest single-linkage cluster of errors chained by gaps within
    /// the tolerance.
    ToleranceCluster { tolerance: f64 },
    /// Every error unchanged.
    WholeRange,
}

/// A contiguous band of a sorted error distribution.
///
/// `items` is always a subset of the source list. `index_range` holds the
/// inclusive index bounds of the extracted items in the source list, `None`
/// when nothing was extracted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionRange {
    pub lower: f64,
    pub upper: f64,
    pub index_range: Option<(usize, usize)>,
    pub items: Vec<f64>,
}

impl DistributionRange {
    fn from_indices(errors: &[f64], first: usize, last: usize) -> Self {
        DistributionRange {
            lower: errors[first],
            upper: errors[last],
            index_range: Some((first, last)),
            items: errors[first..=last].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Extracts every error unchanged.
pub fn whole_range(errors: &[f64]) -> DistributionRange {
    if errors.is_empty() {
        return DistributionRange::default();
    }
    DistributionRange::from_indices(errors, 0, errors.len() - 1)
}

/// A percentile value over the sorted list, interpolated linearly between
/// order statistics at position `1 + p/100 * (n - 1)` and clamped to the
/// extremes.
fn percentile_value(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    let position = 1.0 + percentile / 100.0 * (n as f64 - 1.0);
    if position <= 1.0 {
        return sorted[0];
    }
    if position >= n as f64 {
        return sorted[n - 1];
    }
    let lower_index = position.floor() as usize - 1;
    let fraction = position - position.floor();
    sorted[lower_index] + fraction * (sorted[lower_index + 1] - sorted[lower_index])
}

/// Extracts all errors between the two interpolated percentile values,
/// bounds inclusive.
pub fn interpercentile_range(
    errors: &[f64],
    lower_percentile: f64,
    upper_percentile: f64,
) -> DistributionRange {
    if errors.is_empty() {
        return DistributionRange::default();
    }

    let lower = percentile_value(errors, lower_percentile);
    let upper = percentile_value(errors, upper_percentile);

    let first = errors.partition_point(|&e| e < lower);
    let end = errors.partition_point(|&e| e <= upper);
    if first >= end {
        return DistributionRange {
            lower,
            upper,
            index_range: None,
            items: Vec::new(),
        };
    }

    DistributionRange {
        lower,
        upper,
        index_range: Some((first, end - 1)),
        items: errors[first..end].to_vec(),
    }
}

/// Slides a window of the given value-width over the sorted errors and keeps
/// the position containing the most errors. Ties break toward the
/// lowest-valued window. A single element is trivially both bounds.
pub fn fixed_length_range(errors: &[f64], max_length: f64) -> DistributionRange {
    if errors.is_empty() {
        return DistributionRange::default();
    }

    let mut best_first = 0;
    let mut best_last = 0;
    let mut last = 0;

    for first in 0..errors.len() {
        if last < first {
            last = first;
        }
        while last + 1 < errors.len() && errors[last + 1] - errors[first] <= max_length {
            last += 1;
        }
        if last - first > best_last - best_first {
            best_first = first;
            best_last = last;
        }
    }

    DistributionRange::from_indices(errors, best_first, best_last)
}

/// Stretches a range by repeatedly absorbing the next error outside either
/// bound while its distance to the nearest included error is within the
/// tolerance. The result never holds fewer items than the input range.
pub fn tolerance_extension_range(
    errors: &[f64],
    range: &DistributionRange,
    tolerance: f64,
) -> DistributionRange {
    let Some((mut first, mut last)) = range.index_range else {
        return range.clone();
    };

    loop {
        let mut extended = false;
        if first > 0 && errors[first] - errors[first - 1] <= tolerance {
            first -= 1;
            extended = true;
        }
        if last + 1 < errors.len() && errors[last + 1] - errors[last] <= tolerance {
            last += 1;
            extended = true;
        }
        if !extended {
            break;
        }
    }

    DistributionRange::from_indices(errors, first, last)
}

/// Chains consecutive errors into clusters while their gap is within the
/// tolerance and returns the cluster with the most items. Ties break toward
/// the earliest cluster.
pub fn most_populated_cluster(errors: &[f64], tolerance: f64) -> DistributionRange {
    if errors.is_empty() {
        return DistributionRange::default();
    }

    let mut best_first = 0;
    let mut best_last = 0;
    let mut first = 0;

    for i in 1..errors.len() {
        if errors[i] - errors[i - 1] > tolerance {
            if i - 1 - first > best_last - best_first {
                best_first = first;
                best_last = i - 1;
            }
            first = i;
        }
    }
    if errors.len() - 1 - first > best_last - best_first {
        best_first = first;
        best_last = errors.len() - 1;
    }

    DistributionRange::from_indices(errors, best_first, best_last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use statrs::statistics::Statistics;

    #[test]
    fn test_whole_range() {
        let errors = vec![-3.0, 0.0, 4.0];
        let range = whole_range(&errors);
        assert_eq!(range.items, errors);
        assert_eq!(range.lower, -3.0);
        assert_eq!(range.upper, 4.0);
    }

    #[test]
    fn test_interpercentile_excludes_extremes() {
        let errors = vec![-5.0, -2.0, -1.0, 0.0, 1.0, 2.0, 5.0];
        let range = interpercentile_range(&errors, 25.0, 75.0);

        assert!(range.lower > -5.0);
        assert!(range.upper < 5.0);
        assert!(!range.items.contains(&-5.0));
        assert!(!range.items.contains(&5.0));
        assert_relative_eq!((&range.items).mean(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_interpercentile_resists_asymmetric_outlier() {
        let errors = vec![-5.0, -2.0, -1.0, 0.0, 1.0, 2.0, 5.0, 20.0];
        let range = interpercentile_range(&errors, 25.0, 75.0);

        assert!(!range.items.contains(&20.0));
        let extracted_mean = (&range.items).mean();
        let whole_mean = (&errors).mean();
        assert!(extracted_mean.abs() < 1.0);
        assert!(whole_mean > 2.0);
    }

    #[test]
    fn test_interpercentile_single_element() {
        let errors = vec![3.5];
        let range = interpercentile_range(&errors, 10.0, 90.0);
        assert_eq!(range.items, vec![3.5]);
    }

    #[test]
    fn test_fixed_length_range_finds_densest_window() {
        let errors = vec![-10.0, 1.0, 1.2, 1.4, 1.6, 9.0, 9.1];
        let range = fixed_length_range(&errors, 1.0);
        assert_eq!(range.items, vec![1.0, 1.2, 1.4, 1.6]);
    }

    #[test]
    fn test_fixed_length_range_tie_breaks_low() {
        let errors = vec![0.0, 0.1, 5.0, 5.1];
        let range = fixed_length_range(&errors, 0.5);
        assert_eq!(range.items, vec![0.0, 0.1]);
    }

    #[test]
    fn test_fixed_length_range_single_element() {
        let errors = vec![2.0];
        let range = fixed_length_range(&errors, 0.0);
        assert_eq!(range.items, vec![2.0]);
        assert_eq!(range.lower, 2.0);
        assert_eq!(range.upper, 2.0);
    }

    #[test]
    fn test_tolerance_extension_absorbs_near_misses() {
        let errors = vec![-10.0, 0.8, 1.0, 1.2, 1.4, 1.9, 2.3, 9.0];
        let window = fixed_length_range(&errors, 0.6);
        assert_eq!(window.items, vec![0.8, 1.0, 1.2, 1.4]);

        let extended = tolerance_extension_range(&errors, &window, 0.5);
        assert_eq!(extended.items, vec![0.8, 1.0, 1.2, 1.4, 1.9, 2.3]);
    }

    #[test]
    fn test_tolerance_extension_is_monotonic() {
        let errors = vec![-4.0, -1.0, -0.5, 0.0, 0.4, 0.9, 1.5, 7.0];
        let window = fixed_length_range(&errors, 1.0);
        for &tolerance in &[0.0, 0.1, 0.5, 1.0, 10.0] {
            let extended = tolerance_extension_range(&errors, &window, tolerance);
            assert!(extended.len() >= window.len());
        }
    }

    #[test]
    fn test_most_populated_cluster() {
        let errors = vec![-9.0, -8.9, 1.0, 1.3, 1.6, 1.9, 12.0];
        let range = most_populated_cluster(&errors, 0.5);
        assert_eq!(range.items, vec![1.0, 1.3, 1.6, 1.9]);
    }

    #[test]
    fn test_most_populated_cluster_trailing() {
        let errors = vec![0.0, 5.0, 5.1, 5.2];
        let range = most_populated_cluster(&errors, 0.5);
        assert_eq!(range.items, vec![5.0, 5.1, 5.2]);
    }

    #[test]
    fn test_empty_input_is_safe() {
        let errors: Vec<f64> = Vec::new();
        assert!(whole_range(&errors).is_empty());
        assert!(interpercentile_range(&errors, 25.0, 75.0).is_empty());
        assert!(fixed_length_range(&errors, 1.0).is_empty());
        assert!(most_populated_cluster(&errors, 1.0).is_empty());
        let empty = DistributionRange::default();
        assert!(tolerance_extension_range(&errors, &empty, 1.0).is_empty());
    }
}
