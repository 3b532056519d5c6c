use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::algorithm::distribution::{
    self, DistributionRange, RangeExtractionStrategy,
};

/// Arithmetic mean of a list of errors, zero when the list is empty.
pub fn arithmetic_mean(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    errors.mean()
}

/// Outcome of bias estimation over a sorted error list.
///
/// `ranges` holds every distribution range computed along the way keyed by a
/// display name, `extracted` is the one that drives the estimate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BiasEstimate {
    pub bias: f64,
    pub extracted: DistributionRange,
    pub ranges: HashMap<String, DistributionRange>,
}

/// Estimates the mass measurement bias from an ascending-sorted error list.
///
/// With `filter_duplicates` set, exact-duplicate error values are collapsed
/// first so a calibrant recurring in many scans cannot dominate the estimate
/// by sheer repetition. The bias is the arithmetic mean of the extracted
/// sub-distribution, zero when nothing was extracted.
pub fn estimate_bias(
    sorted_errors: &[f64],
    strategy: RangeExtractionStrategy,
    filter_duplicates: bool,
) -> BiasEstimate {
    let deduplicated: Vec<f64>;
    let errors: &[f64] = if filter_duplicates {
        deduplicated = sorted_errors
            .iter()
            .copied()
            .map(OrderedFloat)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(OrderedFloat::into_inner)
            .collect();
        &deduplicated
    } else {
        sorted_errors
    };

    let mut ranges = HashMap::new();
    let extracted = if errors.is_empty() {
        DistributionRange::default()
    } else {
        match strategy {
            RangeExtractionStrategy::PercentileRange { lower, upper } => {
                let range = distribution::interpercentile_range(errors, lower, upper);
                ranges.insert("percentile range".to_string(), range.clone());
                range
            }
            RangeExtractionStrategy::HighDensityRange {
                max_length,
                extension_tolerance,
            } => {
                let window = distribution::fixed_length_range(errors, max_length);
                let extended =
                    distribution::tolerance_extension_range(errors, &window, extension_tolerance);
                ranges.insert("high-density range of errors".to_string(), window);
                if extension_tolerance > 0.0 {
                    ranges.insert("tolerance-extended range".to_string(), extended.clone());
                }
                extended
            }
            RangeExtractionStrategy::ToleranceCluster { tolerance } => {
                let cluster = distribution::most_populated_cluster(errors, tolerance);
                ranges.insert("biggest range by tolerance".to_string(), cluster.clone());
                cluster
            }
            RangeExtractionStrategy::WholeRange => {
                let range = distribution::whole_range(errors);
                ranges.insert("whole range".to_string(), range.clone());
                range
            }
        }
    };

    let bias = arithmetic_mean(&extracted.items);
    BiasEstimate {
        bias,
        extracted,
        ranges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(arithmetic_mean(&[]), 0.0);
    }

    #[test]
    fn test_empty_errors_give_zero_bias() {
        let estimate = estimate_bias(&[], RangeExtractionStrategy::WholeRange, false);
        assert_eq!(estimate.bias, 0.0);
        assert!(estimate.extracted.is_empty());
        assert!(estimate.ranges.is_empty());
    }

    #[test]
    fn test_duplicate_filter_collapses_repeats() {
        let errors = vec![1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0];

        let with_duplicates =
            estimate_bias(&errors, RangeExtractionStrategy::WholeRange, false);
        assert_eq!(with_duplicates.extracted.len(), 7);

        let unique = estimate_bias(&errors, RangeExtractionStrategy::WholeRange, true);
        assert_eq!(unique.extracted.items, vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(unique.bias, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_high_density_strategy_reports_both_ranges() {
        let errors = vec![-10.0, 1.0, 1.25, 1.5, 2.0, 9.0];
        let estimate = estimate_bias(
            &errors,
            RangeExtractionStrategy::HighDensityRange {
                max_length: 0.5,
                extension_tolerance: 0.5,
            },
            false,
        );

        assert!(estimate.ranges.contains_key("high-density range of errors"));
        assert!(estimate.ranges.contains_key("tolerance-extended range"));
        // the window is [1.0, 1.5]; the gap of exactly 0.5 up to 2.0 is
        // within the tolerance, bounds inclusive
        assert_eq!(estimate.extracted.items, vec![1.0, 1.25, 1.5, 2.0]);
        assert_relative_eq!(estimate.bias, 1.4375, epsilon = 1e-12);
    }

    #[test]
    fn test_high_density_without_extension_reports_window_only() {
        let errors = vec![1.0, 1.2, 1.4, 9.0];
        let estimate = estimate_bias(
            &errors,
            RangeExtractionStrategy::HighDensityRange {
                max_length: 0.5,
                extension_tolerance: 0.0,
            },
            false,
        );

        assert!(estimate.ranges.contains_key("high-density range of errors"));
        assert!(!estimate.ranges.contains_key("tolerance-extended range"));
        assert_eq!(estimate.extracted.items, vec![1.0, 1.2, 1.4]);
    }

    #[test]
    fn test_cluster_strategy() {
        let errors = vec![-9.0, 1.0, 1.3, 1.6, 12.0];
        let estimate = estimate_bias(
            &errors,
            RangeExtractionStrategy::ToleranceCluster { tolerance: 0.5 },
            false,
        );

        assert!(estimate.ranges.contains_key("biggest range by tolerance"));
        assert_relative_eq!(estimate.bias, 1.3, epsilon = 1e-12);
    }
}
