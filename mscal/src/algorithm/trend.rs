use itertools::Itertools;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Selects how the error trend over m/z is modeled instead of a single
/// global bias value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrendStrategy {
    /// Mean error of the nearest neighbors by m/z distance.
    Knn { fraction: f64 },
    /// Ordinary least squares over a polynomial feature basis, optionally
    /// augmented with exponential and logarithmic features.
    Ols {
        degree: usize,
        exponential: bool,
        logarithmic: bool,
    },
}

/// A fitted error-versus-m/z trend, queryable at arbitrary m/z.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TrendModel {
    Knn(KnnTrend),
    Ols(OlsTrend),
}

impl TrendModel {
    /// Fits the configured trend over `(mz, error)` pairs. Fitting is
    /// order-independent, the pairs need not be sorted.
    pub fn fit(strategy: TrendStrategy, points: &[(f64, f64)]) -> TrendModel {
        match strategy {
            TrendStrategy::Knn { fraction } => TrendModel::Knn(KnnTrend::fit(points, fraction)),
            TrendStrategy::Ols {
                degree,
                exponential,
                logarithmic,
            } => TrendModel::Ols(OlsTrend::fit(points, degree, exponential, logarithmic)),
        }
    }

    pub fn evaluate(&self, mz: f64) -> f64 {
        match self {
            TrendModel::Knn(trend) => trend.evaluate(mz),
            TrendModel::Ols(trend) => trend.evaluate(mz),
        }
    }
}

/// Local-neighborhood trend: the error at a query m/z is the arithmetic mean
/// over the `round(fraction * n)` points closest by absolute m/z distance,
/// at least one. An empty model evaluates to zero everywhere.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnnTrend {
    points: Vec<(f64, f64)>,
    fraction: f64,
}

impl KnnTrend {
    pub fn fit(points: &[(f64, f64)], fraction: f64) -> Self {
        let points = points
            .iter()
            .copied()
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .collect();
        KnnTrend { points, fraction }
    }

    pub fn evaluate(&self, mz: f64) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }

        let n = self.points.len();
        let k = ((self.fraction * n as f64).round() as usize).clamp(1, n);

        // expand around the insertion point, taking the closer side first
        let mut left = self.points.partition_point(|p| p.0 < mz);
        let mut right = left;
        let mut sum = 0.0;
        for _ in 0..k {
            let take_left = if left == 0 {
                false
            } else if right == n {
                true
            } else {
                mz - self.points[left - 1].0 <= self.points[right].0 - mz
            };
            if take_left {
                left -= 1;
                sum += self.points[left].1;
            } else {
                sum += self.points[right].1;
                right += 1;
            }
        }
        sum / k as f64
    }
}

/// Ordinary-least-squares trend over the feature vector
/// `[1, mz, mz^2, .., mz^degree, exp(mz)?, ln(mz)?]`.
///
/// A degenerate fit (fewer points than features, a singular system or
/// non-finite coefficients) falls back to the arithmetic mean of all errors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OlsTrend {
    degree: usize,
    exponential: bool,
    logarithmic: bool,
    coefficients: Option<Vec<f64>>,
    mean_error: f64,
}

impl OlsTrend {
    pub fn fit(points: &[(f64, f64)], degree: usize, exponential: bool, logarithmic: bool) -> Self {
        let mean_error = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|p| p.1).mean()
        };

        let feature_count = degree + 1 + usize::from(exponential) + usize::from(logarithmic);
        let coefficients = if points.len() >= feature_count {
            Self::solve(points, degree, exponential, logarithmic, feature_count)
        } else {
            None
        };

        OlsTrend {
            degree,
            exponential,
            logarithmic,
            coefficients,
            mean_error,
        }
    }

    fn features(mz: f64, degree: usize, exponential: bool, logarithmic: bool) -> Vec<f64> {
        let mut features = Vec::with_capacity(degree + 3);
        for power in 0..=degree {
            features.push(mz.powi(power as i32));
        }
        if exponential {
            features.push(mz.exp());
        }
        if logarithmic {
            features.push(mz.ln());
        }
        features
    }

    fn solve(
        points: &[(f64, f64)],
        degree: usize,
        exponential: bool,
        logarithmic: bool,
        feature_count: usize,
    ) -> Option<Vec<f64>> {
        let design = DMatrix::from_fn(points.len(), feature_count, |row, column| {
            Self::features(points[row].0, degree, exponential, logarithmic)[column]
        });
        if design.iter().any(|value| !value.is_finite()) {
            return None;
        }

        let targets = DVector::from_iterator(points.len(), points.iter().map(|p| p.1));
        let solution = design.svd(true, true).solve(&targets, 1e-12).ok()?;
        if solution.iter().any(|value| !value.is_finite()) {
            return None;
        }
        Some(solution.iter().copied().collect())
    }

    pub fn evaluate(&self, mz: f64) -> f64 {
        match &self.coefficients {
            Some(coefficients) => {
                let prediction: f64 =
                    Self::features(mz, self.degree, self.exponential, self.logarithmic)
                        .iter()
                        .zip(coefficients.iter())
                        .map(|(feature, coefficient)| feature * coefficient)
                        .sum();
                if prediction.is_finite() {
                    prediction
                } else {
                    self.mean_error
                }
            }
            None => self.mean_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_knn_mean_of_nearest_neighbors() {
        let points = vec![(100.0, 1.0), (200.0, 2.0), (300.0, 3.0), (400.0, 4.0)];
        let trend = KnnTrend::fit(&points, 0.5);

        // two nearest neighbors of 150 are 100 and 200
        assert_relative_eq!(trend.evaluate(150.0), 1.5, epsilon = 1e-12);
        // two nearest neighbors of 390 are 300 and 400
        assert_relative_eq!(trend.evaluate(390.0), 3.5, epsilon = 1e-12);
    }

    #[test]
    fn test_knn_uses_at_least_one_neighbor() {
        let points = vec![(100.0, 1.0), (200.0, 5.0)];
        let trend = KnnTrend::fit(&points, 0.1);
        assert_relative_eq!(trend.evaluate(110.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_knn_full_fraction_is_global_mean() {
        let points = vec![(100.0, 1.0), (200.0, 2.0), (300.0, 6.0)];
        let trend = KnnTrend::fit(&points, 1.0);
        assert_relative_eq!(trend.evaluate(5000.0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_knn_empty_evaluates_to_zero() {
        let trend = KnnTrend::fit(&[], 0.5);
        assert_eq!(trend.evaluate(500.0), 0.0);
    }

    #[test]
    fn test_ols_recovers_linear_trend() {
        let points: Vec<(f64, f64)> = (1..=10)
            .map(|i| {
                let mz = 100.0 * i as f64;
                (mz, 0.01 * mz + 1.0)
            })
            .collect();
        let trend = OlsTrend::fit(&points, 1, false, false);

        assert_relative_eq!(trend.evaluate(550.0), 6.5, epsilon = 1e-6);
        assert_relative_eq!(trend.evaluate(100.0), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ols_constant_fit() {
        let points = vec![(100.0, 2.5), (200.0, 2.5), (300.0, 2.5)];
        let trend = OlsTrend::fit(&points, 0, false, false);
        assert_relative_eq!(trend.evaluate(12345.0), 2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_ols_logarithmic_feature() {
        // error = 3 * ln(mz)
        let points: Vec<(f64, f64)> = (1..=8)
            .map(|i| {
                let mz = 50.0 * i as f64;
                (mz, 3.0 * mz.ln())
            })
            .collect();
        let trend = OlsTrend::fit(&points, 0, false, true);
        assert_relative_eq!(trend.evaluate(123.0), 3.0 * 123.0_f64.ln(), epsilon = 1e-6);
    }

    #[test]
    fn test_ols_degenerate_fit_falls_back_to_mean() {
        // two points cannot determine four coefficients
        let points = vec![(100.0, 1.0), (200.0, 3.0)];
        let trend = OlsTrend::fit(&points, 3, false, false);
        assert_relative_eq!(trend.evaluate(150.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ols_overflowing_feature_falls_back_to_mean() {
        // exp(mz) overflows for realistic m/z values
        let points = vec![(800.0, 1.0), (900.0, 2.0), (1000.0, 3.0)];
        let trend = OlsTrend::fit(&points, 0, true, false);
        assert_relative_eq!(trend.evaluate(850.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ols_empty_evaluates_to_zero() {
        let trend = OlsTrend::fit(&[], 2, true, true);
        assert_eq!(trend.evaluate(500.0), 0.0);
    }

    #[test]
    fn test_trend_model_dispatch() {
        let points = vec![(100.0, 2.0), (200.0, 2.0)];
        let knn = TrendModel::fit(TrendStrategy::Knn { fraction: 1.0 }, &points);
        let ols = TrendModel::fit(
            TrendStrategy::Ols {
                degree: 0,
                exponential: false,
                logarithmic: false,
            },
            &points,
        );
        assert_relative_eq!(knn.evaluate(150.0), 2.0, epsilon = 1e-9);
        assert_relative_eq!(ols.evaluate(150.0), 2.0, epsilon = 1e-9);
    }
}
