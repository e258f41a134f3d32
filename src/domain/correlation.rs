//! Pairwise correlation of strategy return series.

use serde::{Deserialize, Serialize};

use super::backtest::StrategyResult;
use super::stats::mean;

const MIN_VARIANCE: f64 = 1e-12;

/// Pearson correlation over the first `min(a.len(), b.len())` samples.
///
/// Returns 0.0 with fewer than two overlapping samples or when either side
/// has no variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a <= MIN_VARIANCE || var_b <= MIN_VARIANCE {
        return 0.0;
    }
    let r = cov / (var_a.sqrt() * var_b.sqrt());
    if r.is_finite() { r.clamp(-1.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    pub a: String,
    pub b: String,
    pub correlation: f64,
}

/// Square, symmetric matrix with a unit diagonal, indexed in label order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn compute(inputs: &[(&str, &[f64])]) -> Self {
        let n = inputs.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson(inputs[i].1, inputs[j].1);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        CorrelationMatrix {
            labels: inputs.iter().map(|(name, _)| name.to_string()).collect(),
            values,
        }
    }

    /// Correlate the per-period equity returns of each strategy.
    pub fn from_results(results: &[StrategyResult]) -> Self {
        let inputs: Vec<(&str, &[f64])> = results
            .iter()
            .map(|r| (r.strategy.as_str(), r.period_returns.as_slice()))
            .collect();
        CorrelationMatrix::compute(&inputs)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[i][j])
    }

    /// Pairs with |correlation| strictly below `threshold`, least correlated
    /// first.
    pub fn low_correlation_pairs(&self, threshold: f64) -> Vec<CorrelationPair> {
        let mut pairs = Vec::new();
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                let c = self.values[i][j];
                if c.abs() < threshold {
                    pairs.push(CorrelationPair {
                        a: self.labels[i].clone(),
                        b: self.labels[j].clone(),
                        correlation: c,
                    });
                }
            }
        }
        pairs.sort_by(|x, y| x.correlation.abs().total_cmp(&y.correlation.abs()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_and_inverse_correlation() {
        let a = [0.01, 0.02, -0.01, 0.03];
        let b = [0.02, 0.04, -0.02, 0.06];
        let c = [-0.01, -0.02, 0.01, -0.03];
        assert_relative_eq!(pearson(&a, &b), 1.0, epsilon = 1e-12);
        assert_relative_eq!(pearson(&a, &c), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs_give_zero() {
        assert_eq!(pearson(&[], &[]), 0.0);
        assert_eq!(pearson(&[0.1], &[0.2]), 0.0);
        assert_eq!(pearson(&[0.0; 10], &[0.1, 0.2, 0.3]), 0.0);
    }

    #[test]
    fn uses_shorter_overlap() {
        let a = [1.0, 2.0, 3.0, 100.0, -50.0];
        let b = [2.0, 4.0, 6.0];
        assert_relative_eq!(pearson(&a, &b), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let a = [0.01, -0.02, 0.03, 0.0];
        let b = [0.02, 0.01, -0.01, 0.01];
        let c = [0.0; 4];
        let m = CorrelationMatrix::compute(&[("a", &a), ("b", &b), ("c", &c)]);
        for i in 0..3 {
            assert_eq!(m.values[i][i], 1.0);
            for j in 0..3 {
                assert_eq!(m.values[i][j], m.values[j][i]);
                assert!((-1.0..=1.0).contains(&m.values[i][j]));
            }
        }
        assert_eq!(m.get("a", "c"), Some(0.0));
        assert_eq!(m.get("a", "zzz"), None);
    }

    #[test]
    fn low_correlation_pairs_sorted_by_magnitude() {
        let m = CorrelationMatrix {
            labels: vec!["a".into(), "b".into(), "c".into()],
            values: vec![
                vec![1.0, 0.9, -0.1],
                vec![0.9, 1.0, 0.2],
                vec![-0.1, 0.2, 1.0],
            ],
        };
        let pairs = m.low_correlation_pairs(0.3);
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].a.as_str(), pairs[0].b.as_str()), ("a", "c"));
        assert_eq!((pairs[1].a.as_str(), pairs[1].b.as_str()), ("b", "c"));
    }

    #[test]
    fn uncorrelated_and_perfect_pair() {
        // +1 with each other, 0 against a constant third
        let a = [0.1, 0.2, 0.3, 0.4];
        let b = [0.2, 0.4, 0.6, 0.8];
        let c = [0.5; 4];
        let m = CorrelationMatrix::compute(&[("a", &a), ("b", &b), ("c", &c)]);
        assert_relative_eq!(m.values[0][1], 1.0, epsilon = 1e-12);
        let pairs = m.low_correlation_pairs(0.3);
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.a.as_str(), p.b.as_str()))
            .collect();
        assert_eq!(names, vec![("a", "c"), ("b", "c")]);
    }

    #[test]
    fn empty_matrix() {
        let m = CorrelationMatrix::compute(&[]);
        assert!(m.is_empty());
        assert!(m.low_correlation_pairs(1.0).is_empty());
    }
}
