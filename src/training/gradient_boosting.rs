//! Histogram gradient boosting implementation
//!
//! Inputs are discretized into at most `max_bins` bins per feature, then
//! least-squares regression trees are boosted on the residuals of the
//! running prediction.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::decision_tree::DecisionTree;
use super::models::Model;
use crate::error::{ProgressError, Result};

/// Histogram gradient boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistGradientBoostingConfig {
    /// Number of boosting iterations (trees)
    pub max_iter: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Maximum number of bins per feature
    pub max_bins: usize,
}

impl Default for HistGradientBoostingConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            learning_rate: 0.1,
            max_depth: None,
            min_samples_leaf: 20,
            max_bins: 255,
        }
    }
}

/// Per-feature bin edges learned from the training data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BinMapper {
    thresholds: Vec<Vec<f64>>,
}

impl BinMapper {
    /// Learn bin edges: midpoints between distinct values when there are few
    /// of them, quantile midpoints otherwise.
    pub fn fit(x: &Array2<f64>, max_bins: usize) -> Self {
        let max_bins = max_bins.max(2);
        let thresholds = x
            .axis_iter(Axis(1))
            .map(|column| {
                let mut values: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                values.dedup();

                if values.len() <= max_bins {
                    values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
                } else {
                    let mut edges: Vec<f64> = (1..max_bins)
                        .map(|k| {
                            let pos = k as f64 * (values.len() - 1) as f64 / max_bins as f64;
                            let lo = pos.floor() as usize;
                            (values[lo] + values[(lo + 1).min(values.len() - 1)]) / 2.0
                        })
                        .collect();
                    edges.dedup();
                    edges
                }
            })
            .collect();

        Self { thresholds }
    }

    /// Number of bins used for a feature
    pub fn n_bins(&self, feature: usize) -> usize {
        self.thresholds.get(feature).map_or(0, |t| t.len() + 1)
    }

    /// Map raw values to bin indices
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.thresholds.len() {
            return Err(ProgressError::ShapeError {
                expected: format!("{} features", self.thresholds.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut binned = Array2::<f64>::zeros(x.raw_dim());
        for (j, edges) in self.thresholds.iter().enumerate() {
            for i in 0..x.nrows() {
                let v = x[[i, j]];
                binned[[i, j]] = edges.partition_point(|t| *t < v) as f64;
            }
        }
        Ok(binned)
    }
}

/// Histogram gradient boosting regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistGradientBoostingRegressor {
    config: HistGradientBoostingConfig,
    bin_mapper: Option<BinMapper>,
    trees: Vec<DecisionTree>,
    baseline: f64,
}

impl Default for HistGradientBoostingRegressor {
    fn default() -> Self {
        Self::new(HistGradientBoostingConfig::default())
    }
}

impl HistGradientBoostingRegressor {
    pub fn new(config: HistGradientBoostingConfig) -> Self {
        Self {
            config,
            bin_mapper: None,
            trees: Vec::new(),
            baseline: 0.0,
        }
    }

    /// Fit the gradient boosting model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(ProgressError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ProgressError::ValidationError(
                "Cannot fit gradient boosting on zero samples".to_string(),
            ));
        }

        let bin_mapper = BinMapper::fit(x, self.config.max_bins);
        let binned = bin_mapper.transform(x)?;

        // Squared-error loss starts from the mean
        self.baseline = y.mean().unwrap_or(0.0);
        self.trees.clear();
        let mut predictions = Array1::from_elem(n_samples, self.baseline);

        for _ in 0..self.config.max_iter {
            let residuals: Array1<f64> = y - &predictions;

            let mut tree = DecisionTree::new_regressor()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);

            tree.fit(&binned, &residuals)?;

            let update = tree.predict(&binned)?;
            predictions.scaled_add(self.config.learning_rate, &update);
            self.trees.push(tree);
        }

        self.bin_mapper = Some(bin_mapper);
        Ok(())
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let bin_mapper = self.bin_mapper.as_ref().ok_or(ProgressError::ModelNotFitted)?;
        let binned = bin_mapper.transform(x)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.baseline);
        for tree in &self.trees {
            let update = tree.predict(&binned)?;
            predictions.scaled_add(self.config.learning_rate, &update);
        }
        Ok(predictions)
    }
}

impl Model for HistGradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        HistGradientBoostingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        HistGradientBoostingRegressor::predict(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2),
            (0..200).map(|i| i as f64 * 0.1).collect()
        ).unwrap();

        let y: Array1<f64> = x.rows().into_iter()
            .map(|row| row[0] * 2.0 + row[1] * 0.5 + 1.0)
            .collect();

        (x, y)
    }

    #[test]
    fn test_hist_gradient_boosting_regressor() {
        let (x, y) = create_regression_data();
        let config = HistGradientBoostingConfig {
            max_iter: 30,
            max_depth: Some(3),
            min_samples_leaf: 5,
            ..Default::default()
        };

        let mut model = HistGradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.len(), 100);

        let mse: f64 = y.iter()
            .zip(predictions.iter())
            .map(|(yi, pi)| (yi - pi).powi(2))
            .sum::<f64>() / y.len() as f64;

        // MSE should be far below the variance of y
        let y_var = y.var(0.0);
        assert!(mse < 0.1 * y_var, "MSE ({}) should be well under variance ({})", mse, y_var);
    }

    #[test]
    fn test_small_sample_predicts_mean() {
        // Fewer rows than min_samples_leaf: every tree is a single leaf of zero residual
        let x = Array2::from_shape_vec((6, 1), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let y = Array1::from_vec(vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0]);

        let mut model = HistGradientBoostingRegressor::default();
        model.fit(&x, &y).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert!(predictions.iter().all(|p| (p - 15.0).abs() < 1e-9));
    }

    #[test]
    fn test_refit_is_deterministic() {
        let (x, y) = create_regression_data();
        let config = HistGradientBoostingConfig {
            max_iter: 10,
            min_samples_leaf: 3,
            ..Default::default()
        };

        let mut model = HistGradientBoostingRegressor::new(config);
        model.fit(&x, &y).unwrap();
        let first = model.predict(&x).unwrap();
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), first);
        assert_eq!(model.trees.len(), 10);
    }

    #[test]
    fn test_bin_mapper_caps_bins() {
        let (x, _) = create_regression_data();
        let mapper = BinMapper::fit(&x, 16);
        assert!(mapper.n_bins(0) <= 16);

        let binned = mapper.transform(&x).unwrap();
        assert!(binned.iter().all(|b| *b >= 0.0 && *b < 16.0));
        // Binning preserves order
        let col: Vec<f64> = binned.column(0).to_vec();
        assert!(col.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_predict_before_fit() {
        let model = HistGradientBoostingRegressor::default();
        let x = Array2::<f64>::zeros((2, 1));
        assert!(matches!(model.predict(&x), Err(ProgressError::ModelNotFitted)));
    }
}
