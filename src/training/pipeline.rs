//! Candidate pipelines: a standard scaler followed by one regressor

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::gradient_boosting::{HistGradientBoostingConfig, HistGradientBoostingRegressor};
use super::linear_models::{LinearRegression, RidgeRegression};
use super::models::Model;
use crate::error::Result;
use crate::preprocessing::StandardScaler;

/// Candidate algorithm family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    LinReg,
    Ridge,
    Hgb,
}

impl Algorithm {
    /// Candidates in evaluation order. Ties keep the earlier one.
    pub const ALL: [Algorithm; 3] = [Algorithm::LinReg, Algorithm::Ridge, Algorithm::Hgb];

    /// Short tag used in artifact names and the summary
    pub fn tag(&self) -> &'static str {
        match self {
            Algorithm::LinReg => "linreg",
            Algorithm::Ridge => "ridge",
            Algorithm::Hgb => "hgb",
        }
    }

    /// Hyperparameters used when no search is run
    pub fn default_params(&self) -> HyperParams {
        match self {
            Algorithm::LinReg => HyperParams::Linear,
            Algorithm::Ridge => HyperParams::Ridge { alpha: 1.0 },
            Algorithm::Hgb => {
                let defaults = HistGradientBoostingConfig::default();
                HyperParams::Boosting {
                    max_iter: defaults.max_iter,
                    learning_rate: defaults.learning_rate,
                    max_depth: defaults.max_depth,
                }
            }
        }
    }

    /// Search grid, expanded into combinations. Empty when there is nothing to tune.
    pub fn param_grid(&self) -> Vec<HyperParams> {
        match self {
            Algorithm::LinReg => Vec::new(),
            Algorithm::Ridge => [0.01, 0.1, 1.0, 10.0]
                .iter()
                .map(|&alpha| HyperParams::Ridge { alpha })
                .collect(),
            Algorithm::Hgb => {
                let mut grid = Vec::with_capacity(8);
                // Keys in name order, last key varying fastest
                for learning_rate in [0.1, 0.05] {
                    for max_depth in [3, 5] {
                        for max_iter in [50, 100] {
                            grid.push(HyperParams::Boosting {
                                max_iter,
                                learning_rate,
                                max_depth: Some(max_depth),
                            });
                        }
                    }
                }
                grid
            }
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Hyperparameters of one candidate configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HyperParams {
    Linear,
    Ridge {
        alpha: f64,
    },
    Boosting {
        max_iter: usize,
        learning_rate: f64,
        max_depth: Option<usize>,
    },
}

impl HyperParams {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            HyperParams::Linear => Algorithm::LinReg,
            HyperParams::Ridge { .. } => Algorithm::Ridge,
            HyperParams::Boosting { .. } => Algorithm::Hgb,
        }
    }

    /// Key/value pairs for artifact metadata
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        match self {
            HyperParams::Linear => Vec::new(),
            HyperParams::Ridge { alpha } => vec![("alpha".to_string(), alpha.to_string())],
            HyperParams::Boosting { max_iter, learning_rate, max_depth } => vec![
                ("max_iter".to_string(), max_iter.to_string()),
                ("learning_rate".to_string(), learning_rate.to_string()),
                (
                    "max_depth".to_string(),
                    max_depth.map_or_else(|| "None".to_string(), |d| d.to_string()),
                ),
            ],
        }
    }
}

/// Fitted or unfitted regressor of any candidate family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Regressor {
    Linear(LinearRegression),
    Ridge(RidgeRegression),
    Boosting(HistGradientBoostingRegressor),
}

impl Regressor {
    pub fn from_params(params: &HyperParams) -> Self {
        match *params {
            HyperParams::Linear => Regressor::Linear(LinearRegression::new()),
            HyperParams::Ridge { alpha } => Regressor::Ridge(RidgeRegression::new(alpha)),
            HyperParams::Boosting { max_iter, learning_rate, max_depth } => {
                Regressor::Boosting(HistGradientBoostingRegressor::new(HistGradientBoostingConfig {
                    max_iter,
                    learning_rate,
                    max_depth,
                    ..Default::default()
                }))
            }
        }
    }

    fn as_model(&self) -> &dyn Model {
        match self {
            Regressor::Linear(m) => m,
            Regressor::Ridge(m) => m,
            Regressor::Boosting(m) => m,
        }
    }

    fn as_model_mut(&mut self) -> &mut dyn Model {
        match self {
            Regressor::Linear(m) => m,
            Regressor::Ridge(m) => m,
            Regressor::Boosting(m) => m,
        }
    }
}

impl Model for Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_model_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_model().predict(x)
    }
}

/// Standardize, then regress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    params: HyperParams,
    scaler: StandardScaler,
    regressor: Regressor,
}

impl Pipeline {
    pub fn new(params: HyperParams) -> Self {
        Self {
            params,
            scaler: StandardScaler::new(),
            regressor: Regressor::from_params(&params),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.params.algorithm()
    }

    pub fn params(&self) -> &HyperParams {
        &self.params
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn regressor(&self) -> &Regressor {
        &self.regressor
    }
}

impl Model for Pipeline {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let scaled = self.scaler.fit_transform(x)?;
        self.regressor.fit(&scaled, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scaled = self.scaler.transform(x)?;
        self.regressor.predict(&scaled)
    }
}
