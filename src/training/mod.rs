//! Model training module
//!
//! Provides the regression candidates and the selection loop:
//! - Linear models (OLS, Ridge)
//! - Histogram gradient boosting over regression trees
//! - Scaler + regressor pipelines and their hyperparameter grids
//! - Grid search with time-series cross-validation
//! - Hold-out based model selection per exercise

mod models;
pub mod linear_models;
pub mod decision_tree;
pub mod gradient_boosting;
pub mod pipeline;
pub mod search;
pub mod selection;

pub use models::{rmse, Model};
pub use linear_models::{LinearRegression, RidgeRegression};
pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{BinMapper, HistGradientBoostingConfig, HistGradientBoostingRegressor};
pub use pipeline::{Algorithm, HyperParams, Pipeline, Regressor};
pub use search::{CandidateScore, GridSearch, SearchResult};
pub use selection::{
    evaluate_candidate, fold_count, holdout_split, select_model, should_grid_search, train_all,
    CandidateOutcome, ExerciseResult,
};
