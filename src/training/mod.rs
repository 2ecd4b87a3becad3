//! Training domain: the learner contract and a few reference learners.

pub mod domain;
pub mod models;

pub use domain::{ModelKind, Prediction, Predictor, Probas};
pub use models::{LinearRegression, MeanRegressor, PriorClassifier, SgdConfig};
