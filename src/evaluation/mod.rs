//! Evaluation domain: streaming metrics and the progressive evaluator.

pub mod domain;
pub mod metrics;
pub mod service;

pub use domain::{EvalSettings, EvalSummary, Metric, PredictFn};
pub use metrics::{Accuracy, LogLoss, Mae, Rmse};
pub use service::{evaluate, evaluate_detailed, progressive_val_score};
