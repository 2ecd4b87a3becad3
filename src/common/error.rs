//! Error handling primitives shared across the crate.
//!
//! Every error maps onto a stable numeric code so hosts can branch on the
//! failure class without parsing messages.

use thiserror::Error;

/// Stable error codes, one per failure class.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EvalCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Metric and model disagree on the kind of prediction.
    Config = 1,
    /// The event source broke its pairing contract.
    Invariant = 2,
    /// Input failed validation (missing field, wrong label shape, ...).
    InvalidInput = 3,
    /// A model refused to predict or learn.
    Model = 4,
    /// Writing diagnostics failed.
    Io = 5,
}

/// Canonical error type for the crate.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Raised before any event is consumed.
    #[error("{metric} metric is not compatible with {model}")]
    Config { metric: String, model: String },

    /// An answer without a question, or a question asked twice.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> EvalCode {
        match self {
            EvalError::Config { .. } => EvalCode::Config,
            EvalError::Invariant(_) => EvalCode::Invariant,
            EvalError::InvalidInput(_) => EvalCode::InvalidInput,
            EvalError::Model(_) => EvalCode::Model,
            EvalError::Io(_) => EvalCode::Io,
        }
    }

    /// Incompatibility helper.
    pub fn config(metric: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Config {
            metric: metric.into(),
            model: model.into(),
        }
    }

    /// Invariant helper.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Validation helper.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Model failure helper.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}
