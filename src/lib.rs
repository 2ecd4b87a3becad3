//! `progval`: progressive and delayed validation of online learners.
//!
//! A labelled stream is replayed as questions and answers. The model predicts
//! each question, the prediction is scored when the answer is revealed, and
//! only then does the model learn from it.
//!
//! ```
//! use progval::data::{Delay, Features, Moment, Observation};
//! use progval::evaluation::{progressive_val_score, EvalSettings, Mae};
//! use progval::training::MeanRegressor;
//!
//! let stream = (0..10).map(|i| Observation::new(Features::new(), i as f64));
//! let mut model = MeanRegressor::new();
//! let mae = progressive_val_score(
//!     stream,
//!     &mut model,
//!     Mae::new(),
//!     Moment::Arrival,
//!     Delay::Fixed(2.0),
//!     &EvalSettings::silent(),
//! )
//! .unwrap();
//! assert!(mae.to_string().starts_with("MAE: "));
//! ```
pub mod common;
pub mod data;
pub mod evaluation;
pub mod training;

pub use common::{EvalCode, EvalError, EvalResult};
