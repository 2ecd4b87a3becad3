//! Shared utilities that glue the different domains together.
pub mod config;
pub mod error;
pub mod fmt;
pub mod time;

pub use error::{EvalCode, EvalError, EvalResult};
