//! Data domain: observations, events and the question/answer simulator.

pub mod domain;
pub mod service;

pub use domain::{ClassKey, Event, Features, Label, Observation};
pub use service::{simulate_qa, Delay, Moment, QaStream};
