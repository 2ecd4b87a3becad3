//! Small reference learners.
//!
//! They are deliberately simple: enough to drive the evaluator end to end and
//! to show how the [`Predictor`] contract is meant to be implemented.

use std::collections::BTreeMap;
use std::mem;

use crate::common::error::{EvalError, EvalResult};
use crate::data::domain::{ClassKey, Features, Label};

use super::domain::{argmax, ModelKind, Predictor, Probas};

/// Predicts class frequencies observed so far, ignoring features.
#[derive(Clone, Debug)]
pub struct PriorClassifier {
    kind: ModelKind,
    counts: BTreeMap<ClassKey, u64>,
    total: u64,
}

impl PriorClassifier {
    /// Two-class variant, expects boolean labels.
    pub fn binary() -> Self {
        Self {
            kind: ModelKind::BinaryClassifier,
            counts: BTreeMap::new(),
            total: 0,
        }
    }

    pub fn multiclass() -> Self {
        Self {
            kind: ModelKind::MultiClassifier,
            ..Self::binary()
        }
    }

    pub fn n_seen(&self) -> u64 {
        self.total
    }
}

impl Predictor for PriorClassifier {
    fn name(&self) -> String {
        "PriorClassifier".to_string()
    }

    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn predict_one(&self, x: &Features) -> EvalResult<Option<Label>> {
        let probas = self.predict_proba_one(x)?;
        Ok(argmax(&probas).cloned().map(Label::from))
    }

    fn predict_proba_one(&self, _x: &Features) -> EvalResult<Probas> {
        if self.total == 0 {
            return Ok(Probas::new());
        }
        let total = self.total as f64;
        Ok(self
            .counts
            .iter()
            .map(|(k, &n)| (k.clone(), n as f64 / total))
            .collect())
    }

    fn fit_one(&mut self, _x: &Features, y: &Label) -> EvalResult<()> {
        let key = match (self.kind, y) {
            (ModelKind::BinaryClassifier, Label::Bool(_)) | (ModelKind::MultiClassifier, _) => {
                y.class_key()
            }
            _ => None,
        }
        .ok_or_else(|| EvalError::invalid(format!("{} cannot learn label {y}", self.kind)))?;
        *self.counts.entry(key).or_insert(0) += 1;
        self.total += 1;
        Ok(())
    }

    fn memory_usage(&self) -> Option<usize> {
        let entries: usize = self
            .counts
            .keys()
            .map(|k| {
                let heap = match k {
                    ClassKey::Class(c) => c.capacity(),
                    ClassKey::Bool(_) => 0,
                };
                mem::size_of::<ClassKey>() + mem::size_of::<u64>() + heap
            })
            .sum();
        Some(mem::size_of::<Self>() + entries)
    }
}

/// Predicts the running mean of the targets seen so far.
#[derive(Clone, Debug, Default)]
pub struct MeanRegressor {
    n: u64,
    mean: f64,
}

impl MeanRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Predictor for MeanRegressor {
    fn name(&self) -> String {
        "MeanRegressor".to_string()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Regressor
    }

    fn predict_one(&self, _x: &Features) -> EvalResult<Option<Label>> {
        Ok((self.n > 0).then_some(Label::Real(self.mean)))
    }

    fn fit_one(&mut self, _x: &Features, y: &Label) -> EvalResult<()> {
        let y = real_target(y)?;
        self.n += 1;
        self.mean += (y - self.mean) / self.n as f64;
        Ok(())
    }

    fn memory_usage(&self) -> Option<usize> {
        Some(mem::size_of::<Self>())
    }
}

/// Configuration for [`LinearRegression`].
#[derive(Clone, Debug)]
pub struct SgdConfig {
    pub learning_rate: f64,
    pub l2: f64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            l2: 0.0,
        }
    }
}

/// Least squares over sparse features, one SGD step per observation.
#[derive(Clone, Debug, Default)]
pub struct LinearRegression {
    weights: BTreeMap<String, f64>,
    intercept: f64,
    config: SgdConfig,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SgdConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn raw_predict(&self, x: &Features) -> f64 {
        self.intercept
            + x.iter()
                .map(|(k, v)| self.weights.get(k).copied().unwrap_or(0.0) * v)
                .sum::<f64>()
    }
}

impl Predictor for LinearRegression {
    fn name(&self) -> String {
        "LinearRegression".to_string()
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Regressor
    }

    fn predict_one(&self, x: &Features) -> EvalResult<Option<Label>> {
        Ok(Some(Label::Real(self.raw_predict(x))))
    }

    fn fit_one(&mut self, x: &Features, y: &Label) -> EvalResult<()> {
        let y = real_target(y)?;
        let err = self.raw_predict(x) - y;
        let lr = self.config.learning_rate;
        let l2 = self.config.l2;
        let updated: Vec<(&String, f64)> = x
            .iter()
            .map(|(k, v)| {
                let w = self.weights.get(k).copied().unwrap_or(0.0);
                (k, w - lr * (err * v + l2 * w))
            })
            .collect();
        let intercept = self.intercept - lr * err;

        // A diverged step is discarded.
        if !intercept.is_finite() || updated.iter().any(|(_, w)| !w.is_finite()) {
            return Err(EvalError::model(
                "LinearRegression diverged, lower the learning rate",
            ));
        }
        for (k, w) in updated {
            self.weights.insert(k.clone(), w);
        }
        self.intercept = intercept;
        Ok(())
    }

    fn memory_usage(&self) -> Option<usize> {
        let entries: usize = self
            .weights
            .keys()
            .map(|k| mem::size_of::<String>() + k.capacity() + mem::size_of::<f64>())
            .sum();
        Some(mem::size_of::<Self>() + entries)
    }
}

fn real_target(y: &Label) -> EvalResult<f64> {
    match y.as_real() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(EvalError::invalid(format!(
            "regressor needs a finite real target, got {y}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::EvalCode;

    fn x(pairs: &[(&str, f64)]) -> Features {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn prior_is_empty_on_cold_start() {
        let model = PriorClassifier::binary();
        assert!(model.predict_proba_one(&x(&[])).unwrap().is_empty());
        assert_eq!(model.predict_one(&x(&[])).unwrap(), None);
    }

    #[test]
    fn prior_tracks_frequencies() {
        let mut model = PriorClassifier::binary();
        for y in [true, true, false, true] {
            model.fit_one(&x(&[]), &Label::Bool(y)).unwrap();
        }
        let p = model.predict_proba_one(&x(&[])).unwrap();
        assert!((p[&ClassKey::Bool(true)] - 0.75).abs() < 1e-12);
        assert_eq!(model.predict_one(&x(&[])).unwrap(), Some(Label::Bool(true)));
        assert_eq!(model.n_seen(), 4);
    }

    #[test]
    fn binary_prior_rejects_non_bool() {
        let mut model = PriorClassifier::binary();
        assert!(model.fit_one(&x(&[]), &Label::from("cat")).is_err());
        assert!(model.fit_one(&x(&[]), &Label::Real(1.0)).is_err());

        let mut multi = PriorClassifier::multiclass();
        assert!(multi.fit_one(&x(&[]), &Label::from("cat")).is_ok());
        assert!(multi.fit_one(&x(&[]), &Label::Real(1.0)).is_err());
    }

    #[test]
    fn mean_regressor_running_mean() {
        let mut model = MeanRegressor::new();
        assert_eq!(model.predict_one(&x(&[])).unwrap(), None);
        for y in [1.0, 2.0, 3.0] {
            model.fit_one(&x(&[]), &Label::Real(y)).unwrap();
        }
        assert_eq!(model.predict_one(&x(&[])).unwrap(), Some(Label::Real(2.0)));
    }

    #[test]
    fn linear_regression_learns_a_line() {
        let mut model = LinearRegression::with_config(SgdConfig {
            learning_rate: 0.05,
            l2: 0.0,
        });
        for _ in 0..200 {
            for i in 0..10 {
                let v = i as f64 / 10.0;
                model.fit_one(&x(&[("v", v)]), &Label::Real(3.0 * v + 1.0)).unwrap();
            }
        }
        assert!((model.weights()["v"] - 3.0).abs() < 0.1);
        assert!((model.intercept() - 1.0).abs() < 0.1);
    }

    #[test]
    fn linear_regression_reports_divergence() {
        let mut model = LinearRegression::with_config(SgdConfig {
            learning_rate: 1e6,
            l2: 0.0,
        });
        let mut last_good = (model.weights().clone(), model.intercept());
        let mut result = Ok(());
        for _ in 0..100 {
            result = model.fit_one(&x(&[("v", 1e3)]), &Label::Real(1.0));
            if result.is_err() {
                break;
            }
            last_good = (model.weights().clone(), model.intercept());
        }
        assert_eq!(result.unwrap_err().code(), EvalCode::Model);
        // The failed step left the last finite state in place.
        assert_eq!(model.weights(), &last_good.0);
        assert_eq!(model.intercept().to_bits(), last_good.1.to_bits());
        assert!(model.weights().values().all(|w| w.is_finite()));
    }

    #[test]
    fn memory_grows_with_state() {
        let mut model = LinearRegression::new();
        let before = model.memory_usage().unwrap();
        model.fit_one(&x(&[("a", 1.0), ("b", 2.0)]), &Label::Real(1.0)).unwrap();
        assert!(model.memory_usage().unwrap() > before);
    }
}
