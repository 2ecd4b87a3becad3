//! Streaming metrics.

use std::fmt;

use crate::common::error::{EvalError, EvalResult};
use crate::data::domain::{ClassKey, Label};
use crate::training::domain::{ModelKind, Prediction};

use super::domain::Metric;

/// Incremental arithmetic mean.
#[derive(Copy, Clone, Debug, Default)]
struct Mean {
    n: u64,
    value: f64,
}

impl Mean {
    fn push(&mut self, x: f64) {
        self.n += 1;
        self.value += (x - self.value) / self.n as f64;
    }
}

fn class_of(y: &Label, role: &str) -> EvalResult<ClassKey> {
    y.class_key()
        .ok_or_else(|| EvalError::invalid(format!("{role} {y} is not a class label")))
}

fn real_of(y: &Label, role: &str) -> EvalResult<f64> {
    y.as_real()
        .ok_or_else(|| EvalError::invalid(format!("{role} {y} is not a real value")))
}

fn point_of<'a>(y_pred: &'a Prediction, metric: &str) -> EvalResult<&'a Label> {
    match y_pred {
        Prediction::Label(label) => Ok(label),
        other => Err(EvalError::invalid(format!(
            "{metric} expects a point prediction, got {other:?}"
        ))),
    }
}

/// Share of correct class predictions.
#[derive(Clone, Debug, Default)]
pub struct Accuracy {
    correct: u64,
    total: u64,
}

impl Accuracy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metric for Accuracy {
    fn name(&self) -> &'static str {
        "Accuracy"
    }

    fn works_with(&self, kind: ModelKind) -> bool {
        kind.is_classifier()
    }

    fn requires_labels(&self) -> bool {
        true
    }

    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()> {
        let truth = class_of(y_true, "true label")?;
        let guess = match y_pred.top_label() {
            Some(label) => Some(class_of(&label, "predicted label")?),
            None => None,
        };
        self.total += 1;
        if guess.as_ref() == Some(&truth) {
            self.correct += 1;
        }
        Ok(())
    }

    fn get(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }
}

impl fmt::Display for Accuracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}%", self.name(), self.get() * 100.0)
    }
}

/// Binary cross-entropy of the probability assigned to `true`.
#[derive(Clone, Debug, Default)]
pub struct LogLoss {
    mean: Mean,
}

impl LogLoss {
    const EPS: f64 = 1e-15;

    pub fn new() -> Self {
        Self::default()
    }

    fn p_true(y_pred: &Prediction) -> EvalResult<f64> {
        match y_pred {
            Prediction::Proba(p) => {
                let t = p.get(&ClassKey::Bool(true)).copied();
                let f = p.get(&ClassKey::Bool(false)).copied();
                t.or(f.map(|f| 1.0 - f)).ok_or_else(|| {
                    EvalError::invalid(format!(
                        "LogLoss needs a probability keyed by true or false, got {p:?}"
                    ))
                })
            }
            Prediction::Label(Label::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(EvalError::invalid(format!(
                "LogLoss expects boolean probabilities, got {other:?}"
            ))),
        }
    }
}

impl Metric for LogLoss {
    fn name(&self) -> &'static str {
        "LogLoss"
    }

    fn works_with(&self, kind: ModelKind) -> bool {
        kind == ModelKind::BinaryClassifier
    }

    fn requires_labels(&self) -> bool {
        false
    }

    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()> {
        let y = match y_true {
            Label::Bool(b) => *b,
            other => {
                return Err(EvalError::invalid(format!(
                    "LogLoss expects a boolean true label, got {other}"
                )))
            }
        };
        let p = Self::p_true(y_pred)?.clamp(Self::EPS, 1.0 - Self::EPS);
        let loss = if y { -p.ln() } else { -(1.0 - p).ln() };
        self.mean.push(loss);
        Ok(())
    }

    fn get(&self) -> f64 {
        self.mean.value
    }
}

impl fmt::Display for LogLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name(), self.get())
    }
}

/// Mean absolute error.
#[derive(Clone, Debug, Default)]
pub struct Mae {
    mean: Mean,
}

impl Mae {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metric for Mae {
    fn name(&self) -> &'static str {
        "MAE"
    }

    fn works_with(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Regressor
    }

    fn requires_labels(&self) -> bool {
        true
    }

    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()> {
        let y = real_of(y_true, "true value")?;
        let p = real_of(point_of(y_pred, self.name())?, "predicted value")?;
        self.mean.push((y - p).abs());
        Ok(())
    }

    fn get(&self) -> f64 {
        self.mean.value
    }
}

impl fmt::Display for Mae {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name(), self.get())
    }
}

/// Root mean squared error.
#[derive(Clone, Debug, Default)]
pub struct Rmse {
    mean_sq: Mean,
}

impl Rmse {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metric for Rmse {
    fn name(&self) -> &'static str {
        "RMSE"
    }

    fn works_with(&self, kind: ModelKind) -> bool {
        kind == ModelKind::Regressor
    }

    fn requires_labels(&self) -> bool {
        true
    }

    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()> {
        let y = real_of(y_true, "true value")?;
        let p = real_of(point_of(y_pred, self.name())?, "predicted value")?;
        self.mean_sq.push((y - p).powi(2));
        Ok(())
    }

    fn get(&self) -> f64 {
        self.mean_sq.value.sqrt()
    }
}

impl fmt::Display for Rmse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.6}", self.name(), self.get())
    }
}
