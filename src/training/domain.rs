//! Model-side contracts: capability classes, predictions and the learner trait.

use std::collections::BTreeMap;
use std::fmt;

use crate::common::error::EvalResult;
use crate::data::domain::{ClassKey, Features, Label};

/// Capability class of a model. Metrics declare which ones they accept.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ModelKind {
    BinaryClassifier,
    MultiClassifier,
    Regressor,
}

impl ModelKind {
    pub fn is_classifier(&self) -> bool {
        matches!(self, ModelKind::BinaryClassifier | ModelKind::MultiClassifier)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelKind::BinaryClassifier => "binary classifier",
            ModelKind::MultiClassifier => "multi-class classifier",
            ModelKind::Regressor => "regressor",
        })
    }
}

/// Class probabilities produced by a classifier.
pub type Probas = BTreeMap<ClassKey, f64>;

/// What a model answered when asked a question.
#[derive(Clone, Debug, PartialEq)]
pub enum Prediction {
    /// The model declined to predict (typically on cold start).
    Absent,
    Label(Label),
    Proba(Probas),
}

impl Prediction {
    /// Absent or empty predictions are never scored.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Prediction::Absent => true,
            Prediction::Proba(p) => p.is_empty(),
            Prediction::Label(_) => false,
        }
    }

    /// Most likely class for probabilistic predictions, the label itself otherwise.
    pub fn top_label(&self) -> Option<Label> {
        match self {
            Prediction::Absent => None,
            Prediction::Label(label) => Some(label.clone()),
            Prediction::Proba(p) => argmax(p).map(|k| k.clone().into()),
        }
    }
}

impl From<Option<Label>> for Prediction {
    fn from(value: Option<Label>) -> Self {
        value.map_or(Prediction::Absent, Prediction::Label)
    }
}

/// Highest-probability class; the first key in order wins ties.
pub fn argmax(p: &Probas) -> Option<&ClassKey> {
    p.iter()
        .fold(None, |best: Option<(&ClassKey, f64)>, (k, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((k, v)),
        })
        .map(|(k, _)| k)
}

/// Online learner evaluated one observation at a time.
pub trait Predictor {
    /// Human readable model name, used in error messages.
    fn name(&self) -> String;

    fn kind(&self) -> ModelKind;

    /// Point prediction. `None` means the model has nothing to say yet.
    fn predict_one(&self, x: &Features) -> EvalResult<Option<Label>>;

    /// Class probabilities. Non-classifiers keep the empty default.
    fn predict_proba_one(&self, _x: &Features) -> EvalResult<Probas> {
        Ok(Probas::new())
    }

    /// Learn from one revealed observation.
    fn fit_one(&mut self, x: &Features, y: &Label) -> EvalResult<()>;

    /// Self-reported footprint in bytes, when the model tracks it.
    fn memory_usage(&self) -> Option<usize> {
        None
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn kind(&self) -> ModelKind {
        (**self).kind()
    }

    fn predict_one(&self, x: &Features) -> EvalResult<Option<Label>> {
        (**self).predict_one(x)
    }

    fn predict_proba_one(&self, x: &Features) -> EvalResult<Probas> {
        (**self).predict_proba_one(x)
    }

    fn fit_one(&mut self, x: &Features, y: &Label) -> EvalResult<()> {
        (**self).fit_one(x, y)
    }

    fn memory_usage(&self) -> Option<usize> {
        (**self).memory_usage()
    }
}
