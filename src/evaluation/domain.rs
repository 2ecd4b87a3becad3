//! Domain primitives for progressive evaluation.

use std::fmt;

use crate::common::config::EvalCfg;
use crate::common::error::EvalResult;
use crate::data::domain::{Features, Label};
use crate::training::domain::{ModelKind, Prediction, Predictor};

/// Running score updated one observation at a time.
pub trait Metric: fmt::Display {
    fn name(&self) -> &'static str;

    /// Whether predictions of a model of this kind can be scored.
    fn works_with(&self, kind: ModelKind) -> bool;

    /// `true` when the metric needs point predictions rather than probabilities.
    fn requires_labels(&self) -> bool;

    /// Fold one `(y_true, y_pred)` pair into the score.
    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()>;

    /// Current value of the score.
    fn get(&self) -> f64;
}

impl<M: Metric + ?Sized> Metric for Box<M> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn works_with(&self, kind: ModelKind) -> bool {
        (**self).works_with(kind)
    }

    fn requires_labels(&self) -> bool {
        (**self).requires_labels()
    }

    fn update(&mut self, y_true: &Label, y_pred: &Prediction) -> EvalResult<()> {
        (**self).update(y_true, y_pred)
    }

    fn get(&self) -> f64 {
        (**self).get()
    }
}

/// Which prediction call the evaluator makes, fixed before the first event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PredictFn {
    Label,
    Proba,
}

impl PredictFn {
    /// Classifiers scored by a probabilistic metric get `Proba`, everything else `Label`.
    pub fn select(kind: ModelKind, requires_labels: bool) -> Self {
        if kind.is_classifier() && !requires_labels {
            PredictFn::Proba
        } else {
            PredictFn::Label
        }
    }

    pub fn predict<P: Predictor + ?Sized>(self, model: &P, x: &Features) -> EvalResult<Prediction> {
        Ok(match self {
            PredictFn::Label => model.predict_one(x)?.into(),
            PredictFn::Proba => Prediction::Proba(model.predict_proba_one(x)?),
        })
    }
}

/// Diagnostic options for one evaluation run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EvalSettings {
    /// Print a progress line every N answers; 0 disables printing.
    pub print_every: usize,
    pub show_time: bool,
    pub show_memory: bool,
}

impl EvalSettings {
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn every(print_every: usize) -> Self {
        Self {
            print_every,
            ..Self::default()
        }
    }

    pub fn with_time(mut self) -> Self {
        self.show_time = true;
        self
    }

    pub fn with_memory(mut self) -> Self {
        self.show_memory = true;
        self
    }

    /// Whether a progress line is due after `answered` answers.
    pub fn is_checkpoint(&self, answered: usize) -> bool {
        self.print_every > 0 && answered > 0 && answered % self.print_every == 0
    }
}

impl From<&EvalCfg> for EvalSettings {
    fn from(cfg: &EvalCfg) -> Self {
        Self {
            print_every: cfg.print_every,
            show_time: cfg.show_time,
            show_memory: cfg.show_memory,
        }
    }
}

/// Counters describing a finished run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct EvalSummary {
    pub questions: usize,
    pub answers: usize,
    /// Answers whose prediction was degenerate and therefore not scored.
    pub skipped: usize,
    pub progress_lines: usize,
}
