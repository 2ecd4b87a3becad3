//! Progressive validation: interleave predictions and training over a question/answer stream.
//!
//! Each observation is predicted when its question arrives and scored when its
//! answer arrives, strictly before the model learns from it. With a reveal
//! delay the model keeps answering questions while earlier labels are still
//! hidden, which is what it would face in production.

use std::collections::HashMap;
use std::io::{self, Write};

use tracing::{debug, error, info};

use crate::common::error::{EvalCode, EvalError, EvalResult};
use crate::common::fmt::{human_bytes, thousands};
use crate::common::time::{format_hms, Stopwatch};
use crate::data::domain::{Event, Features, Label, Observation};
use crate::data::service::{simulate_qa, Delay, Moment};
use crate::training::domain::{Prediction, Predictor};

use super::domain::{EvalSettings, EvalSummary, Metric, PredictFn};

/// Single-run state: the model and metric under evaluation plus the predictions awaiting answers.
struct Evaluator<'a, P: ?Sized, M, W> {
    model: &'a mut P,
    metric: M,
    predict: PredictFn,
    settings: EvalSettings,
    out: &'a mut W,
    pending: HashMap<usize, Prediction>,
    summary: EvalSummary,
    clock: Stopwatch,
}

impl<'a, P, M, W> Evaluator<'a, P, M, W>
where
    P: Predictor + ?Sized,
    M: Metric,
    W: Write,
{
    fn ask(&mut self, index: usize, x: &Features) -> EvalResult<()> {
        let y_pred = self.predict.predict(&*self.model, x)?;
        debug!(ev = "question", index, degenerate = y_pred.is_degenerate());
        if self.pending.insert(index, y_pred).is_some() {
            error!(ev = "invariant", code = EvalCode::Invariant as u32, index);
            return Err(EvalError::invariant(format!(
                "observation {index} was asked twice before being answered"
            )));
        }
        self.summary.questions += 1;
        Ok(())
    }

    fn answer(&mut self, index: usize, x: &Features, y: &Label) -> EvalResult<()> {
        let Some(y_pred) = self.pending.remove(&index) else {
            error!(ev = "invariant", code = EvalCode::Invariant as u32, index);
            return Err(EvalError::invariant(format!(
                "observation {index} was answered without having been asked"
            )));
        };

        // Score first: the model must not have seen this observation yet.
        if y_pred.is_degenerate() {
            debug!(ev = "skip_degenerate", index);
            self.summary.skipped += 1;
        } else {
            self.metric.update(y, &y_pred)?;
        }
        self.model.fit_one(x, y)?;
        debug!(ev = "answer", index);

        self.summary.answers += 1;
        if self.settings.is_checkpoint(self.summary.answers) {
            self.report()?;
        }
        Ok(())
    }

    fn report(&mut self) -> io::Result<()> {
        let mut line = format!("[{}] {}", thousands(self.summary.answers), self.metric);
        if self.settings.show_time {
            line.push_str(" – ");
            line.push_str(&format_hms(self.clock.elapsed()));
        }
        if self.settings.show_memory {
            line.push_str(" – ");
            match self.model.memory_usage() {
                Some(bytes) => line.push_str(&human_bytes(bytes)),
                None => line.push_str("unknown"),
            }
        }
        writeln!(self.out, "{line}")?;
        self.summary.progress_lines += 1;
        Ok(())
    }
}

/// Run progressive validation over an already simulated event stream and
/// report run counters alongside the metric.
///
/// The metric must accept the model's kind; this is checked before the first
/// event is pulled. Progress lines go to `out`.
pub fn evaluate_detailed<E, P, M, W>(
    events: E,
    model: &mut P,
    metric: M,
    settings: &EvalSettings,
    out: &mut W,
) -> EvalResult<(M, EvalSummary)>
where
    E: IntoIterator<Item = EvalResult<Event>>,
    P: Predictor + ?Sized,
    M: Metric,
    W: Write,
{
    let kind = model.kind();
    if !metric.works_with(kind) {
        error!(ev = "config", code = EvalCode::Config as u32, metric = metric.name(), %kind);
        return Err(EvalError::config(
            metric.name(),
            format!("{} ({kind})", model.name()),
        ));
    }

    let predict = PredictFn::select(kind, metric.requires_labels());
    info!(
        ev = "eval_start",
        metric = metric.name(),
        model = %model.name(),
        predict = ?predict,
        print_every = settings.print_every
    );

    let mut run = Evaluator {
        model,
        metric,
        predict,
        settings: *settings,
        out,
        pending: HashMap::new(),
        summary: EvalSummary::default(),
        clock: Stopwatch::start(),
    };

    for event in events {
        let Event {
            index,
            features,
            label,
        } = event?;
        match label {
            None => run.ask(index, &features)?,
            Some(y) => run.answer(index, &features, &y)?,
        }
    }

    if !run.pending.is_empty() {
        let mut orphans: Vec<usize> = run.pending.keys().copied().collect();
        orphans.sort_unstable();
        error!(ev = "invariant", code = EvalCode::Invariant as u32, unanswered = orphans.len());
        return Err(EvalError::invariant(format!(
            "stream ended with unanswered observations {orphans:?}"
        )));
    }

    info!(
        ev = "eval_done",
        code = EvalCode::Ok as u32,
        dur_ms = run.clock.elapsed().as_millis() as u64,
        answers = run.summary.answers,
        skipped = run.summary.skipped,
        metric = %run.metric
    );
    Ok((run.metric, run.summary))
}

/// Run progressive validation over an already simulated event stream.
pub fn evaluate<E, P, M, W>(
    events: E,
    model: &mut P,
    metric: M,
    settings: &EvalSettings,
    out: &mut W,
) -> EvalResult<M>
where
    E: IntoIterator<Item = EvalResult<Event>>,
    P: Predictor + ?Sized,
    M: Metric,
    W: Write,
{
    evaluate_detailed(events, model, metric, settings, out).map(|(metric, _)| metric)
}

/// Evaluate `model` on a labelled stream, revealing each label after `delay`.
///
/// Without a delay this is plain progressive validation: predict, score, then
/// learn, one observation after the other. Progress lines go to stdout.
pub fn progressive_val_score<S, P, M>(
    stream: S,
    model: &mut P,
    metric: M,
    moment: Moment,
    delay: Delay,
    settings: &EvalSettings,
) -> EvalResult<M>
where
    S: IntoIterator<Item = Observation>,
    P: Predictor + ?Sized,
    M: Metric,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    evaluate(simulate_qa(stream, moment, delay), model, metric, settings, &mut out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::{Accuracy, LogLoss, Mae};
    use crate::training::domain::{ModelKind, Probas};
    use crate::training::models::{MeanRegressor, PriorClassifier};

    fn q(index: usize) -> EvalResult<Event> {
        Ok(Event::question(index, Features::new()))
    }

    fn a(index: usize, y: f64) -> EvalResult<Event> {
        Ok(Event::answer(index, Features::new(), Label::Real(y)))
    }

    fn run<E>(events: E) -> EvalResult<(Mae, EvalSummary)>
    where
        E: IntoIterator<Item = EvalResult<Event>>,
    {
        let mut model = MeanRegressor::new();
        evaluate_detailed(events, &mut model, Mae::new(), &EvalSettings::silent(), &mut io::sink())
    }

    #[test]
    fn cold_start_is_not_scored() {
        let (metric, summary) = run(vec![q(0), a(0, 1.0), q(1), a(1, 3.0)]).unwrap();
        assert_eq!(summary.answers, 2);
        assert_eq!(summary.skipped, 1);
        // Only observation 1 is scored, against the mean of observation 0.
        assert!((metric.get() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn orphan_answer_is_an_invariant_violation() {
        let err = run(vec![q(0), a(1, 1.0)]).unwrap_err();
        assert_eq!(err.code(), EvalCode::Invariant);
    }

    #[test]
    fn double_question_is_an_invariant_violation() {
        let err = run(vec![q(0), q(0)]).unwrap_err();
        assert_eq!(err.code(), EvalCode::Invariant);
    }

    #[test]
    fn unanswered_question_is_an_invariant_violation() {
        let err = run(vec![q(0), a(0, 1.0), q(1)]).unwrap_err();
        assert!(err.to_string().contains("[1]"));
    }

    #[test]
    fn source_errors_propagate() {
        let err = run(vec![q(0), Err(EvalError::invalid("bad row"))]).unwrap_err();
        assert_eq!(err.code(), EvalCode::InvalidInput);
    }

    #[test]
    fn incompatible_metric_fails_before_reading() {
        let mut model = PriorClassifier::binary();
        let events = std::iter::from_fn(|| -> Option<EvalResult<Event>> {
            panic!("event source must not be touched")
        });
        let err = evaluate(events, &mut model, Mae::new(), &EvalSettings::silent(), &mut io::sink())
            .unwrap_err();
        assert_eq!(err.code(), EvalCode::Config);
        assert!(err.to_string().starts_with("MAE metric is not compatible with PriorClassifier"));
    }

    #[test]
    fn soft_metric_gets_probabilities() {
        let mut model = PriorClassifier::binary();
        let events: Vec<EvalResult<Event>> = vec![
            Ok(Event::question(0, Features::new())),
            Ok(Event::answer(0, Features::new(), Label::Bool(true))),
            Ok(Event::question(1, Features::new())),
            Ok(Event::answer(1, Features::new(), Label::Bool(false))),
        ];
        let (metric, summary) = evaluate_detailed(
            events,
            &mut model,
            LogLoss::new(),
            &EvalSettings::silent(),
            &mut io::sink(),
        )
        .unwrap();
        // Second question sees P(true) = 1, clamped, then the answer is false.
        assert_eq!(summary.skipped, 1);
        assert!(metric.get() > 30.0);
    }

    #[test]
    fn progress_lines_format() {
        let mut model = PriorClassifier::binary();
        let events = (0..4).flat_map(|i| -> [EvalResult<Event>; 2] {
            [
                Ok(Event::question(i, Features::new())),
                Ok(Event::answer(i, Features::new(), Label::Bool(true))),
            ]
        });
        let mut out: Vec<u8> = Vec::new();
        let settings = EvalSettings::every(2).with_time().with_memory();
        evaluate(events, &mut model, Accuracy::new(), &settings, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[2] Accuracy: 100.00% – 0:00:00 – "));
        assert!(lines[1].starts_with("[4] Accuracy: 100.00%"));
        assert!(lines[1].ends_with('B'), "{}", lines[1]);
    }

    #[test]
    fn memory_unknown_when_model_is_silent() {
        struct Quiet;
        impl Predictor for Quiet {
            fn name(&self) -> String {
                "Quiet".into()
            }
            fn kind(&self) -> ModelKind {
                ModelKind::BinaryClassifier
            }
            fn predict_one(&self, _: &Features) -> EvalResult<Option<Label>> {
                Ok(Some(Label::Bool(true)))
            }
            fn predict_proba_one(&self, _: &Features) -> EvalResult<Probas> {
                Ok(Probas::new())
            }
            fn fit_one(&mut self, _: &Features, _: &Label) -> EvalResult<()> {
                Ok(())
            }
        }

        let mut out: Vec<u8> = Vec::new();
        let events: Vec<EvalResult<Event>> = vec![
            Ok(Event::question(0, Features::new())),
            Ok(Event::answer(0, Features::new(), Label::Bool(true))),
        ];
        let settings = EvalSettings::every(1).with_memory();
        evaluate(events, &mut Quiet, Accuracy::new(), &settings, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "[1] Accuracy: 100.00% – unknown\n");
    }
}
