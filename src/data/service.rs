//! Question/answer simulation over a labelled stream.
//!
//! Observations are replayed in arrival order. Each one is first asked as a
//! question; its answer is held back until the stream's clock has moved past
//! the observation's moment plus its reveal delay.

use std::collections::VecDeque;
use std::fmt;

use crate::common::error::{EvalError, EvalResult};

use super::domain::{Event, Features, Label, Observation};

/// How the clock of an observation is read.
#[derive(Default)]
pub enum Moment {
    /// Observations are timestamped by their position in the stream.
    #[default]
    Arrival,
    /// Read the moment from a feature.
    Field(String),
    /// Compute the moment from the features.
    With(Box<dyn Fn(&Features) -> f64>),
}

impl Moment {
    pub fn field(name: impl Into<String>) -> Self {
        Moment::Field(name.into())
    }

    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&Features) -> f64 + 'static,
    {
        Moment::With(Box::new(f))
    }

    fn resolve(&self, index: usize, x: &Features) -> EvalResult<f64> {
        let t = match self {
            Moment::Arrival => index as f64,
            Moment::Field(name) => lookup(x, name, "moment")?,
            Moment::With(f) => f(x),
        };
        if !t.is_finite() {
            return Err(EvalError::invalid(format!(
                "moment of observation {index} is not finite"
            )));
        }
        Ok(t)
    }
}

impl fmt::Debug for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Moment::Arrival => f.write_str("Arrival"),
            Moment::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Moment::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

/// How long the ground truth stays hidden, in the same unit as [`Moment`].
#[derive(Default)]
pub enum Delay {
    /// Reveal before the next question.
    #[default]
    None,
    /// Same delay for every observation.
    Fixed(f64),
    /// Read the delay from a feature.
    Field(String),
    /// Compute the delay from the features and the label.
    With(Box<dyn Fn(&Features, &Label) -> f64>),
}

impl Delay {
    pub fn field(name: impl Into<String>) -> Self {
        Delay::Field(name.into())
    }

    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&Features, &Label) -> f64 + 'static,
    {
        Delay::With(Box::new(f))
    }

    fn resolve(&self, index: usize, x: &Features, y: &Label) -> EvalResult<f64> {
        let d = match self {
            Delay::None => 0.0,
            Delay::Fixed(d) => *d,
            Delay::Field(name) => lookup(x, name, "delay")?,
            Delay::With(f) => f(x, y),
        };
        if !d.is_finite() || d < 0.0 {
            return Err(EvalError::invalid(format!(
                "delay of observation {index} must be finite and non-negative, got {d}"
            )));
        }
        Ok(d)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::None => f.write_str("None"),
            Delay::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Delay::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Delay::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

fn lookup(x: &Features, name: &str, what: &str) -> EvalResult<f64> {
    x.get(name)
        .copied()
        .ok_or_else(|| EvalError::invalid(format!("{what} field '{name}' is missing")))
}

/// Answer waiting for its reveal time.
struct Held {
    index: usize,
    expiry: f64,
    features: Features,
    label: Label,
}

impl Held {
    fn into_event(self) -> Event {
        Event::answer(self.index, self.features, self.label)
    }
}

/// Question read from the source, emitted once every answer due by its moment is out.
struct Staged {
    moment: f64,
    question: Event,
    answer: Held,
}

/// Lazy event stream produced by [`simulate_qa`].
pub struct QaStream<I> {
    source: I,
    moment: Moment,
    delay: Delay,
    held: VecDeque<Held>,
    staged: Option<Staged>,
    next_index: usize,
    exhausted: bool,
    failed: bool,
}

impl<I> QaStream<I> {
    /// Number of answers currently held back.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    fn hold(&mut self, answer: Held) {
        // Equal expiries keep insertion order.
        let pos = self.held.partition_point(|h| h.expiry <= answer.expiry);
        self.held.insert(pos, answer);
    }

    fn stage(&mut self, obs: Observation) -> EvalResult<Staged> {
        let index = self.next_index;
        self.next_index += 1;
        let t = self.moment.resolve(index, &obs.features)?;
        let d = self.delay.resolve(index, &obs.features, &obs.label)?;
        Ok(Staged {
            moment: t,
            question: Event::question(index, obs.features.clone()),
            answer: Held {
                index,
                expiry: t + d,
                features: obs.features,
                label: obs.label,
            },
        })
    }
}

impl<I> Iterator for QaStream<I>
where
    I: Iterator<Item = Observation>,
{
    type Item = EvalResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            if let Some(t) = self.staged.as_ref().map(|s| s.moment) {
                if self.held.front().is_some_and(|h| h.expiry <= t) {
                    return self.held.pop_front().map(|h| Ok(h.into_event()));
                }
                if let Some(staged) = self.staged.take() {
                    self.hold(staged.answer);
                    return Some(Ok(staged.question));
                }
            }

            if self.exhausted {
                return self.held.pop_front().map(|h| Ok(h.into_event()));
            }

            match self.source.next() {
                None => self.exhausted = true,
                Some(obs) => match self.stage(obs) {
                    Ok(staged) => self.staged = Some(staged),
                    Err(err) => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                },
            }
        }
    }
}

/// Turn a labelled stream into questions and delayed answers, in arrival order.
pub fn simulate_qa<I>(stream: I, moment: Moment, delay: Delay) -> QaStream<I::IntoIter>
where
    I: IntoIterator<Item = Observation>,
{
    QaStream {
        source: stream.into_iter(),
        moment,
        delay,
        held: VecDeque::new(),
        staged: None,
        next_index: 0,
        exhausted: false,
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pairs: &[(&str, f64)], y: f64) -> Observation {
        let features = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Observation::new(features, y)
    }

    fn trace<I: Iterator<Item = EvalResult<Event>>>(events: I) -> Vec<(usize, bool)> {
        events
            .map(|e| {
                let e = e.unwrap();
                (e.index, e.is_question())
            })
            .collect()
    }

    #[test]
    fn no_delay_interleaves() {
        let stream = (0..3).map(|i| obs(&[], i as f64));
        let got = trace(simulate_qa(stream, Moment::Arrival, Delay::None));
        assert_eq!(
            got,
            vec![(0, true), (0, false), (1, true), (1, false), (2, true), (2, false)]
        );
    }

    #[test]
    fn fixed_delay_holds_answers_back() {
        let stream = (0..4).map(|i| obs(&[], i as f64));
        let got = trace(simulate_qa(stream, Moment::Arrival, Delay::Fixed(2.0)));
        assert_eq!(
            got,
            vec![
                (0, true),
                (1, true),
                (0, false),
                (2, true),
                (1, false),
                (3, true),
                (2, false),
                (3, false),
            ]
        );
    }

    #[test]
    fn answers_carry_labels_and_features() {
        let stream = vec![obs(&[("a", 1.0)], 7.0)];
        let events: Vec<Event> = simulate_qa(stream, Moment::Arrival, Delay::None)
            .collect::<EvalResult<_>>()
            .unwrap();
        assert_eq!(events[0].label, None);
        assert_eq!(events[1].label, Some(Label::Real(7.0)));
        assert_eq!(events[0].features, events[1].features);
    }

    #[test]
    fn field_moment_and_field_delay() {
        // Observation 0 is revealed late, observation 1 right away.
        let stream = vec![
            obs(&[("t", 0.0), ("wait", 10.0)], 0.0),
            obs(&[("t", 1.0), ("wait", 0.0)], 1.0),
            obs(&[("t", 2.0), ("wait", 0.0)], 2.0),
        ];
        let got = trace(simulate_qa(stream, Moment::field("t"), Delay::field("wait")));
        assert_eq!(
            got,
            vec![(0, true), (1, true), (1, false), (2, true), (2, false), (0, false)]
        );
    }

    #[test]
    fn callable_policies() {
        let stream = (0..3).map(|i| obs(&[("ts", 10.0 * i as f64)], i as f64));
        let moment = Moment::with(|x| x["ts"]);
        let delay = Delay::with(|_, y| if y.as_real() == Some(0.0) { 15.0 } else { 0.0 });
        let got = trace(simulate_qa(stream, moment, delay));
        assert_eq!(
            got,
            vec![(0, true), (1, true), (1, false), (0, false), (2, true), (2, false)]
        );
    }

    #[test]
    fn missing_field_fails_and_stops() {
        let stream = vec![obs(&[], 0.0), obs(&[], 1.0)];
        let mut qa = simulate_qa(stream, Moment::field("t"), Delay::None);
        let err = qa.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("moment field 't' is missing"));
        assert!(qa.next().is_none());
    }

    #[test]
    fn negative_delay_is_rejected() {
        let stream = vec![obs(&[], 0.0)];
        let mut qa = simulate_qa(stream, Moment::Arrival, Delay::Fixed(-1.0));
        assert!(qa.next().unwrap().is_err());
    }

    #[test]
    fn held_answers_drain_at_end() {
        let stream = (0..5).map(|i| obs(&[], i as f64));
        let mut qa = simulate_qa(stream, Moment::Arrival, Delay::Fixed(100.0));
        for _ in 0..5 {
            assert!(qa.next().unwrap().unwrap().is_question());
        }
        assert_eq!(qa.held(), 5);
        let rest: Vec<usize> = qa.map(|e| e.unwrap().index).collect();
        assert_eq!(rest, vec![0, 1, 2, 3, 4]);
    }
}
