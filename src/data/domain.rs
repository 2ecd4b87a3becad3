//! Core observation and event definitions.

use std::collections::BTreeMap;
use std::fmt;

/// Feature mapping for a single observation. Ordered so iteration is deterministic.
pub type Features = BTreeMap<String, f64>;

/// Ground truth attached to an observation.
#[derive(Clone, Debug, PartialEq)]
pub enum Label {
    Bool(bool),
    Class(String),
    Real(f64),
}

impl Label {
    /// Class key for classification targets, `None` for regression targets.
    pub fn class_key(&self) -> Option<ClassKey> {
        match self {
            Label::Bool(b) => Some(ClassKey::Bool(*b)),
            Label::Class(c) => Some(ClassKey::Class(c.clone())),
            Label::Real(_) => None,
        }
    }

    /// Numeric value for regression targets.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Label::Real(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Bool(b) => write!(f, "{b}"),
            Label::Class(c) => f.write_str(c),
            Label::Real(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Label {
    fn from(value: bool) -> Self {
        Label::Bool(value)
    }
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Label::Real(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Class(value.to_string())
    }
}

/// Orderable class identifier, used to key probability maps.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ClassKey {
    Bool(bool),
    Class(String),
}

impl From<ClassKey> for Label {
    fn from(value: ClassKey) -> Self {
        match value {
            ClassKey::Bool(b) => Label::Bool(b),
            ClassKey::Class(c) => Label::Class(c),
        }
    }
}

/// One raw item of the input stream.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub features: Features,
    pub label: Label,
}

impl Observation {
    pub fn new(features: Features, label: impl Into<Label>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }
}

/// Question (`label == None`) or answer (`label == Some`) for observation `index`.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub index: usize,
    pub features: Features,
    pub label: Option<Label>,
}

impl Event {
    pub fn question(index: usize, features: Features) -> Self {
        Self {
            index,
            features,
            label: None,
        }
    }

    pub fn answer(index: usize, features: Features, label: Label) -> Self {
        Self {
            index,
            features,
            label: Some(label),
        }
    }

    pub fn is_question(&self) -> bool {
        self.label.is_none()
    }
}
