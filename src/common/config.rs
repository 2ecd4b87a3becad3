//! Runtime configuration loaded from the environment.

use std::env;

/// Snapshot of the diagnostic options consumed by the evaluator.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EvalCfg {
    pub print_every: usize,
    pub show_time: bool,
    pub show_memory: bool,
}

impl EvalCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| {
            lookup(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false)
        };

        Self {
            print_every: lookup("PROGVAL_PRINT_EVERY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0),
            show_time: flag("PROGVAL_SHOW_TIME"),
            show_memory: flag("PROGVAL_SHOW_MEMORY"),
        }
    }
}
