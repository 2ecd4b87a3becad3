//! Time helpers for diagnostics.

use std::time::{Duration, Instant};

/// Monotonic stopwatch started at construction.
#[derive(Copy, Clone, Debug)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Render whole seconds as `H:MM:SS`, prefixed with a day count past 24 hours.
///
/// Sub-second precision is truncated, so 5.9s renders as `0:00:05`.
pub fn format_hms(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let rem = total % 86_400;
    let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => format!("{h}:{m:02}:{s:02}"),
        1 => format!("1 day, {h}:{m:02}:{s:02}"),
        d => format!("{d} days, {h}:{m:02}:{s:02}"),
    }
}
