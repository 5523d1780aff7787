use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::matcher::evaluate;

/// Standard word length used by every wpm figure
pub const CHARS_PER_WORD: f64 = 5.0;

/// Keystroke counters kept by whoever drives the attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keystrokes {
    pub total: u64,
    pub correct: u64,
}

impl Keystrokes {
    pub fn new(total: u64, correct: u64) -> Self {
        Self { total, correct }
    }
}

/// Scores for a single instant of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
}

impl LiveMetrics {
    /// What is shown before the first keystroke.
    pub const NOT_STARTED: LiveMetrics = LiveMetrics {
        wpm: 0.0,
        raw_wpm: 0.0,
        accuracy: 100.0,
    };
}

impl Default for LiveMetrics {
    fn default() -> Self {
        Self::NOT_STARTED
    }
}

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Words per minute for `chars` characters over `elapsed_minutes`.
pub fn words_per_minute(chars: f64, elapsed_minutes: f64) -> f64 {
    if elapsed_minutes > 0.0 {
        round2((chars / CHARS_PER_WORD) / elapsed_minutes)
    } else {
        0.0
    }
}

/// Percentage of keystrokes that were correct, 100 before any keystroke.
pub fn accuracy(keystrokes: Keystrokes) -> f64 {
    if keystrokes.total > 0 {
        (keystrokes.correct as f64 / keystrokes.total as f64 * 100.0).round()
    } else {
        100.0
    }
}

/// Recomputes wpm, raw wpm and accuracy from scratch for the instant `now`.
///
/// `started_at` is `None` until the first keystroke. Nothing is carried
/// between calls; `typed` is everything typed so far.
pub fn compute_metrics(
    started_at: Option<Instant>,
    now: Instant,
    keystrokes: Keystrokes,
    typed: &str,
    text: &str,
    test_ended: bool,
) -> LiveMetrics {
    let Some(started_at) = started_at else {
        return LiveMetrics::NOT_STARTED;
    };

    let elapsed_minutes = now.saturating_duration_since(started_at).as_millis() as f64 / 60_000.0;
    let credit = evaluate(typed, text, test_ended);

    LiveMetrics {
        wpm: words_per_minute(credit.wpm_chars() as f64, elapsed_minutes),
        raw_wpm: words_per_minute(keystrokes.total as f64, elapsed_minutes),
        accuracy: accuracy(keystrokes),
    }
}
