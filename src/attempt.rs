use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::matcher::{evaluate, WordCredit};
use crate::metrics::{compute_metrics, Keystrokes, LiveMetrics};
use crate::time_series::{TimeSeriesPoint, WpmSeries};

#[derive(Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// Final scores of a completed attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub consistency: f64,
    pub elapsed_secs: f64,
    pub total_keystrokes: u64,
    pub correct_keystrokes: u64,
    pub word_count: usize,
    pub finished_at: DateTime<Local>,
}

/// One run through a target text.
///
/// Keeps the keystroke counters the scoring engine needs: every typed char
/// is one keystroke, judged against the target char at the position it was
/// typed. Backspace removes text but never refunds a keystroke.
#[derive(Debug)]
pub struct Attempt<C: Clock = SystemClock> {
    text: String,
    text_chars: Vec<char>,
    typed: String,
    typed_len: usize,
    keystrokes: Keystrokes,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
    finished_at: Option<DateTime<Local>>,
    time_limit: Option<Duration>,
    samples: WpmSeries,
    clock: C,
}

impl Attempt<SystemClock> {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_clock(text, SystemClock)
    }
}

impl<C: Clock> Attempt<C> {
    pub fn with_clock(text: impl Into<String>, clock: C) -> Self {
        let text = text.into();
        let text_chars = text.chars().collect();
        Self {
            text,
            text_chars,
            typed: String::new(),
            typed_len: 0,
            keystrokes: Keystrokes::default(),
            started_at: None,
            ended_at: None,
            finished_at: None,
            time_limit: None,
            samples: WpmSeries::new(),
            clock,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn keystrokes(&self) -> Keystrokes {
        self.keystrokes
    }

    pub fn samples(&self) -> &WpmSeries {
        &self.samples
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Time since the first keystroke, frozen once the attempt has ended.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(start) => self.now().saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    pub fn seconds_remaining(&self) -> Option<f64> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed()).as_secs_f64())
    }

    /// Records a typed char. Returns `None` when the char was not accepted.
    pub fn write(&mut self, c: char) -> Option<Outcome> {
        if self.has_finished() || self.typed_len >= self.text_chars.len() {
            return None;
        }
        if self.time_is_up() {
            self.end();
            return None;
        }

        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
            debug!("attempt started, {} chars to type", self.text_chars.len());
        }

        let expected = self.text_chars[self.typed_len];
        let outcome = if c == expected {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };

        self.keystrokes.total += 1;
        if outcome == Outcome::Correct {
            self.keystrokes.correct += 1;
        }
        self.typed.push(c);
        self.typed_len += 1;
        trace!("typed {:?} expecting {:?}: {}", c, expected, outcome);

        if self.typed_len == self.text_chars.len() {
            self.end();
        }
        Some(outcome)
    }

    pub fn backspace(&mut self) {
        if self.has_finished() {
            return;
        }
        if self.typed.pop().is_some() {
            self.typed_len -= 1;
            trace!("backspace, {} chars typed", self.typed_len);
        }
    }

    /// Samples the live metrics and ends the attempt once its time is up.
    pub fn on_tick(&mut self) {
        if !self.has_started() || self.has_finished() {
            return;
        }
        if self.time_is_up() {
            self.end();
            return;
        }
        self.sample();
    }

    /// Ends the attempt and returns its final scores. Only the first call
    /// moves the end instant; later calls return the same result.
    pub fn finish(&mut self) -> AttemptResult {
        self.end();
        let finished_at = self.finished_at.unwrap_or_else(Local::now);
        self.summary(finished_at)
    }

    fn end(&mut self) {
        if self.has_finished() {
            return;
        }
        let now = self.clock.now();
        // a time limit caps the attempt even if the caller noticed late
        let ended_at = match (self.started_at, self.time_limit) {
            (Some(start), Some(limit)) if now.saturating_duration_since(start) > limit => {
                start + limit
            }
            _ => now,
        };
        let finished_at = Local::now();
        self.ended_at = Some(ended_at);
        self.finished_at = Some(finished_at);

        if self.has_started() {
            self.sample();
        }
        debug!(
            "attempt finished after {:.2}s with {} keystrokes",
            self.elapsed().as_secs_f64(),
            self.keystrokes.total
        );
    }

    pub fn credit(&self) -> WordCredit {
        evaluate(&self.typed, &self.text, self.has_finished())
    }

    pub fn metrics(&self) -> LiveMetrics {
        compute_metrics(
            self.started_at,
            self.now(),
            self.keystrokes,
            &self.typed,
            &self.text,
            self.has_finished(),
        )
    }

    /// Final scores, once the attempt has ended.
    pub fn result(&self) -> Option<AttemptResult> {
        self.finished_at.map(|finished_at| self.summary(finished_at))
    }

    fn summary(&self, finished_at: DateTime<Local>) -> AttemptResult {
        let metrics = self.metrics();
        AttemptResult {
            wpm: metrics.wpm,
            raw_wpm: metrics.raw_wpm,
            accuracy: metrics.accuracy,
            consistency: self.samples.consistency(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            total_keystrokes: self.keystrokes.total,
            correct_keystrokes: self.keystrokes.correct,
            word_count: self.text.split(' ').filter(|w| !w.is_empty()).count(),
            finished_at,
        }
    }

    fn now(&self) -> Instant {
        self.ended_at.unwrap_or_else(|| self.clock.now())
    }

    fn time_is_up(&self) -> bool {
        match (self.started_at, self.time_limit) {
            (Some(start), Some(limit)) => self.clock.now().saturating_duration_since(start) >= limit,
            _ => false,
        }
    }

    fn sample(&mut self) {
        let metrics = self.metrics();
        self.samples.push(TimeSeriesPoint::new(
            self.elapsed().as_secs_f64(),
            metrics.wpm,
            metrics.raw_wpm,
        ));
    }
}
