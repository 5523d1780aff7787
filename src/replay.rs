//! Re-scoring of recorded keystroke logs.
//!
//! A log is a target text plus timestamped keys. Replaying drives an
//! [`Attempt`] on a [`ManualClock`], ticking at a fixed interval between
//! keys, so the same log always scores the same.

use std::fs;
use std::path::Path;
use std::time::Duration;

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::attempt::{Attempt, AttemptResult};
use crate::clock::ManualClock;
use crate::error::{Result, ScoreError};
use crate::time_series::TimeSeriesPoint;

/// Longest pause between two keys that is still sampled
pub const IDLE_GAP: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Char(char),
    Backspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    /// Milliseconds since the log began
    pub at_ms: u64,
    pub key: Key,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeLog {
    pub text: String,
    #[serde(default)]
    pub time_limit_secs: Option<u64>,
    pub events: Vec<KeystrokeEvent>,
}

impl KeystrokeLog {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let log: KeystrokeLog = serde_json::from_slice(&bytes)?;
        if log.text.is_empty() {
            return Err(ScoreError::EmptyText(path.to_path_buf()));
        }
        Ok(log)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub result: AttemptResult,
    pub samples: Vec<TimeSeriesPoint>,
}

pub fn replay(log: &KeystrokeLog, sample_interval: Duration) -> Result<ReplayReport> {
    if sample_interval.is_zero() {
        return Err(ScoreError::ZeroSampleInterval);
    }

    let mut attempt = Attempt::with_clock(log.text.as_str(), ManualClock::new());
    if let Some(secs) = log.time_limit_secs {
        attempt = attempt.with_time_limit(Duration::from_secs(secs));
    }

    let mut next_tick = sample_interval;
    let mut last_key_at: Option<Duration> = None;
    let events = log.events.iter().sorted_by_key(|e| e.at_ms);
    for event in events {
        let at = Duration::from_millis(event.at_ms);
        // no samples before the first key or past an idle gap
        let tick_until = match last_key_at {
            Some(last) => at.min(last + IDLE_GAP),
            None => Duration::ZERO,
        };
        while next_tick <= tick_until && !attempt.has_finished() {
            attempt.clock().set_elapsed(next_tick);
            attempt.on_tick();
            next_tick += sample_interval;
        }
        if next_tick <= at {
            next_tick = at + sample_interval;
        }
        attempt.clock().set_elapsed(at);
        last_key_at = Some(at);

        if attempt.has_finished() {
            debug!("attempt ended at {}ms, dropping remaining keys", event.at_ms);
            break;
        }
        match event.key {
            Key::Char(c) => {
                attempt.write(c);
            }
            Key::Backspace => attempt.backspace(),
        }
    }

    let result = attempt.finish();
    debug!(
        "replayed {} keys: {} wpm, {} raw, {}% accuracy",
        log.events.len(),
        result.wpm,
        result.raw_wpm,
        result.accuracy
    );

    Ok(ReplayReport {
        result,
        samples: attempt.samples().points().to_vec(),
    })
}

/// Writes the sample series as csv with a header row.
pub fn write_samples_csv<W: std::io::Write>(samples: &[TimeSeriesPoint], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for point in samples {
        writer.serialize(point)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn typed_at(text: &str, step_ms: u64) -> Vec<KeystrokeEvent> {
        text.chars()
            .enumerate()
            .map(|(i, c)| KeystrokeEvent {
                at_ms: i as u64 * step_ms,
                key: Key::Char(c),
            })
            .collect()
    }

    #[test]
    fn parses_keys() {
        let json = r#"{"text":"ab","events":[{"at_ms":0,"key":{"char":"a"}},{"at_ms":5,"key":"backspace"}]}"#;
        let log: KeystrokeLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.time_limit_secs, None);
        assert_eq!(log.events[0].key, Key::Char('a'));
        assert_eq!(log.events[1].key, Key::Backspace);
    }

    #[test]
    fn replays_a_clean_run() {
        // 11 chars over one second each after the first
        let log = KeystrokeLog {
            text: "hello world".into(),
            time_limit_secs: None,
            events: typed_at("hello world", 1_000),
        };
        let report = replay(&log, Duration::from_millis(1_000)).unwrap();

        assert_eq!(report.result.elapsed_secs, 10.0);
        assert_eq!(report.result.wpm, 13.2);
        assert_eq!(report.result.raw_wpm, 13.2);
        assert_eq!(report.result.accuracy, 100.0);
        assert!(!report.samples.is_empty());
    }

    #[test]
    fn events_are_applied_in_time_order() {
        let mut events = typed_at("abc", 100);
        events.reverse();
        let log = KeystrokeLog {
            text: "abc".into(),
            time_limit_secs: None,
            events,
        };
        let report = replay(&log, Duration::from_millis(50)).unwrap();
        assert_eq!(report.result.correct_keystrokes, 3);
    }

    #[test]
    fn backspace_does_not_refund_keystrokes() {
        let log = KeystrokeLog {
            text: "ab".into(),
            time_limit_secs: None,
            events: vec![
                KeystrokeEvent { at_ms: 0, key: Key::Char('x') },
                KeystrokeEvent { at_ms: 100, key: Key::Backspace },
                KeystrokeEvent { at_ms: 200, key: Key::Char('a') },
                KeystrokeEvent { at_ms: 300, key: Key::Char('b') },
            ],
        };
        let report = replay(&log, Duration::from_millis(100)).unwrap();
        assert_eq!(report.result.total_keystrokes, 3);
        assert_eq!(report.result.correct_keystrokes, 2);
        assert_eq!(report.result.accuracy, 67.0);
    }

    #[test]
    fn time_limit_drops_late_keys() {
        let log = KeystrokeLog {
            text: "abcdef".into(),
            time_limit_secs: Some(1),
            events: typed_at("abcdef", 400),
        };
        let report = replay(&log, Duration::from_millis(100)).unwrap();
        // keys at 0, 400 and 800ms make it in
        assert_eq!(report.result.total_keystrokes, 3);
        assert_eq!(report.result.elapsed_secs, 1.0);
    }

    #[test]
    fn long_pause_after_time_limit_stops_ticking() {
        let log = KeystrokeLog {
            text: "ab".into(),
            time_limit_secs: Some(1),
            events: vec![
                KeystrokeEvent { at_ms: 0, key: Key::Char('a') },
                KeystrokeEvent { at_ms: 3_000_000_000, key: Key::Char('b') },
            ],
        };
        let report = replay(&log, Duration::from_millis(1)).unwrap();
        assert_eq!(report.samples.len(), 1_000);
        assert_eq!(report.result.total_keystrokes, 1);
        assert_eq!(report.result.elapsed_secs, 1.0);
    }

    #[test]
    fn long_idle_pause_is_not_sampled() {
        let log = KeystrokeLog {
            text: "ab".into(),
            time_limit_secs: None,
            events: vec![
                KeystrokeEvent { at_ms: 0, key: Key::Char('a') },
                KeystrokeEvent { at_ms: 3_000_000_000, key: Key::Char('b') },
            ],
        };
        let report = replay(&log, Duration::from_millis(1)).unwrap();
        // one sample per ms of the idle gap, plus the final one
        assert_eq!(report.samples.len(), 30_001);
        assert_eq!(report.result.total_keystrokes, 2);
        assert_eq!(report.result.elapsed_secs, 3_000_000.0);
    }

    #[test]
    fn late_first_key_skips_empty_ticks() {
        let log = KeystrokeLog {
            text: "ab".into(),
            time_limit_secs: None,
            events: vec![
                KeystrokeEvent { at_ms: 3_000_000_000, key: Key::Char('a') },
                KeystrokeEvent { at_ms: 3_000_000_500, key: Key::Char('b') },
            ],
        };
        let report = replay(&log, Duration::from_millis(100)).unwrap();
        assert_eq!(report.samples.len(), 6);
        assert_eq!(report.samples[0].t, 0.1);
        assert_eq!(report.result.elapsed_secs, 0.5);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let log = KeystrokeLog {
            text: "a".into(),
            time_limit_secs: None,
            events: vec![],
        };
        assert_matches!(replay(&log, Duration::ZERO), Err(ScoreError::ZeroSampleInterval));
    }

    #[test]
    fn empty_text_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, r#"{"text":"","events":[]}"#).unwrap();
        assert_matches!(KeystrokeLog::from_path(&path), Err(ScoreError::EmptyText(_)));
    }

    #[test]
    fn bad_json_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.json");
        fs::write(&path, "[]").unwrap();
        assert_matches!(KeystrokeLog::from_path(&path), Err(ScoreError::Json(_)));
    }

    #[test]
    fn csv_has_header() {
        let samples = vec![TimeSeriesPoint::new(1.0, 40.0, 42.5)];
        let mut out = Vec::new();
        write_samples_csv(&samples, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "t,wpm,raw_wpm\n1.0,40.0,42.5\n");
    }
}
