use serde::{Deserialize, Serialize};

use crate::metrics::round2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
    pub raw_wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64, raw_wpm: f64) -> Self {
        Self { t, wpm, raw_wpm }
    }
}

impl From<(f64, f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64, f64)) -> Self {
        TimeSeriesPoint {
            t: v.0,
            wpm: v.1,
            raw_wpm: v.2,
        }
    }
}

impl From<TimeSeriesPoint> for (f64, f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm, p.raw_wpm)
    }
}

/// Wpm samples taken over the course of an attempt, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WpmSeries {
    points: Vec<TimeSeriesPoint>,
}

impl WpmSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: TimeSeriesPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn mean_raw_wpm(&self) -> Option<f64> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self.points.iter().map(|p| p.raw_wpm).sum::<f64>();
        Some(sum / self.points.len() as f64)
    }

    /// Population standard deviation of the raw wpm samples.
    pub fn std_dev_raw_wpm(&self) -> Option<f64> {
        let mean = self.mean_raw_wpm()?;
        let variance = self
            .points
            .iter()
            .map(|p| {
                let diff = mean - p.raw_wpm;
                diff * diff
            })
            .sum::<f64>()
            / self.points.len() as f64;
        Some(variance.sqrt())
    }

    /// How steady the raw speed was, from 0 to 100.
    ///
    /// 100 minus the coefficient of variation (in percent) of the raw wpm
    /// samples. Fewer than two samples, or a zero mean, count as fully steady.
    pub fn consistency(&self) -> f64 {
        if self.points.len() < 2 {
            return 100.0;
        }
        match (self.mean_raw_wpm(), self.std_dev_raw_wpm()) {
            (Some(mean), Some(std_dev)) if mean > 0.0 => {
                round2((100.0 - std_dev / mean * 100.0).clamp(0.0, 100.0))
            }
            _ => 100.0,
        }
    }
}

impl FromIterator<TimeSeriesPoint> for WpmSeries {
    fn from_iter<I: IntoIterator<Item = TimeSeriesPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
