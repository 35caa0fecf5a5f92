//! Run-length detection over eye-tracker channels.
//!
//! Closed eyes show up as missing gaze coordinates; a wink is one eye missing
//! while the other keeps tracking. Both detectors share [`closed_runs`].

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{Interval, Record, Result};

pub const LEFT_X: &str = "left_x";
pub const LEFT_Y: &str = "left_y";
pub const RIGHT_X: &str = "right_x";
pub const RIGHT_Y: &str = "right_y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn x_channel(self) -> &'static str {
        match self {
            Self::Left => LEFT_X,
            Self::Right => RIGHT_X,
        }
    }

    pub fn y_channel(self) -> &'static str {
        match self {
            Self::Left => LEFT_Y,
            Self::Right => RIGHT_Y,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Maximal runs of indices in `range` for which `qualifies` holds. A run that
/// is still open when the range ends is dropped.
pub fn closed_runs(range: Range<usize>, mut qualifies: impl FnMut(usize) -> bool) -> Vec<Interval> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;
    for index in range {
        match (qualifies(index), open) {
            (true, None) => open = Some(index),
            (false, Some(start)) => {
                runs.push(Interval::new(start, index));
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        tracing::debug!(start, "dropping run still open at end of data");
    }
    runs
}

/// Detects eye closures on one gaze coordinate channel.
#[derive(Debug, Clone)]
pub struct ClosedEyesDetector {
    channel: String,
    short_blink_samples: usize,
}

impl ClosedEyesDetector {
    /// Runs no longer than `short_blink_samples` are treated as natural
    /// blinks and discarded.
    pub fn new(channel: impl Into<String>, short_blink_samples: usize) -> Self {
        Self {
            channel: channel.into(),
            short_blink_samples,
        }
    }

    pub fn detect_in(&self, record: &Record) -> Result<Vec<Interval>> {
        let samples = record.channel(&self.channel)?.samples();
        let closures = self.detect(samples);
        tracing::debug!(channel = %self.channel, ?closures, "closed-eye scan finished");
        Ok(closures)
    }

    /// Missing samples before the first valid one are recording start-up
    /// noise and never form a run.
    pub fn detect(&self, samples: &[f64]) -> Vec<Interval> {
        let Some(first_valid) = samples.iter().position(|value| !value.is_nan()) else {
            return Vec::new();
        };

        closed_runs(first_valid..samples.len(), |index| samples[index].is_nan())
            .into_iter()
            .filter(|run| run.len() > self.short_blink_samples)
            .collect()
    }
}

/// Detects single-eye closures of `eye`.
#[derive(Debug, Clone, Copy)]
pub struct WinkDetector {
    eye: Eye,
}

impl WinkDetector {
    pub fn new(eye: Eye) -> Self {
        Self { eye }
    }

    pub fn eye(&self) -> Eye {
        self.eye
    }

    /// Every maximal wink run among the first `limit` rows, no length filter.
    pub fn detect_within(&self, record: &Record, limit: usize) -> Result<Vec<Interval>> {
        let winking = record.channel(self.eye.x_channel())?.samples();
        let winking_y = record.channel(self.eye.y_channel())?.samples();
        let open = record.channel(self.eye.other().x_channel())?.samples();
        let open_y = record.channel(self.eye.other().y_channel())?.samples();

        let end = limit.min(record.len());
        let winks = closed_runs(0..end, |i| {
            winking[i].is_nan() && winking_y[i].is_nan() && !open[i].is_nan() && !open_y[i].is_nan()
        });
        tracing::debug!(eye = ?self.eye, ?winks, "wink scan finished");
        Ok(winks)
    }
}
