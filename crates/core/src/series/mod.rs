use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Result, SyncError};

/// Position within a stream at that stream's (possibly resampled) rate.
pub type SampleIndex = usize;

/// Half-open span `[start, end)` of a detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: SampleIndex,
    pub end: SampleIndex,
}

impl Interval {
    pub fn new(start: SampleIndex, end: SampleIndex) -> Self {
        debug_assert!(start < end, "interval must be non-empty");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Samples of a single named signal. `NaN` marks a missing sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    name: String,
    samples: Vec<f64>,
}

impl ChannelSeries {
    pub fn new(name: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn slice(&self, start: usize, end: usize) -> Self {
        Self::new(self.name.clone(), self.samples[start..end].to_vec())
    }
}

/// A set of equally long channels addressed by name.
///
/// Column order is kept for output, but lookups never depend on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    channels: Vec<ChannelSeries>,
    len: usize,
}

impl Record {
    /// Builds a record, rejecting ragged channels and duplicate names.
    pub fn from_channels(channels: Vec<ChannelSeries>) -> Result<Self> {
        let len = channels.first().map(ChannelSeries::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for channel in &channels {
            if !seen.insert(channel.name()) {
                return Err(SyncError::invalid(format!(
                    "channel `{}` appears more than once",
                    channel.name()
                )));
            }
            if channel.len() != len {
                return Err(SyncError::invalid(format!(
                    "channel `{}` has {} samples, expected {len}",
                    channel.name(),
                    channel.len()
                )));
            }
        }

        Ok(Self { channels, len })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn channels(&self) -> &[ChannelSeries] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(ChannelSeries::name)
    }

    pub fn channel(&self, name: &str) -> Result<&ChannelSeries> {
        self.channels
            .iter()
            .find(|channel| channel.name() == name)
            .ok_or_else(|| SyncError::MissingChannel(name.to_string()))
    }

    /// Returns the rows from `onset` to the end, re-indexed from zero. An
    /// onset past the end yields an empty record with the same channels.
    pub fn tail_from(&self, onset: SampleIndex) -> Self {
        let start = onset.min(self.len);
        self.rows(start, self.len)
    }

    /// Returns the first `count` rows.
    pub fn head(&self, count: usize) -> Self {
        self.rows(0, count.min(self.len))
    }

    /// Places `other`'s channels to the right of this record's. Rows are
    /// paired by index and the result is as long as the shorter input.
    pub fn concat_columns(&self, other: &Record) -> Result<Self> {
        let rows = self.len.min(other.len);
        let channels = self
            .channels
            .iter()
            .chain(other.channels.iter())
            .map(|channel| channel.slice(0, rows))
            .collect();
        Self::from_channels(channels)
    }

    /// Repeats every row `factor` times in place.
    pub fn repeat_rows(&self, factor: usize) -> Self {
        let channels = self
            .channels
            .iter()
            .map(|channel| {
                let samples = channel
                    .samples()
                    .iter()
                    .flat_map(|&value| std::iter::repeat(value).take(factor))
                    .collect();
                ChannelSeries::new(channel.name(), samples)
            })
            .collect();
        Self {
            channels,
            len: self.len * factor,
        }
    }

    fn rows(&self, start: usize, end: usize) -> Self {
        Self {
            channels: self
                .channels
                .iter()
                .map(|channel| channel.slice(start, end))
                .collect(),
            len: end - start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(names: &[&str], len: usize) -> Record {
        Record::from_channels(
            names
                .iter()
                .enumerate()
                .map(|(offset, name)| {
                    let samples = (0..len).map(|i| (i + offset * 100) as f64).collect();
                    ChannelSeries::new(*name, samples)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = Record::from_channels(vec![
            ChannelSeries::new("a", vec![1.0, 2.0]),
            ChannelSeries::new("b", vec![1.0]),
        ])
        .unwrap_err();
        assert!(format!("{err}").contains("`b`"));
    }

    #[test]
    fn looks_up_channels_by_name() {
        let rec = record(&["F3", "TRG"], 4);
        assert_eq!(rec.channel("TRG").unwrap().samples()[0], 100.0);
        assert!(matches!(
            rec.channel("Cz"),
            Err(SyncError::MissingChannel(name)) if name == "Cz"
        ));
    }

    #[test]
    fn tail_resets_to_zero_based_rows() {
        let rec = record(&["x"], 10);
        let tail = rec.tail_from(7);
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.channel("x").unwrap().samples(), &[7.0, 8.0, 9.0]);

        let past_end = rec.tail_from(25);
        assert!(past_end.is_empty());
        assert_eq!(past_end.channel_names().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn concat_truncates_to_shorter_and_rejects_collisions() {
        let left = record(&["F3", "F4"], 6);
        let right = record(&["left_x"], 4);
        let combined = left.concat_columns(&right).unwrap();
        assert_eq!(combined.len(), 4);
        assert_eq!(
            combined.channel_names().collect::<Vec<_>>(),
            vec!["F3", "F4", "left_x"]
        );

        let clash = record(&["F4"], 6);
        assert!(matches!(
            left.concat_columns(&clash),
            Err(SyncError::InvalidInput(_))
        ));
    }
}
