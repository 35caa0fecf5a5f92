use serde::{Deserialize, Serialize};

use crate::{Interval, Record, Result, SyncConfig, SyncError};

/// Summary of one detector pass, useful for logging and reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub electrode: String,
    pub epochs_scanned: usize,
    pub artifacts: usize,
}

/// Finds electrode-press artifacts in a single EEG channel.
///
/// The channel is cut into consecutive epochs of `epoch_len` samples. The
/// first epoch only provides the baseline maximum. Every later epoch whose
/// maximum exceeds the previous epoch's maximum by more than `threshold` is
/// reported. The baseline rolls forward after every epoch, flagged or not.
#[derive(Debug, Clone)]
pub struct ArtifactDetector {
    electrode: String,
    epoch_len: usize,
    threshold: f64,
}

impl ArtifactDetector {
    pub fn new(electrode: impl Into<String>, epoch_len: usize, threshold: f64) -> Result<Self> {
        if epoch_len == 0 {
            return Err(SyncError::configuration(
                "artifact epoch must span at least one sample",
            ));
        }
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(SyncError::configuration(format!(
                "artifact threshold must be a finite non-negative number, got {threshold}"
            )));
        }

        Ok(Self {
            electrode: electrode.into(),
            epoch_len,
            threshold,
        })
    }

    /// Builds the detector for the configured artifact electrode.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(
            config.eeg.artifact_electrode.clone(),
            config.epoch_samples(),
            config.eeg.artifact_threshold,
        )
    }

    pub fn electrode(&self) -> &str {
        &self.electrode
    }

    pub fn epoch_len(&self) -> usize {
        self.epoch_len
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Runs the detector over the configured electrode of `record`.
    pub fn detect_in(&self, record: &Record) -> Result<(Vec<Interval>, ArtifactSummary)> {
        let samples = record.channel(&self.electrode)?.samples();
        let artifacts = self.detect(samples);
        let summary = ArtifactSummary {
            electrode: self.electrode.clone(),
            epochs_scanned: samples.len() / self.epoch_len,
            artifacts: artifacts.len(),
        };
        tracing::debug!(?summary, ?artifacts, "artifact scan finished");
        Ok((artifacts, summary))
    }

    /// Returns one interval per flagged epoch, in ascending order. A trailing
    /// partial epoch is never inspected.
    pub fn detect(&self, samples: &[f64]) -> Vec<Interval> {
        let mut epochs = samples.chunks_exact(self.epoch_len);
        let Some(first) = epochs.next() else {
            return Vec::new();
        };

        let mut prev_max = epoch_max(first);
        let mut artifacts = Vec::new();
        for (offset, epoch) in epochs.enumerate() {
            let cur_max = epoch_max(epoch);
            if cur_max - prev_max > self.threshold {
                let start = (offset + 1) * self.epoch_len;
                artifacts.push(Interval::new(start, start + self.epoch_len));
            }
            prev_max = cur_max;
        }

        artifacts
    }
}

/// Maximum ignoring missing samples; `NaN` when the epoch has none.
fn epoch_max(epoch: &[f64]) -> f64 {
    epoch.iter().copied().fold(f64::NAN, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPOCH: usize = 150;
    const THRESHOLD: f64 = 100.0;

    fn build_detector() -> ArtifactDetector {
        ArtifactDetector::new("F3", EPOCH, THRESHOLD).unwrap()
    }

    fn channel_with_offsets(epochs: usize, offsets: &[(usize, f64)]) -> Vec<f64> {
        let mut samples = vec![10.0; epochs * EPOCH];
        for &(epoch, offset) in offsets {
            for sample in &mut samples[epoch * EPOCH..(epoch + 1) * EPOCH] {
                *sample += offset;
            }
        }
        samples
    }

    #[test]
    fn flags_a_jump_just_above_threshold() {
        let samples = channel_with_offsets(8, &[(4, THRESHOLD + 1.0)]);
        let artifacts = build_detector().detect(&samples);
        assert_eq!(artifacts, vec![Interval::new(4 * EPOCH, 5 * EPOCH)]);
    }

    #[test]
    fn threshold_itself_is_not_a_jump() {
        let samples = channel_with_offsets(8, &[(4, THRESHOLD)]);
        assert!(build_detector().detect(&samples).is_empty());
    }

    #[test]
    fn baseline_rolls_forward_after_each_epoch() {
        // Epoch 3 jumps; epoch 4 stays at the raised level and is compared
        // against epoch 3, not against the first baseline.
        let samples = channel_with_offsets(8, &[(3, 150.0), (4, 150.0), (5, 300.0)]);
        let artifacts = build_detector().detect(&samples);
        assert_eq!(
            artifacts,
            vec![
                Interval::new(3 * EPOCH, 4 * EPOCH),
                Interval::new(5 * EPOCH, 6 * EPOCH),
            ]
        );
    }

    #[test]
    fn first_epoch_is_never_flagged() {
        let mut samples = channel_with_offsets(4, &[]);
        samples[0] = 10_000.0;
        assert!(build_detector().detect(&samples).is_empty());
    }

    #[test]
    fn short_or_empty_input_yields_nothing() {
        let detector = build_detector();
        assert!(detector.detect(&[]).is_empty());
        assert!(detector.detect(&[1.0; EPOCH + 20]).is_empty());
    }

    #[test]
    fn trailing_partial_epoch_is_ignored() {
        let mut samples = channel_with_offsets(3, &[]);
        samples.extend(std::iter::repeat(1_000.0).take(EPOCH - 1));
        assert!(build_detector().detect(&samples).is_empty());
    }

    #[test]
    fn missing_samples_do_not_hide_a_jump() {
        let mut samples = channel_with_offsets(4, &[(2, 500.0)]);
        samples[2 * EPOCH] = f64::NAN;
        let artifacts = build_detector().detect(&samples);
        assert_eq!(artifacts, vec![Interval::new(2 * EPOCH, 3 * EPOCH)]);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            ArtifactDetector::new("F3", 0, THRESHOLD),
            Err(SyncError::Configuration(_))
        ));
        assert!(matches!(
            ArtifactDetector::new("F3", EPOCH, f64::NAN),
            Err(SyncError::Configuration(_))
        ));
        assert!(matches!(
            ArtifactDetector::new("F3", EPOCH, -1.0),
            Err(SyncError::Configuration(_))
        ));
    }
}
