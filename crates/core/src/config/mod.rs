use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{resample, Eye, Result, ScreenGeometry, SyncError};

/// Top-level configuration structure for the synchronizer.
///
/// Every section falls back to its defaults, so a JSON file only needs the
/// fields that differ from the lab setup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub rates: RateConfig,
    pub eeg: EegConfig,
    pub eye_tracker: EyeTrackerConfig,
    pub rsvp: RsvpConfig,
    pub paths: PathConfig,
}

impl SyncConfig {
    /// Reads a JSON configuration file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SyncError::not_found(format!(
                "configuration file {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.upsample_factor()?;
        if self.epoch_samples() == 0 {
            return Err(SyncError::configuration(format!(
                "artifact epoch of {} s is shorter than one sample at {} Hz",
                self.eeg.artifact_epoch_seconds, self.rates.eeg_hz
            )));
        }
        if !self.eeg.artifact_threshold.is_finite() || self.eeg.artifact_threshold < 0.0 {
            return Err(SyncError::configuration(
                "artifact threshold must be a finite non-negative number",
            ));
        }
        for (name, seconds) in [
            ("eeg.beginning_seconds", self.eeg.beginning_seconds),
            ("eye_tracker.beginning_seconds", self.eye_tracker.beginning_seconds),
            ("rsvp.beginning_seconds", self.rsvp.beginning_seconds),
        ] {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(SyncError::configuration(format!(
                    "{name} must be positive, got {seconds}"
                )));
            }
        }
        for required in [&self.eeg.artifact_electrode, &self.eeg.trigger_channel] {
            if !self.eeg.electrodes.contains(required) {
                return Err(SyncError::configuration(format!(
                    "channel `{required}` is not among the configured EEG electrodes"
                )));
            }
        }
        if !(self.rsvp.mark.radius > 0.0) {
            return Err(SyncError::configuration("gaze mark radius must be positive"));
        }
        self.rsvp.geometry.validate()
    }

    /// Number of rows each eye-tracker sample is repeated to reach the EEG rate.
    pub fn upsample_factor(&self) -> Result<usize> {
        resample::upsample_factor(self.rates.et_hz, self.rates.eeg_hz)
    }

    pub fn epoch_samples(&self) -> usize {
        self.seconds_to_samples(self.eeg.artifact_epoch_seconds)
    }

    /// Beginning-protocol window of the EEG stream, in EEG samples.
    pub fn eeg_window(&self) -> usize {
        self.seconds_to_samples(self.eeg.beginning_seconds)
    }

    /// Beginning-protocol window of the resampled eye-tracker stream.
    pub fn et_window(&self) -> usize {
        self.seconds_to_samples(self.eye_tracker.beginning_seconds)
    }

    /// Beginning-protocol window of the RSVP wink protocol.
    pub fn rsvp_window(&self) -> usize {
        self.seconds_to_samples(self.rsvp.beginning_seconds)
    }

    /// Durations are measured at the EEG rate; the eye-tracker stream is
    /// resampled to it before any detection runs.
    fn seconds_to_samples(&self, seconds: f64) -> usize {
        (seconds * f64::from(self.rates.eeg_hz)).round().max(0.0) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    pub eeg_hz: u32,
    pub et_hz: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            eeg_hz: 300,
            et_hz: 60,
        }
    }
}

/// EEG layout and the electrode-press protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EegConfig {
    /// Column names, in file order.
    pub electrodes: Vec<String>,
    pub artifact_electrode: String,
    pub trigger_channel: String,
    pub artifact_epoch_seconds: f64,
    pub artifact_threshold: f64,
    pub beginning_seconds: f64,
}

impl Default for EegConfig {
    fn default() -> Self {
        Self {
            electrodes: ["F3", "F4", "C3", "C4", "Pz", "P3", "P4", "TRG"]
                .into_iter()
                .map(String::from)
                .collect(),
            artifact_electrode: "F3".to_string(),
            trigger_channel: "TRG".to_string(),
            artifact_epoch_seconds: 0.5,
            artifact_threshold: 100.0,
            beginning_seconds: 12.0,
        }
    }
}

/// Eye-tracker layout and the closed-eyes protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeTrackerConfig {
    /// Raw device timestamp column, dropped on load.
    pub timestamp_column: String,
    pub sync_channel: String,
    pub beginning_seconds: f64,
    /// Closures up to this many resampled samples count as natural blinks.
    pub short_blink_samples: usize,
}

impl Default for EyeTrackerConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "time_ms".to_string(),
            sync_channel: crate::gaze::LEFT_X.to_string(),
            beginning_seconds: 20.0,
            short_blink_samples: 10,
        }
    }
}

/// Rapid visual presentation variant: wink protocol and gaze rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsvpConfig {
    pub beginning_seconds: f64,
    pub wink_eye: Eye,
    pub geometry: ScreenGeometry,
    pub mark: GazeMark,
}

impl Default for RsvpConfig {
    fn default() -> Self {
        Self {
            beginning_seconds: 25.0,
            wink_eye: Eye::Left,
            geometry: ScreenGeometry::default(),
            mark: GazeMark::default(),
        }
    }
}

/// Marker drawn at each accepted gaze sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeMark {
    pub radius: f32,
    pub color: [u8; 3],
}

impl Default for GazeMark {
    fn default() -> Self {
        Self {
            radius: 3.0,
            color: [255, 0, 0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub eeg_dir: PathBuf,
    pub et_dir: PathBuf,
    pub hr_dir: PathBuf,
    pub output_dir: PathBuf,
    pub rsvp_eeg_dir: PathBuf,
    /// Lists of the stimuli shown in each RSVP session.
    pub stimulus_records_dir: PathBuf,
    pub stimulus_images_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            eeg_dir: PathBuf::from("data/EEG_output"),
            et_dir: PathBuf::from("data/ET_output"),
            hr_dir: PathBuf::from("data/HR_output"),
            output_dir: PathBuf::from("data/synchronized_data"),
            rsvp_eeg_dir: PathBuf::from("data/rsvp/EEG"),
            stimulus_records_dir: PathBuf::from("data/rsvp/outputLists"),
            stimulus_images_dir: PathBuf::from("data/rsvp/stim"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_lab_setup() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upsample_factor().unwrap(), 5);
        assert_eq!(config.epoch_samples(), 150);
        assert_eq!(config.eeg_window(), 3600);
        assert_eq!(config.et_window(), 6000);
        assert_eq!(config.rsvp_window(), 7500);
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let json = r#"{ "rates": { "et_hz": 100 }, "eeg": { "artifact_threshold": 80 } }"#;
        let config: SyncConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.rates.eeg_hz, 300);
        assert_eq!(config.upsample_factor().unwrap(), 3);
        assert_eq!(config.eeg.artifact_threshold, 80.0);
        assert_eq!(config.eeg.artifact_electrode, "F3");
        assert_eq!(config.rsvp.wink_eye, Eye::Left);
    }

    #[test]
    fn rejects_mismatched_rates() {
        let mut config = SyncConfig::default();
        config.rates.et_hz = 120;
        assert!(matches!(
            config.validate(),
            Err(SyncError::Configuration(_))
        ));
    }

    #[test]
    fn rejects_unknown_artifact_electrode() {
        let mut config = SyncConfig::default();
        config.eeg.artifact_electrode = "Cz".to_string();
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("Cz"));
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biosync.json");
        let mut config = SyncConfig::default();
        config.rsvp.wink_eye = Eye::Right;
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(SyncConfig::from_json_file(&path).unwrap(), config);
        assert!(matches!(
            SyncConfig::from_json_file(&dir.path().join("missing.json")),
            Err(SyncError::NotFound(_))
        ));
    }
}
