//! End-to-end runs of the two beginning protocols.
//!
//! Each stage's error is tagged with the stage name so a failed run says
//! which collaborator broke. Nothing is written until every detection stage
//! has succeeded.

use std::path::Path;

use serde::Serialize;

use crate::{
    io, resample, timeline, ArtifactDetector, ClosedEyesDetector, GazeRenderer, OnsetResolver,
    Record, RecordingSet, RenderSummary, Result, StageExt, StimulusCatalog, SyncConfig, SyncError,
    SyncOutput, SynchronizedRecord, Synchronizer, TrialOnset, WinkDetector,
};

/// Trial onsets chosen for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub eeg: TrialOnset,
    pub eye_tracker: TrialOnset,
}

/// Outcome of an RSVP session.
#[derive(Debug)]
pub struct RsvpOutput {
    pub sync: SyncOutput,
    pub render: RenderSummary,
}

/// Runs the synchronizer with one validated configuration.
#[derive(Debug, Clone)]
pub struct SyncPipeline {
    config: SyncConfig,
}

impl SyncPipeline {
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Electrode-press / closed-eyes protocol on the newest (or identified)
    /// recordings.
    pub fn run_beginning_protocol(&self, identifier: Option<&str>) -> Result<SyncOutput> {
        let paths = &self.config.paths;
        let recordings = RecordingSet::discover(paths, &paths.eeg_dir, identifier)
            .stage("recording discovery")?;
        let (eeg, eye_tracker) = self.load(&recordings)?;

        let alignment = self.align_beginning_protocol(&eeg, &eye_tracker)?;
        self.synchronizer()
            .synchronize(&eeg, &eye_tracker, alignment.eeg, alignment.eye_tracker)
            .stage("synchronized output")
    }

    /// Detects the protocol events in both streams and resolves their onsets.
    pub fn align_beginning_protocol(
        &self,
        eeg: &Record,
        eye_tracker: &Record,
    ) -> Result<Alignment> {
        let (artifacts, summary) = ArtifactDetector::from_config(&self.config)
            .and_then(|detector| detector.detect_in(eeg))
            .stage("EEG artifact detection")?;
        let eeg_onset = OnsetResolver::new(self.config.eeg_window()).last_event(&artifacts);
        tracing::info!(
            electrode = %summary.electrode,
            artifacts = summary.artifacts,
            onset = eeg_onset.index,
            fallback = eeg_onset.is_fallback(),
            "resolved EEG trial onset"
        );

        let closures = ClosedEyesDetector::new(
            self.config.eye_tracker.sync_channel.clone(),
            self.config.eye_tracker.short_blink_samples,
        )
        .detect_in(eye_tracker)
        .stage("closed-eyes detection")?;
        let et_onset = OnsetResolver::new(self.config.et_window()).last_event(&closures);
        tracing::info!(
            closures = closures.len(),
            onset = et_onset.index,
            fallback = et_onset.is_fallback(),
            "resolved eye-tracker trial onset"
        );

        Ok(Alignment {
            eeg: eeg_onset,
            eye_tracker: et_onset,
        })
    }

    /// RSVP session: trigger-based EEG onset, wink-based eye-tracker onset,
    /// then gaze projected onto the stimuli. A failed render removes the
    /// session directory again.
    pub fn run_rsvp(&self, identifier: Option<&str>) -> Result<RsvpOutput> {
        let paths = &self.config.paths;
        let recordings = RecordingSet::discover(paths, &paths.rsvp_eeg_dir, identifier)
            .stage("recording discovery")?;
        let (eeg, eye_tracker) = self.load(&recordings)?;
        let stimuli =
            StimulusCatalog::latest(&paths.stimulus_records_dir, &paths.stimulus_images_dir)
                .stage("stimulus record loading")?;

        let alignment = self.align_rsvp(&eeg, &eye_tracker)?;
        let record =
            SynchronizedRecord::align(&eeg, &eye_tracker, alignment.eeg, alignment.eye_tracker)
                .stage("synchronized output")?;
        self.check_stimulus_count(&record.combined, &stimuli)
            .stage("stimulus record check")?;

        let synchronizer = self.synchronizer();
        let directory = synchronizer
            .persist(&record, chrono::Local::now().naive_local())
            .stage("synchronized output")?;
        let render = match self.render_gaze(&record.combined, &stimuli, &directory) {
            Ok(render) => render,
            Err(err) => {
                synchronizer.discard(&directory);
                return Err(err.in_stage("gaze rendering"));
            }
        };
        Ok(RsvpOutput {
            sync: SyncOutput { record, directory },
            render,
        })
    }

    pub fn align_rsvp(&self, eeg: &Record, eye_tracker: &Record) -> Result<Alignment> {
        let trigger = eeg
            .channel(&self.config.eeg.trigger_channel)
            .stage("EEG trigger lookup")?;
        let eeg_onset = timeline::first_stimulus_onset(trigger.samples());

        let window = self.config.rsvp_window();
        let winks = WinkDetector::new(self.config.rsvp.wink_eye)
            .detect_within(eye_tracker, window)
            .stage("wink detection")?;
        let et_onset = OnsetResolver::new(window).longest_event(&winks);
        tracing::info!(
            eeg_onset = eeg_onset.index,
            winks = winks.len(),
            et_onset = et_onset.index,
            fallback = et_onset.is_fallback(),
            "resolved RSVP trial onsets"
        );

        Ok(Alignment {
            eeg: eeg_onset,
            eye_tracker: et_onset,
        })
    }

    pub fn render_gaze(
        &self,
        combined: &Record,
        stimuli: &StimulusCatalog,
        output_dir: &Path,
    ) -> Result<RenderSummary> {
        GazeRenderer::new(
            self.config.rsvp.geometry.clone(),
            self.config.rsvp.mark.clone(),
            self.config.eeg.trigger_channel.clone(),
            self.config.upsample_factor()?,
        )?
        .render(combined, stimuli, output_dir)
    }

    /// The renderer opens one stimulus at row zero plus one per onset edge
    /// it walks over in `combined`.
    fn check_stimulus_count(&self, combined: &Record, stimuli: &StimulusCatalog) -> Result<()> {
        let trigger = combined.channel(&self.config.eeg.trigger_channel)?.samples();
        let needed = timeline::stimulus_onsets(trigger).len() + 1;
        if needed > stimuli.len() {
            return Err(SyncError::OutOfRange {
                what: "stimulus",
                index: stimuli.len(),
                available: stimuli.len(),
            });
        }
        Ok(())
    }

    fn load(&self, recordings: &RecordingSet) -> Result<(Record, Record)> {
        let eeg = io::read_eeg(&recordings.eeg, &self.config.eeg.electrodes).stage("EEG loading")?;
        let raw_et = io::read_eye_tracker(
            &recordings.eye_tracker,
            &self.config.eye_tracker.timestamp_column,
        )
        .stage("eye-tracker loading")?;
        let rates = &self.config.rates;
        let eye_tracker = resample::upsample(&raw_et, rates.et_hz, rates.eeg_hz)
            .stage("eye-tracker resampling")?;
        tracing::info!(
            heart_rate = %recordings.heart_rate.display(),
            "heart-rate recording accepted but not used for alignment"
        );
        tracing::info!(
            eeg_rows = eeg.len(),
            et_rows = eye_tracker.len(),
            "loaded recordings"
        );
        Ok((eeg, eye_tracker))
    }

    fn synchronizer(&self) -> Synchronizer {
        Synchronizer::new(self.config.paths.output_dir.clone())
    }
}
