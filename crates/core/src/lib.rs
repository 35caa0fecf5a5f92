//! Core library for the biosync recording synchronizer.
//!
//! EEG, eye-tracker and heart-rate devices start recording at different
//! times. Every session opens with a beginning protocol (electrode presses,
//! eye closures or a long wink) that leaves a signature in each stream. The
//! modules here detect those signatures, pick the sample at which the real
//! trial starts in every stream, and cut the streams into one row-aligned
//! record. Each module owns one stage of that pipeline.

pub mod artifact;
pub mod assets;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gaze;
pub mod io;
pub mod mapping;
pub mod onset;
pub mod pipeline;
pub mod render;
pub mod resample;
pub mod series;
pub mod sync;
pub mod timeline;

pub use artifact::{ArtifactDetector, ArtifactSummary};
pub use assets::StimulusCatalog;
pub use config::{
    EegConfig, EyeTrackerConfig, GazeMark, PathConfig, RateConfig, RsvpConfig, SyncConfig,
};
pub use discovery::RecordingSet;
pub use error::{Result, StageExt, SyncError};
pub use gaze::{ClosedEyesDetector, Eye, WinkDetector};
pub use mapping::{ScreenGeometry, ScreenPoint};
pub use onset::{OnsetResolver, OnsetSource, TrialOnset};
pub use pipeline::{Alignment, RsvpOutput, SyncPipeline};
pub use render::{Canvas, GazeRenderer, RenderSummary};
pub use series::{ChannelSeries, Interval, Record, SampleIndex};
pub use sync::{SyncOutput, SynchronizedRecord, Synchronizer};
pub use timeline::TriggerEdge;
