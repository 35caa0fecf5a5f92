use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::{PathConfig, Result, SyncError};

/// Most recently modified file in `dir`, optionally limited to an extension
/// and to names containing `identifier`.
pub fn most_recent_file(
    dir: &Path,
    extension: Option<&str>,
    identifier: Option<&str>,
) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(SyncError::not_found(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if extension.is_some_and(|ext| !name.ends_with(ext))
            || identifier.is_some_and(|id| !name.contains(id))
        {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().map_or(true, |(time, _)| modified > *time) {
            newest = Some((modified, path));
        }
    }

    newest.map(|(_, path)| path).ok_or_else(|| {
        let wanted_type = extension.map(|ext| format!("{ext} ")).unwrap_or_default();
        let wanted_name = identifier
            .map(|id| format!("with `{id}` in their name "))
            .unwrap_or_default();
        SyncError::not_found(format!(
            "no {wanted_type}files {wanted_name}in {}",
            dir.display()
        ))
    })
}

/// The three device exports belonging to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSet {
    pub eeg: PathBuf,
    pub eye_tracker: PathBuf,
    pub heart_rate: PathBuf,
}

impl RecordingSet {
    /// Picks the newest CSV export per device. `eeg_dir` overrides the
    /// configured EEG directory (the RSVP sessions keep EEG elsewhere).
    pub fn discover(paths: &PathConfig, eeg_dir: &Path, identifier: Option<&str>) -> Result<Self> {
        let find = |dir: &Path| most_recent_file(dir, Some("csv"), identifier);
        let set = Self {
            eeg: find(eeg_dir)?,
            eye_tracker: find(&paths.et_dir)?,
            heart_rate: find(&paths.hr_dir)?,
        };
        tracing::info!(
            eeg = %set.eeg.display(),
            eye_tracker = %set.eye_tracker.display(),
            heart_rate = %set.heart_rate.display(),
            "found recordings"
        );
        Ok(set)
    }
}
