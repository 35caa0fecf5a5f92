use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::{io, Record, Result, SyncError, TrialOnset};

pub const EEG_FILE: &str = "trial_eeg.csv";
pub const ET_FILE: &str = "trial_et.csv";
pub const COMBINED_FILE: &str = "all_trial_data_combined.csv";

/// Post-onset data of both streams plus their row-aligned combination.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizedRecord {
    pub eeg: Record,
    pub eye_tracker: Record,
    pub combined: Record,
}

impl SynchronizedRecord {
    /// Cuts each stream at its own onset and pairs the remaining rows by
    /// index. Alignment is onset-to-onset only; the clocks are not matched.
    pub fn align(
        eeg: &Record,
        eye_tracker: &Record,
        eeg_onset: TrialOnset,
        et_onset: TrialOnset,
    ) -> Result<Self> {
        let eeg = eeg.tail_from(eeg_onset.index);
        let eye_tracker = eye_tracker.tail_from(et_onset.index);
        let combined = eeg.concat_columns(&eye_tracker)?;
        if eeg.len() != eye_tracker.len() {
            tracing::debug!(
                eeg_rows = eeg.len(),
                et_rows = eye_tracker.len(),
                "streams end at different rows; combined record keeps the shorter"
            );
        }
        Ok(Self {
            eeg,
            eye_tracker,
            combined,
        })
    }
}

/// Result of a persisted synchronization.
#[derive(Debug, Clone)]
pub struct SyncOutput {
    pub record: SynchronizedRecord,
    pub directory: PathBuf,
}

/// Writes synchronized sessions under a fixed output root.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    output_root: PathBuf,
}

impl Synchronizer {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Aligns both streams and persists the three tables in a new directory
    /// named after the current local time.
    pub fn synchronize(
        &self,
        eeg: &Record,
        eye_tracker: &Record,
        eeg_onset: TrialOnset,
        et_onset: TrialOnset,
    ) -> Result<SyncOutput> {
        let record = SynchronizedRecord::align(eeg, eye_tracker, eeg_onset, et_onset)?;
        let directory = self.persist(&record, chrono::Local::now().naive_local())?;
        Ok(SyncOutput { record, directory })
    }

    /// Writes the tables into a fresh directory for `timestamp`. If anything
    /// fails, the directory is removed again so no partial session remains.
    pub fn persist(
        &self,
        record: &SynchronizedRecord,
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_root)?;
        let directory = self.fresh_directory(timestamp)?;

        let written = [
            (EEG_FILE, &record.eeg),
            (ET_FILE, &record.eye_tracker),
            (COMBINED_FILE, &record.combined),
        ]
        .into_iter()
        .try_for_each(|(name, table)| io::write_table(&directory.join(name), table));

        if let Err(err) = written {
            self.discard(&directory);
            return Err(err);
        }

        tracing::info!(
            directory = %directory.display(),
            rows = record.combined.len(),
            "synchronized data saved"
        );
        Ok(directory)
    }

    /// Removes a session directory whose run failed after it was written.
    pub fn discard(&self, directory: &Path) {
        match std::fs::remove_dir_all(directory) {
            Ok(()) => tracing::info!(
                directory = %directory.display(),
                "removed output of the failed run"
            ),
            Err(cleanup) => tracing::warn!(
                directory = %directory.display(),
                %cleanup,
                "could not remove partially written output"
            ),
        }
    }

    /// `DDMMYYYY_HHMM`, with `_N` appended when that minute is taken.
    fn fresh_directory(&self, timestamp: NaiveDateTime) -> Result<PathBuf> {
        let stem = timestamp.format("%d%m%Y_%H%M").to_string();
        for attempt in 0..1000 {
            let name = match attempt {
                0 => stem.clone(),
                n => format!("{stem}_{n}"),
            };
            let candidate = self.output_root.join(name);
            match std::fs::create_dir(&candidate) {
                Ok(()) => return Ok(candidate),
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(SyncError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free output directory for {stem} in {}", self.output_root.display()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{ChannelSeries, OnsetSource};

    fn onset(index: usize) -> TrialOnset {
        TrialOnset {
            index,
            source: OnsetSource::WindowFallback,
        }
    }

    fn ramp(names: &[&str], len: usize) -> Record {
        Record::from_channels(
            names
                .iter()
                .map(|name| ChannelSeries::new(*name, (0..len).map(|i| i as f64).collect()))
                .collect(),
        )
        .unwrap()
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    #[test]
    fn combined_rows_follow_the_shorter_tail() {
        let eeg = ramp(&["F3", "TRG"], 100);
        let et = ramp(&["left_x", "right_x"], 90);

        let synced = SynchronizedRecord::align(&eeg, &et, onset(30), onset(5)).unwrap();
        assert_eq!(synced.eeg.len(), 70);
        assert_eq!(synced.eye_tracker.len(), 85);
        assert_eq!(synced.combined.len(), 70.min(85));
        assert_eq!(
            synced.combined.channel_names().collect::<Vec<_>>(),
            vec!["F3", "TRG", "left_x", "right_x"]
        );
        assert_eq!(synced.combined.channel("F3").unwrap().samples()[0], 30.0);
        assert_eq!(synced.combined.channel("left_x").unwrap().samples()[0], 5.0);
    }

    #[test]
    fn persists_three_tables_in_a_fresh_directory() {
        let root = tempfile::tempdir().unwrap();
        let synchronizer = Synchronizer::new(root.path().join("synchronized"));
        let record = SynchronizedRecord::align(
            &ramp(&["F3"], 10),
            &ramp(&["left_x"], 10),
            onset(2),
            onset(4),
        )
        .unwrap();

        let first = synchronizer.persist(&record, timestamp()).unwrap();
        assert!(first.ends_with("07032024_1405"));
        for name in [EEG_FILE, ET_FILE, COMBINED_FILE] {
            assert!(first.join(name).is_file(), "{name} missing");
        }
        let combined = std::fs::read_to_string(first.join(COMBINED_FILE)).unwrap();
        assert!(combined.starts_with("sample,F3,left_x\n0,2,4\n"));

        let second = synchronizer.persist(&record, timestamp()).unwrap();
        assert!(second.ends_with("07032024_1405_1"));

        synchronizer.discard(&first);
        assert!(!first.exists());
        assert!(second.is_dir());
    }

    #[test]
    fn unwritable_root_is_an_io_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let record =
            SynchronizedRecord::align(&ramp(&["F3"], 3), &ramp(&["left_x"], 3), onset(0), onset(0))
                .unwrap();
        let err = Synchronizer::new(&blocker)
            .persist(&record, timestamp())
            .unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }
}
