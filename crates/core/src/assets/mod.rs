use std::path::{Path, PathBuf};

use crate::{discovery, Result, SyncError};

/// Ordered stimulus images of one RSVP session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StimulusCatalog {
    paths: Vec<PathBuf>,
}

impl StimulusCatalog {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Parses a session record: one stimulus per line, the image file name
    /// first and the target type after a space. Blank lines are ignored.
    pub fn parse(records: &str, images_dir: &Path) -> Self {
        let paths = records
            .lines()
            .filter_map(|line| line.split(' ').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| images_dir.join(name))
            .collect();
        Self { paths }
    }

    pub fn from_record_file(record_file: &Path, images_dir: &Path) -> Result<Self> {
        if !record_file.is_file() {
            return Err(SyncError::not_found(format!(
                "stimulus record {}",
                record_file.display()
            )));
        }
        let records = std::fs::read_to_string(record_file)?;
        Ok(Self::parse(&records, images_dir))
    }

    /// Loads the most recent record in `records_dir`.
    pub fn latest(records_dir: &Path, images_dir: &Path) -> Result<Self> {
        let record_file = discovery::most_recent_file(records_dir, None, None)?;
        let catalog = Self::from_record_file(&record_file, images_dir)?;
        tracing::info!(
            record = %record_file.display(),
            stimuli = catalog.len(),
            "loaded stimulus record"
        );
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Path of the stimulus shown `order`-th. Running past the list means
    /// the record and the trigger channel disagree, which is fatal.
    pub fn get(&self, order: usize) -> Result<&Path> {
        self.paths
            .get(order)
            .map(PathBuf::as_path)
            .ok_or(SyncError::OutOfRange {
                what: "stimulus",
                index: order,
                available: self.paths.len(),
            })
    }

    /// File name for the annotated copy of the `order`-th stimulus.
    pub fn annotated_name(&self, order: usize) -> Result<String> {
        let path = self.get(order)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("{order}_{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_token_of_each_line() {
        let catalog = StimulusCatalog::parse(
            "lemon_03.jpg target\nlemon_11.jpg distractor\n\nlemon_07.png target\n",
            Path::new("/stim"),
        );
        assert_eq!(
            catalog.paths(),
            &[
                PathBuf::from("/stim/lemon_03.jpg"),
                PathBuf::from("/stim/lemon_11.jpg"),
                PathBuf::from("/stim/lemon_07.png"),
            ]
        );
        assert_eq!(catalog.annotated_name(1).unwrap(), "1_lemon_11.jpg");
    }

    #[test]
    fn running_past_the_list_is_out_of_range() {
        let catalog = StimulusCatalog::parse("a.png x\n", Path::new("stim"));
        let err = catalog.get(1).unwrap_err();
        assert!(matches!(
            err,
            SyncError::OutOfRange {
                index: 1,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn loads_the_latest_record() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.txt"), "b.png target\n").unwrap();

        let catalog = StimulusCatalog::latest(dir.path(), Path::new("images")).unwrap();
        assert_eq!(catalog.paths(), &[PathBuf::from("images/b.png")]);

        assert!(matches!(
            StimulusCatalog::from_record_file(&dir.path().join("none.txt"), Path::new("images")),
            Err(SyncError::NotFound(_))
        ));
    }
}
