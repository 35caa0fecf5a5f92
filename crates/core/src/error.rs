/// Result alias that carries the custom [`SyncError`] type.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Common error type for the core crate.
///
/// Every variant aborts the run. A half-aligned recording is worse than no
/// output, so nothing in the pipeline recovers locally.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Rate mismatch or an invalid detector parameter.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A required input file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// An ordered list ran out before the events referencing it did.
    #[error("{what} index {index} is out of range ({available} available)")]
    OutOfRange {
        what: &'static str,
        index: usize,
        available: usize,
    },
    /// Structurally invalid data (column counts, ragged channels, collisions).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("channel `{0}` is missing from the record")]
    MissingChannel(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// Names the pipeline stage an underlying error surfaced from.
    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Wraps the error with the name of the stage it came from.
    pub fn in_stage(self, stage: &'static str) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through stage wrappers.
    pub fn root(&self) -> &SyncError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attaches a stage name to the error side of a [`Result`].
pub trait StageExt<T> {
    fn stage(self, stage: &'static str) -> Result<T>;
}

impl<T, E> StageExt<T> for std::result::Result<T, E>
where
    E: Into<SyncError>,
{
    fn stage(self, stage: &'static str) -> Result<T> {
        self.map_err(|err| err.into().in_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_wrapper_names_the_failing_stage() {
        let result: Result<()> = Err(SyncError::not_found("no csv files in eeg"));
        let err = result.stage("recording discovery").unwrap_err();

        let message = format!("{err}");
        assert!(message.starts_with("recording discovery failed"));
        assert!(message.contains("no csv files in eeg"));
        assert!(matches!(err.root(), SyncError::NotFound(_)));
    }

    #[test]
    fn out_of_range_reports_counts() {
        let err = SyncError::OutOfRange {
            what: "stimulus",
            index: 3,
            available: 3,
        };
        assert_eq!(
            format!("{err}"),
            "stimulus index 3 is out of range (3 available)"
        );
    }
}
