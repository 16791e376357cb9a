use std::path::PathBuf;
use thiserror::Error;

/// Reasons a recording could not be turned into a [`crate::signal::Waveform`].
///
/// Each variant names the file so a caller juggling several recordings can
/// report which one failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported waveform format for {}: {detail}", .path.display())]
    UnsupportedFormat { path: PathBuf, detail: String },
    #[error("malformed data in {}: {reason}", .path.display())]
    MalformedData { path: PathBuf, reason: String },
}

impl LoadError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::MalformedData {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable tag for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "io_failure",
            LoadError::UnsupportedFormat { .. } => "unsupported_format",
            LoadError::MalformedData { .. } => "malformed_data",
        }
    }
}
