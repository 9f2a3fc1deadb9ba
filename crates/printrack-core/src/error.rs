use std::io;
use std::path::{Path, PathBuf};

use printrack_dsa::LayoutError;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("no format tag can be derived from {0:?} (expected a '.' extension)")]
    NoExtension(String),
    #[error("nothing learned for {0}")]
    NotLearned(String),
    #[error("the fingerprint corpus is empty")]
    EmptyCorpus,
    #[error("corrupt consensus buffer for {format}: {reason}")]
    CorruptConsensus { format: String, reason: LayoutError },
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TrackerError {
    /// Maps a failure to open `path` onto `NotFound` when the file is missing.
    pub fn on_open(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            TrackerError::NotFound(path.to_path_buf())
        } else {
            TrackerError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
