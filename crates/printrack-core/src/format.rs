use std::fmt;
use std::path::Path;

use crate::error::{Result, TrackerError};

/// Name of a learned format, normally a file extension without the dot.
///
/// Tags double as file stems in the directory store, so they may not be
/// empty and may not contain path separators.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FormatTag(String);

impl FormatTag {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        if tag.is_empty() || tag == "." || tag == ".." || tag.contains(['/', '\\', '\0']) {
            return Err(TrackerError::NoExtension(tag));
        }
        Ok(Self(tag))
    }

    /// Derives the tag from the text after the last '.' of the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .ok_or_else(|| TrackerError::NoExtension(path.display().to_string()))
            .and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FormatTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
