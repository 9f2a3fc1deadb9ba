use printrack_dsa::{ConsensusBuffer, ConsensusPair, LayoutError, Orientation};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::format::FormatTag;
use crate::store::{ConsensusStore, PrintCorpus};

const FORWARD_EXT: &str = "learn1";
const REVERSE_EXT: &str = "learn2";
const PRINT_EXT: &str = "print";

/// Directory-backed store.
///
/// ```text
/// <learns>/<format>.learn1   forward consensus
/// <learns>/<format>.learn2   reverse consensus
/// <prints>/<format>.print    fingerprint file
/// ```
///
/// Every file is replaced through a temporary sibling and a rename. Both
/// halves of a pair are written and synced before either is renamed, and
/// the halves carry a shared sample count, so a pair interrupted between
/// the two renames loads as incomplete instead of as a mixed pair.
#[derive(Debug, Clone)]
pub struct DirStore {
    learns: PathBuf,
    prints: PathBuf,
}

impl DirStore {
    pub fn new(learns: impl Into<PathBuf>, prints: impl Into<PathBuf>) -> Self {
        Self {
            learns: learns.into(),
            prints: prints.into(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.learns_path(), config.prints_path())
    }

    pub fn learns_dir(&self) -> &Path {
        &self.learns
    }

    pub fn prints_dir(&self) -> &Path {
        &self.prints
    }

    fn learn_path(&self, format: &FormatTag, orientation: Orientation) -> PathBuf {
        let ext = match orientation {
            Orientation::Forward => FORWARD_EXT,
            Orientation::Reverse => REVERSE_EXT,
        };
        self.learns.join(format!("{}.{}", format, ext))
    }

    fn print_path(&self, format: &FormatTag) -> PathBuf {
        self.prints.join(format!("{}.{}", format, PRINT_EXT))
    }

    fn load_buffer(&self, format: &FormatTag, orientation: Orientation) -> Result<Option<ConsensusBuffer>> {
        let Some(raw) = read_optional(&self.learn_path(format, orientation))? else {
            return Ok(None);
        };
        let corrupt = |reason| TrackerError::CorruptConsensus {
            format: format.to_string(),
            reason,
        };
        let buffer = ConsensusBuffer::from_bytes(&raw).map_err(corrupt)?;
        if buffer.orientation() != orientation {
            return Err(corrupt(LayoutError::BadOrientation(buffer.orientation().tag())));
        }
        Ok(Some(buffer))
    }
}

impl ConsensusStore for DirStore {
    fn load_pair(&self, format: &FormatTag) -> Result<Option<ConsensusPair>> {
        let forward = self.load_buffer(format, Orientation::Forward)?;
        let reverse = self.load_buffer(format, Orientation::Reverse)?;
        match (forward, reverse) {
            (Some(forward), Some(reverse)) => {
                let pair = ConsensusPair { forward, reverse };
                if pair.samples().is_none() {
                    tracing::warn!(
                        "DirStore: halves of {} disagree ({} vs {} samples), reseeding",
                        format,
                        pair.forward.samples(),
                        pair.reverse.samples()
                    );
                    return Ok(None);
                }
                Ok(Some(pair))
            }
            (None, None) => Ok(None),
            _ => {
                // A lone half cannot be trusted; the next sample reseeds both.
                tracing::warn!("DirStore: incomplete consensus pair for {}, reseeding", format);
                Ok(None)
            }
        }
    }

    fn save_pair(&mut self, format: &FormatTag, pair: &ConsensusPair) -> Result<()> {
        fs::create_dir_all(&self.learns)?;
        let forward = pair.forward.to_vec();
        let reverse = pair.reverse.to_vec();
        let staged_forward = stage_file(&self.learns, &forward)?;
        let staged_reverse = stage_file(&self.learns, &reverse)?;
        staged_forward
            .persist(self.learn_path(format, Orientation::Forward))
            .map_err(|e| e.error)?;
        staged_reverse
            .persist(self.learn_path(format, Orientation::Reverse))
            .map_err(|e| e.error)?;
        tracing::debug!(
            "DirStore: saved {} ({} + {} bytes)",
            format,
            forward.len(),
            reverse.len()
        );
        Ok(())
    }
}

impl PrintCorpus for DirStore {
    fn formats(&self) -> Result<Vec<FormatTag>> {
        let entries = match fs::read_dir(&self.prints) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TrackerError::NotLearned(format!(
                    "fingerprint corpus {}",
                    self.prints.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut formats = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(PRINT_EXT) {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            match FormatTag::new(stem) {
                Ok(tag) => formats.push(tag),
                Err(_) => tracing::warn!("DirStore: skipping unusable print file {}", path.display()),
            }
        }
        formats.sort();
        Ok(formats)
    }

    fn read_print(&self, format: &FormatTag) -> Result<Option<Vec<u8>>> {
        read_optional(&self.print_path(format))
    }

    fn write_print(&mut self, format: &FormatTag, print: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.prints)?;
        replace_file(&self.prints, &self.print_path(format), print)
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Writes `bytes` to a synced temporary file in `dir`, ready to be renamed.
fn stage_file(dir: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn replace_file(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    stage_file(dir, bytes)?.persist(target).map_err(|e| e.error)?;
    Ok(())
}
