//! # printrack
//!
//! Learns positional byte fingerprints ("prints") of file formats from
//! labelled samples and ranks the likely formats of an unlabelled file.
//!
//! The pipeline has three stages, one crate each:
//! - learning folds samples into a per-format consensus (`printrack-core`,
//!   on top of the buffers in `printrack-dsa`),
//! - compiling turns a consensus into a print (`printrack-codec`),
//! - identifying scores a file against every print (`printrack-scan`).
//!
//! [`Tracker`] wires the three stages to one store.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub use printrack_codec::{CompiledPrint, PatternRecord};
pub use printrack_core::{
    ConsensusStore, DirStore, FormatTag, LearnReport, Learner, MemoryStore, PrintCorpus, Result,
    TrackerConfig, TrackerError,
};
pub use printrack_dsa::{ConsensusBuffer, ConsensusPair, LengthPolicy, Orientation};
pub use printrack_scan::{Candidate, FileCandidate, Guess, Matcher, RankedAnswer, Ranking};

/// Learn, compile and identify against a single store.
#[derive(Debug)]
pub struct Tracker<S> {
    store: S,
    learner: Learner,
    matcher: Matcher,
}

impl Tracker<DirStore> {
    /// A tracker over the learn and print directories named by `config`.
    pub fn open(config: &TrackerConfig) -> Self {
        Self::new(DirStore::from_config(config), config)
    }
}

impl<S> Tracker<S>
where
    S: ConsensusStore + PrintCorpus,
{
    pub fn new(store: S, config: &TrackerConfig) -> Self {
        Self::with_parts(store, Learner::from_config(config), Matcher::from_config(config))
    }

    pub fn with_parts(store: S, learner: Learner, matcher: Matcher) -> Self {
        Self {
            store,
            learner,
            matcher,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Learns `path` as `format`, or as its own extension when `format` is
    /// `None`. A missing file is reported before a missing extension.
    pub fn learn_file(&mut self, path: &Path, format: Option<&FormatTag>) -> Result<LearnReport> {
        let file = File::open(path).map_err(|e| TrackerError::on_open(path, e))?;
        let format = match format {
            Some(format) => format.clone(),
            None => FormatTag::from_path(path)?,
        };
        self.learner.learn(&mut self.store, &format, BufReader::new(file))
    }

    pub fn learn_bytes(&mut self, format: &FormatTag, sample: &[u8]) -> Result<LearnReport> {
        self.learner.learn_bytes(&mut self.store, format, sample)
    }

    pub fn compile(&mut self, format: &FormatTag) -> Result<CompiledPrint> {
        printrack_codec::compile(&mut self.store, format)
    }

    pub fn identify_file(&self, path: &Path) -> Result<Ranking> {
        let candidate = FileCandidate::open(path)?;
        self.matcher.identify(&candidate, &self.store)
    }

    pub fn identify_bytes(&self, candidate: &[u8]) -> Result<Ranking> {
        self.matcher.identify(candidate, &self.store)
    }

    /// Formats that currently have a compiled print.
    pub fn formats(&self) -> Result<Vec<FormatTag>> {
        self.store.formats()
    }
}
