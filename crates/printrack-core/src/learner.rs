use printrack_dsa::{ConsensusPair, LengthPolicy};
use std::io::Read;

use crate::config::TrackerConfig;
use crate::error::Result;
use crate::format::FormatTag;
use crate::store::ConsensusStore;

/// Folds samples of a known format into that format's stored consensus.
///
/// ## Read-then-commit
/// A sample is read to the end before the stored pair is loaded, so an I/O
/// failure midway through a sample leaves the store untouched. The store
/// only sees the finished pair.
#[derive(Debug, Clone, Copy)]
pub struct Learner {
    policy: LengthPolicy,
}

/// What a single learn call did to a format's consensus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnReport {
    pub format: FormatTag,
    /// `true` when this sample created the consensus.
    pub seeded: bool,
    pub sample_len: usize,
    /// Samples the consensus has learned, this one included.
    pub samples: u64,
    pub cells: usize,
    pub wildcards_forward: usize,
    pub wildcards_reverse: usize,
    /// Cells (both orientations) that became wildcards in this call.
    pub newly_wildcarded: usize,
}

impl Learner {
    pub fn new(policy: LengthPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.length_policy)
    }

    pub fn policy(&self) -> LengthPolicy {
        self.policy
    }

    pub fn learn<S, R>(&self, store: &mut S, format: &FormatTag, mut sample: R) -> Result<LearnReport>
    where
        S: ConsensusStore + ?Sized,
        R: Read,
    {
        let mut bytes = Vec::new();
        sample.read_to_end(&mut bytes)?;
        self.learn_bytes(store, format, &bytes)
    }

    pub fn learn_bytes<S>(&self, store: &mut S, format: &FormatTag, sample: &[u8]) -> Result<LearnReport>
    where
        S: ConsensusStore + ?Sized,
    {
        let (pair, seeded, newly_wildcarded) = match store.load_pair(format)? {
            None => (ConsensusPair::seed(sample), true, 0),
            Some(mut pair) => {
                let stats = pair.intersect(sample, self.policy);
                (pair, false, stats.wildcarded())
            }
        };
        store.save_pair(format, &pair)?;

        let report = LearnReport {
            format: format.clone(),
            seeded,
            sample_len: sample.len(),
            samples: pair.forward.samples(),
            cells: pair.forward.len(),
            wildcards_forward: pair.forward.wildcard_count(),
            wildcards_reverse: pair.reverse.wildcard_count(),
            newly_wildcarded,
        };
        if seeded {
            tracing::info!("Learner: seeded {} from a {}-byte sample", format, sample.len());
        } else {
            tracing::info!(
                "Learner: {} now {} cells, {} new wildcards ({} forward / {} reverse total)",
                format,
                report.cells,
                newly_wildcarded,
                report.wildcards_forward,
                report.wildcards_reverse
            );
        }
        Ok(report)
    }

    /// Learns several samples of one format in order, stopping at the first
    /// failure. Samples learned before the failure stay committed.
    pub fn learn_all<S, I, R>(&self, store: &mut S, format: &FormatTag, samples: I) -> Result<Vec<LearnReport>>
    where
        S: ConsensusStore + ?Sized,
        I: IntoIterator<Item = R>,
        R: Read,
    {
        samples
            .into_iter()
            .map(|sample| self.learn(&mut *store, format, sample))
            .collect()
    }
}

impl Default for Learner {
    fn default() -> Self {
        Self::new(LengthPolicy::default())
    }
}
