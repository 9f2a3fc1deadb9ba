use crate::consensus::{ConsensusBuffer, Intersection, LengthPolicy, Orientation};

/// The forward and reverse consensus of one format.
///
/// Both halves are always seeded from, and intersected with, the same
/// samples; they only differ in which end of the file they are anchored to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusPair {
    pub forward: ConsensusBuffer,
    pub reverse: ConsensusBuffer,
}

/// Per-orientation outcome of folding one sample into a pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PairIntersection {
    pub forward: Intersection,
    pub reverse: Intersection,
}

impl PairIntersection {
    pub fn wildcarded(&self) -> usize {
        self.forward.wildcarded + self.reverse.wildcarded
    }
}

impl ConsensusPair {
    /// A lone sample teaches every byte until a later sample contradicts it.
    pub fn seed(sample: &[u8]) -> Self {
        Self {
            forward: ConsensusBuffer::seed(sample, Orientation::Forward),
            reverse: ConsensusBuffer::seed(sample, Orientation::Reverse),
        }
    }

    pub fn intersect(&mut self, sample: &[u8], policy: LengthPolicy) -> PairIntersection {
        PairIntersection {
            forward: self.forward.intersect(sample, policy),
            reverse: self.reverse.intersect(sample, policy),
        }
    }

    /// Samples learned by the pair, or `None` when the halves disagree,
    /// which means they were not written by the same learn call.
    pub fn samples(&self) -> Option<u64> {
        (self.forward.samples() == self.reverse.samples()).then(|| self.forward.samples())
    }

    pub fn wildcard_count(&self) -> usize {
        self.forward.wildcard_count() + self.reverse.wildcard_count()
    }
}
