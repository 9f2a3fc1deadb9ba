use alloc::vec::Vec;
use core::fmt;

const WORD_BITS: usize = 64;

/// Which end of a sample a buffer (or a print record) is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Offsets count from the first byte of the file.
    Forward,
    /// Offsets count from the last byte of the file.
    Reverse,
}

impl Orientation {
    /// Single-byte tag shared by the print wire format and the persisted layout.
    pub const fn tag(self) -> u8 {
        match self {
            Orientation::Forward => b'd',
            Orientation::Reverse => b'i',
        }
    }

    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'd' => Some(Orientation::Forward),
            b'i' => Some(Orientation::Reverse),
            _ => None,
        }
    }
}

/// What happens to cells that only some samples reach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LengthPolicy {
    /// Cells past the end of a shorter sample become wildcards, and a longer
    /// sample extends the buffer with wildcard cells. The buffer is as long
    /// as the longest sample and learning order does not matter.
    #[default]
    Wildcard,
    /// Cells past the end of the sample are left untouched and the buffer
    /// never grows.
    Retain,
}

/// Outcome of folding one sample into one buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intersection {
    /// Known cells that were compared against the sample.
    pub compared: usize,
    /// Cells that are wildcards now and were not before, appended cells
    /// included.
    pub wildcarded: usize,
    /// Wildcard cells appended for a longer sample (`Wildcard` only).
    pub extended: usize,
}

/// A maximal run of known cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub start: usize,
    pub len: usize,
}

impl Run {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Positional byte consensus for one orientation of one format.
///
/// ## Layout
/// Cell values live in a dense byte vector and knowledge lives in a parallel
/// bitset, so every byte value stays a legal literal. Wildcard cells hold `0`
/// and a clear bit; bits past `len` are always clear.
#[derive(Clone, PartialEq, Eq)]
pub struct ConsensusBuffer {
    orientation: Orientation,
    /// Samples folded in so far, the seed included.
    samples: u64,
    cells: Vec<u8>,
    known: Vec<u64>,
}

impl fmt::Debug for ConsensusBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsensusBuffer")
            .field("orientation", &self.orientation)
            .field("samples", &self.samples)
            .field("cells", &self.cells.len())
            .field("wildcards", &self.wildcard_count())
            .finish()
    }
}

impl ConsensusBuffer {
    /// Seeds a buffer from a single sample given in file order.
    ///
    /// Every cell starts known; a reverse buffer stores the sample end-first.
    pub fn seed(sample: &[u8], orientation: Orientation) -> Self {
        let cells: Vec<u8> = match orientation {
            Orientation::Forward => sample.to_vec(),
            Orientation::Reverse => sample.iter().rev().copied().collect(),
        };
        let known = full_bitset(cells.len());
        Self {
            orientation,
            samples: 1,
            cells,
            known,
        }
    }

    /// Rebuilds a buffer from persisted parts. `known` must already be sized
    /// for `cells` with no stray bits; wildcard cells are normalised to `0`.
    pub(crate) fn from_parts(orientation: Orientation, samples: u64, mut cells: Vec<u8>, known: Vec<u64>) -> Self {
        for (idx, cell) in cells.iter_mut().enumerate() {
            if known[idx / WORD_BITS] >> (idx % WORD_BITS) & 1 == 0 {
                *cell = 0;
            }
        }
        Self {
            orientation,
            samples,
            cells,
            known,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of samples this buffer has learned.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn is_known(&self, idx: usize) -> bool {
        idx < self.cells.len() && self.known[idx / WORD_BITS] >> (idx % WORD_BITS) & 1 == 1
    }

    /// The fixed byte at `idx`, or `None` for a wildcard or out-of-range cell.
    pub fn get(&self, idx: usize) -> Option<u8> {
        self.is_known(idx).then(|| self.cells[idx])
    }

    pub fn wildcard_count(&self) -> usize {
        let known: usize = self.known.iter().map(|w| w.count_ones() as usize).sum();
        self.cells.len() - known
    }

    /// Raw cell bytes in buffer order (wildcards read as `0`).
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Known-cell bitset, one bit per cell, least significant bit first.
    pub fn known_words(&self) -> &[u64] {
        &self.known
    }

    /// Folds a sample (in file order) into the buffer.
    ///
    /// Each orientation is walked once, front to back, without seeking.
    /// Already-wildcard cells are skipped and never compared again, and no
    /// policy ever turns a wildcard back into a known cell.
    pub fn intersect(&mut self, sample: &[u8], policy: LengthPolicy) -> Intersection {
        let mut stats = match self.orientation {
            Orientation::Forward => self.absorb(sample.iter().copied()),
            Orientation::Reverse => self.absorb(sample.iter().rev().copied()),
        };

        if policy == LengthPolicy::Wildcard {
            if sample.len() < self.cells.len() {
                stats.wildcarded += self.forget_from(sample.len());
            } else if sample.len() > self.cells.len() {
                stats.extended = self.extend(sample.len());
                stats.wildcarded += stats.extended;
            }
        }
        self.samples = self.samples.saturating_add(1);

        tracing::trace!(
            "ConsensusBuffer({:?}): compared {}, wildcarded {}, extended {}",
            self.orientation,
            stats.compared,
            stats.wildcarded,
            stats.extended
        );
        stats
    }

    fn absorb<I: Iterator<Item = u8>>(&mut self, stream: I) -> Intersection {
        let mut stats = Intersection::default();
        for (idx, byte) in stream.take(self.cells.len()).enumerate() {
            if !self.is_known(idx) {
                continue;
            }
            stats.compared += 1;
            if self.cells[idx] != byte {
                self.forget(idx);
                stats.wildcarded += 1;
            }
        }
        stats
    }

    fn forget(&mut self, idx: usize) {
        self.known[idx / WORD_BITS] &= !(1u64 << (idx % WORD_BITS));
        self.cells[idx] = 0;
    }

    /// Forgets every known cell at or after `from`; returns how many.
    fn forget_from(&mut self, from: usize) -> usize {
        let mut forgotten = 0;
        let mut idx = self.scan(from, true);
        while idx < self.cells.len() {
            self.forget(idx);
            forgotten += 1;
            idx = self.scan(idx + 1, true);
        }
        forgotten
    }

    /// Grows the buffer to `len` with wildcard cells; returns how many.
    /// Bits past the old length are already clear.
    fn extend(&mut self, len: usize) -> usize {
        let added = len - self.cells.len();
        self.cells.resize(len, 0);
        self.known.resize(words_for(len), 0);
        added
    }

    /// Returns the first index at or after `from` whose knowledge bit equals
    /// `known`, or `len()` if there is none. Skips whole words at a time.
    fn scan(&self, from: usize, known: bool) -> usize {
        let len = self.cells.len();
        let mut idx = from;
        while idx < len {
            let word = self.known[idx / WORD_BITS];
            let word = if known { word } else { !word };
            let shifted = word >> (idx % WORD_BITS);
            if shifted != 0 {
                return (idx + shifted.trailing_zeros() as usize).min(len);
            }
            idx = (idx / WORD_BITS + 1) * WORD_BITS;
        }
        len
    }

    /// Iterates maximal runs of known cells in buffer order.
    pub fn runs(&self) -> Runs<'_> {
        Runs {
            buffer: self,
            pos: 0,
        }
    }

    /// Cell bytes covered by `run`, in buffer order.
    pub fn run_bytes(&self, run: Run) -> &[u8] {
        &self.cells[run.start..run.end()]
    }
}

pub struct Runs<'a> {
    buffer: &'a ConsensusBuffer,
    pos: usize,
}

impl Iterator for Runs<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let len = self.buffer.len();
        let start = self.buffer.scan(self.pos, true);
        if start >= len {
            self.pos = len;
            return None;
        }
        let end = self.buffer.scan(start, false);
        self.pos = end;
        Some(Run {
            start,
            len: end - start,
        })
    }
}

pub(crate) fn words_for(cells: usize) -> usize {
    cells.div_ceil(WORD_BITS)
}

/// Mask of the valid bits in the last word of a `cells`-long bitset.
pub(crate) fn tail_mask(cells: usize) -> u64 {
    match cells % WORD_BITS {
        0 => u64::MAX,
        rem => (1u64 << rem) - 1,
    }
}

fn full_bitset(cells: usize) -> Vec<u64> {
    let mut known = alloc::vec![u64::MAX; words_for(cells)];
    if let Some(last) = known.last_mut() {
        *last &= tail_mask(cells);
    }
    known
}
