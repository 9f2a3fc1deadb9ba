use printrack_dsa::ConsensusPair;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::format::FormatTag;

/// Persistent consensus pairs, keyed by format.
pub trait ConsensusStore {
    fn load_pair(&self, format: &FormatTag) -> Result<Option<ConsensusPair>>;

    /// Replaces the stored pair. Implementations must not leave a partially
    /// written pair behind on failure.
    fn save_pair(&mut self, format: &FormatTag, pair: &ConsensusPair) -> Result<()>;
}

/// The fingerprint ("print") files, keyed by format.
pub trait PrintCorpus {
    /// Every format with a stored print, in ascending order.
    fn formats(&self) -> Result<Vec<FormatTag>>;

    fn read_print(&self, format: &FormatTag) -> Result<Option<Vec<u8>>>;

    fn write_print(&mut self, format: &FormatTag, print: &[u8]) -> Result<()>;
}

/// In-process store used by tests and embedders that manage persistence
/// themselves.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pairs: BTreeMap<FormatTag, ConsensusPair>,
    prints: BTreeMap<FormatTag, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(&self, format: &FormatTag) -> Option<&ConsensusPair> {
        self.pairs.get(format)
    }

    pub fn print(&self, format: &FormatTag) -> Option<&[u8]> {
        self.prints.get(format).map(Vec::as_slice)
    }
}

impl ConsensusStore for MemoryStore {
    fn load_pair(&self, format: &FormatTag) -> Result<Option<ConsensusPair>> {
        Ok(self.pairs.get(format).cloned())
    }

    fn save_pair(&mut self, format: &FormatTag, pair: &ConsensusPair) -> Result<()> {
        self.pairs.insert(format.clone(), pair.clone());
        Ok(())
    }
}

impl PrintCorpus for MemoryStore {
    fn formats(&self) -> Result<Vec<FormatTag>> {
        Ok(self.prints.keys().cloned().collect())
    }

    fn read_print(&self, format: &FormatTag) -> Result<Option<Vec<u8>>> {
        Ok(self.prints.get(format).cloned())
    }

    fn write_print(&mut self, format: &FormatTag, print: &[u8]) -> Result<()> {
        self.prints.insert(format.clone(), print.to_vec());
        Ok(())
    }
}
