use bytes::Bytes;
use printrack_core::{ConsensusStore, FormatTag, PrintCorpus, Result, TrackerError};
use printrack_dsa::{ConsensusPair, Orientation};

use crate::record::{encode_print, PatternRecord};

/// Summary of one compiled print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPrint {
    pub format: FormatTag,
    pub forward_records: usize,
    pub reverse_records: usize,
    pub print: Bytes,
}

impl CompiledPrint {
    pub fn records(&self) -> usize {
        self.forward_records + self.reverse_records
    }
}

/// Turns every maximal known run of a consensus pair into a record.
///
/// Forward runs come first, then reverse runs, each in ascending buffer
/// order. Reverse literals are flipped back into file order and addressed
/// by the distance from the end of the file to their first byte.
pub fn compile_records(pair: &ConsensusPair) -> Vec<PatternRecord> {
    let forward = pair.forward.runs().map(|run| PatternRecord {
        offset: run.start as u64,
        orientation: Orientation::Forward,
        literal: Bytes::copy_from_slice(pair.forward.run_bytes(run)),
    });

    let reverse = pair.reverse.runs().map(|run| {
        let literal: Vec<u8> = pair.reverse.run_bytes(run).iter().rev().copied().collect();
        PatternRecord {
            offset: run.end() as u64,
            orientation: Orientation::Reverse,
            literal: Bytes::from(literal),
        }
    });

    forward.chain(reverse).collect()
}

/// Compiles the stored consensus of `format` and writes its print.
///
/// Recompiling an unchanged consensus writes byte-identical output.
pub fn compile<S>(store: &mut S, format: &FormatTag) -> Result<CompiledPrint>
where
    S: ConsensusStore + PrintCorpus + ?Sized,
{
    let pair = store
        .load_pair(format)?
        .ok_or_else(|| TrackerError::NotLearned(format.to_string()))?;

    let records = compile_records(&pair);
    let forward_records = records
        .iter()
        .filter(|r| r.orientation == Orientation::Forward)
        .count();
    let print = encode_print(&records);
    store.write_print(format, &print)?;

    tracing::info!(
        "Compiler: {} -> {} records ({} forward, {} reverse), {} bytes",
        format,
        records.len(),
        forward_records,
        records.len() - forward_records,
        print.len()
    );

    Ok(CompiledPrint {
        format: format.clone(),
        forward_records,
        reverse_records: records.len() - forward_records,
        print,
    })
}
