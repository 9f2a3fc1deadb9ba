use bytes::Bytes;
use printrack_codec::{PatternRecord, PrintReader};
use printrack_core::{FormatTag, PrintCorpus, Result, TrackerConfig, TrackerError};
use std::thread;

use crate::candidate::Candidate;
use crate::ranking::{Guess, Ranking};

/// Scores a candidate against every print of a corpus.
///
/// ## Parallelism
/// Prints are independent, so with `threads > 1` they are split into
/// contiguous batches scored on scoped workers that share the candidate
/// through positional reads. The ranking is identical to the serial one.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threads: usize,
}

impl Matcher {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    pub fn serial() -> Self {
        Self::new(1)
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.scan_threads)
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn identify<C, P>(&self, candidate: &C, corpus: &P) -> Result<Ranking>
    where
        C: Candidate + ?Sized,
        P: PrintCorpus + ?Sized,
    {
        let formats = corpus.formats()?;
        let mut prints = Vec::with_capacity(formats.len());
        for format in formats {
            match corpus.read_print(&format)? {
                Some(print) => prints.push((format, Bytes::from(print))),
                None => tracing::warn!("Matcher: print for {} vanished, skipping", format),
            }
        }
        if prints.is_empty() {
            return Err(TrackerError::EmptyCorpus);
        }

        let guesses = if self.threads > 1 && prints.len() > 1 {
            self.score_parallel(candidate, &prints)?
        } else {
            score_batch(&prints, candidate)
        };

        let ranking = Ranking::from_guesses(guesses);
        tracing::info!(
            "Matcher: {} prints scored, {} plausible formats",
            prints.len(),
            ranking.len()
        );
        Ok(ranking)
    }

    fn score_parallel<C>(&self, candidate: &C, prints: &[(FormatTag, Bytes)]) -> Result<Vec<Guess>>
    where
        C: Candidate + ?Sized,
    {
        let workers = self.threads.min(prints.len());
        let batch_len = prints.len().div_ceil(workers);

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for (n, batch) in prints.chunks(batch_len).enumerate() {
                let handle = thread::Builder::new()
                    .name(format!("printrack-scan-{}", n))
                    .spawn_scoped(scope, move || score_batch(batch, candidate))?;
                handles.push(handle);
            }

            let mut guesses = Vec::with_capacity(prints.len());
            for handle in handles {
                match handle.join() {
                    Ok(batch) => guesses.extend(batch),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            Ok(guesses)
        })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::serial()
    }
}

fn score_batch<C>(prints: &[(FormatTag, Bytes)], candidate: &C) -> Vec<Guess>
where
    C: Candidate + ?Sized,
{
    prints
        .iter()
        .map(|(format, print)| score_print(format.clone(), print.clone(), candidate))
        .collect()
}

/// Walks one print in compiled order and tallies its hits.
///
/// A malformed record ends the walk; records decoded before it still count.
pub fn score_print<C>(format: FormatTag, print: Bytes, candidate: &C) -> Guess
where
    C: Candidate + ?Sized,
{
    let file_len = candidate.len();
    let mut guess = Guess::new(format);
    let mut scratch = Vec::new();

    for item in PrintReader::new(print) {
        let record = match item {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(
                    "Matcher: print for {} is malformed after {} records: {}",
                    guess.format,
                    guess.total_records,
                    e
                );
                break;
            }
        };
        let hit = record_matches(&record, candidate, file_len, &mut scratch);
        tracing::debug!(
            "Matcher: {} <{}|{}|{}> {}",
            guess.format,
            record.offset,
            record.len(),
            record.orientation.tag() as char,
            if hit { "hit" } else { "miss" }
        );
        guess.observe(&record, hit);
    }
    guess
}

/// Full-length exact comparison; anything outside the candidate is a miss.
pub fn record_matches<C>(record: &PatternRecord, candidate: &C, file_len: u64, scratch: &mut Vec<u8>) -> bool
where
    C: Candidate + ?Sized,
{
    let Some(start) = record.locate(file_len) else {
        return false;
    };
    scratch.clear();
    scratch.resize(record.literal.len(), 0);
    if candidate.read_exact_at(start, scratch).is_err() {
        return false;
    }
    scratch.iter().zip(record.literal.iter()).all(|(a, b)| a == b)
}
