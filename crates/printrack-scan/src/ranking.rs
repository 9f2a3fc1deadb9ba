use printrack_core::FormatTag;
use printrack_codec::PatternRecord;

/// Running tally of one print against one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub format: FormatTag,
    pub total_records: u64,
    pub matched_records: u64,
    /// A forward record at offset 0 matched in full.
    pub header_matched: bool,
}

impl Guess {
    pub fn new(format: FormatTag) -> Self {
        Self {
            format,
            total_records: 0,
            matched_records: 0,
            header_matched: false,
        }
    }

    pub fn observe(&mut self, record: &PatternRecord, hit: bool) {
        self.total_records += 1;
        if hit {
            self.matched_records += 1;
            if record.is_header() {
                self.header_matched = true;
            }
        }
    }

    /// Integer share of matched records; 0 for a print with no records.
    pub fn percent(&self) -> u64 {
        if self.total_records == 0 {
            return 0;
        }
        self.matched_records * 100 / self.total_records
    }

    /// `percent * matched`, times ten when the header matched, so a full
    /// match of a long print outranks a full match of a one-record print.
    pub fn weight(&self) -> u64 {
        let weight = self.percent() * self.matched_records;
        if self.header_matched {
            weight * 10
        } else {
            weight
        }
    }

    /// `None` unless at least one percent of the print matched.
    pub fn rank(&self) -> Option<RankedAnswer> {
        let percent = self.percent();
        (percent > 0).then(|| RankedAnswer {
            format: self.format.clone(),
            percent,
            weight: self.weight(),
            total_records: self.total_records,
            matched_records: self.matched_records,
            header_matched: self.header_matched,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedAnswer {
    pub format: FormatTag,
    pub percent: u64,
    pub weight: u64,
    pub total_records: u64,
    pub matched_records: u64,
    pub header_matched: bool,
}

/// Every surviving answer of one identification, heaviest first.
///
/// Equal weights are ordered by format name so rankings are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    answers: Vec<RankedAnswer>,
}

impl Ranking {
    pub fn from_guesses<I>(guesses: I) -> Self
    where
        I: IntoIterator<Item = Guess>,
    {
        let mut answers: Vec<RankedAnswer> = guesses.into_iter().filter_map(|g| g.rank()).collect();
        answers.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.format.cmp(&b.format)));
        Self { answers }
    }

    pub fn answers(&self) -> &[RankedAnswer] {
        &self.answers
    }

    pub fn into_answers(self) -> Vec<RankedAnswer> {
        self.answers
    }

    pub fn best(&self) -> Option<&RankedAnswer> {
        self.answers.first()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// The first `limit` answers and the number left out.
    pub fn top(&self, limit: usize) -> (&[RankedAnswer], usize) {
        let shown = limit.min(self.answers.len());
        (&self.answers[..shown], self.answers.len() - shown)
    }
}
