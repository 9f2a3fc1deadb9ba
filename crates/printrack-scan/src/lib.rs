pub mod candidate;
pub mod matcher;
pub mod ranking;

pub use candidate::{Candidate, FileCandidate};
pub use matcher::{record_matches, score_print, Matcher};
pub use ranking::{Guess, RankedAnswer, Ranking};
