pub mod config;
pub mod dir_store;
pub mod error;
pub mod format;
pub mod learner;
pub mod store;

pub use config::TrackerConfig;
pub use dir_store::DirStore;
pub use error::{Result, TrackerError};
pub use format::FormatTag;
pub use learner::{LearnReport, Learner};
pub use store::{ConsensusStore, MemoryStore, PrintCorpus};

pub use printrack_dsa::{ConsensusBuffer, ConsensusPair, LengthPolicy, Orientation};
