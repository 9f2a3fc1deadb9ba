//! # printrack-dsa: Positional Consensus
//!
//! Byte-per-offset consensus buffers with an out-of-band wildcard bitset,
//! plus their persisted layout. `no_std` + `alloc`; no I/O lives here.
#![no_std]
extern crate alloc;

pub mod consensus;
pub mod layout;
pub mod pair;

pub use consensus::{ConsensusBuffer, Intersection, LengthPolicy, Orientation, Run, Runs};
pub use layout::LayoutError;
pub use pair::{ConsensusPair, PairIntersection};
