//! # printrack-codec: Print Records
//!
//! The `<offset|length|d|i>literal` wire format and the compiler that
//! produces it from a consensus pair.

pub mod compiler;
pub mod record;

pub use compiler::{compile, compile_records, CompiledPrint};
pub use record::{decode_print, decode_record, encode_print, CodecError, Field, PatternRecord, PrintReader};
