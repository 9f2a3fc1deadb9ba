//! Persisted form of a [`ConsensusBuffer`].
//!
//! ```text
//! b"PTCB" | version u8 | orientation u8 ('d' | 'i') | samples u64 LE
//! | cells u64 LE | cell bytes | known bitset as ceil(cells / 64) u64 LE words
//! ```
//!
//! Both halves of a pair carry the same sample count; a store uses it to
//! spot a pair whose halves were written by different learn calls.

use alloc::vec;
use alloc::vec::Vec;
use bytes::{Buf, BufMut};
use core::fmt;

use crate::consensus::{tail_mask, words_for, ConsensusBuffer, Orientation};

pub const MAGIC: &[u8; 4] = b"PTCB";
pub const VERSION: u8 = 2;
const HEADER_LEN: usize = 4 + 1 + 1 + 8 + 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    Truncated { needed: usize, available: usize },
    BadMagic,
    UnsupportedVersion(u8),
    BadOrientation(u8),
    /// Bits set past the last cell.
    StrayBits,
    TrailingBytes(usize),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Truncated { needed, available } => {
                write!(f, "truncated buffer: needed {} bytes, {} available", needed, available)
            }
            LayoutError::BadMagic => f.write_str("missing PTCB magic"),
            LayoutError::UnsupportedVersion(v) => write!(f, "unsupported layout version {}", v),
            LayoutError::BadOrientation(tag) => write!(f, "unknown orientation tag 0x{:02x}", tag),
            LayoutError::StrayBits => f.write_str("known bits set past the last cell"),
            LayoutError::TrailingBytes(n) => write!(f, "{} trailing bytes after buffer", n),
        }
    }
}

impl core::error::Error for LayoutError {}

impl ConsensusBuffer {
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.len() + self.known_words().len() * 8
    }

    pub fn encode<B: BufMut>(&self, out: &mut B) {
        out.put_slice(MAGIC);
        out.put_u8(VERSION);
        out.put_u8(self.orientation().tag());
        out.put_u64_le(self.samples());
        out.put_u64_le(self.len() as u64);
        out.put_slice(self.cells());
        for word in self.known_words() {
            out.put_u64_le(*word);
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out);
        out
    }

    /// Decodes one buffer from the front of `buf`, leaving any remainder.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, LayoutError> {
        ensure(buf, HEADER_LEN)?;

        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if &magic != MAGIC {
            return Err(LayoutError::BadMagic);
        }
        let version = buf.get_u8();
        if version != VERSION {
            return Err(LayoutError::UnsupportedVersion(version));
        }
        let tag = buf.get_u8();
        let orientation = Orientation::from_tag(tag).ok_or(LayoutError::BadOrientation(tag))?;

        let samples = buf.get_u64_le();
        let declared = buf.get_u64_le();
        let cells_len = usize::try_from(declared).map_err(|_| LayoutError::Truncated {
            needed: usize::MAX,
            available: buf.remaining(),
        })?;
        let words = words_for(cells_len);
        let body = words
            .checked_mul(8)
            .and_then(|bits| bits.checked_add(cells_len))
            .ok_or(LayoutError::Truncated {
                needed: usize::MAX,
                available: buf.remaining(),
            })?;
        ensure(buf, body)?;

        let mut cells = vec![0u8; cells_len];
        buf.copy_to_slice(&mut cells);
        let mut known = Vec::with_capacity(words);
        for _ in 0..words {
            known.push(buf.get_u64_le());
        }
        if let Some(last) = known.last() {
            if last & !tail_mask(cells_len) != 0 {
                return Err(LayoutError::StrayBits);
            }
        }

        Ok(ConsensusBuffer::from_parts(orientation, samples, cells, known))
    }

    /// Decodes a buffer that must occupy all of `bytes`.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, LayoutError> {
        let buffer = Self::decode(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(LayoutError::TrailingBytes(bytes.len()));
        }
        Ok(buffer)
    }
}

fn ensure<B: Buf>(buf: &B, needed: usize) -> Result<(), LayoutError> {
    if buf.remaining() < needed {
        return Err(LayoutError::Truncated {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}
