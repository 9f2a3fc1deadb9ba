use bytes::{Buf, BufMut, Bytes, BytesMut};
use printrack_dsa::Orientation;
use std::fmt;

/// One positional pattern: `literal` is expected at `offset` of a file.
///
/// ## Addressing
/// A `Forward` offset is the literal's first byte counted from the start of
/// the file. A `Reverse` offset counts back from the end, so the literal
/// starts at `file_len - offset`. Literals are always stored in file order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternRecord {
    pub offset: u64,
    pub orientation: Orientation,
    pub literal: Bytes,
}

impl PatternRecord {
    pub fn len(&self) -> u64 {
        self.literal.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.literal.is_empty()
    }

    /// A forward record anchored at byte zero: the file's header.
    pub fn is_header(&self) -> bool {
        self.orientation == Orientation::Forward && self.offset == 0
    }

    /// Absolute start of the literal inside a `file_len`-byte file, or `None`
    /// if any part of it would fall outside the file.
    pub fn locate(&self, file_len: u64) -> Option<u64> {
        let start = match self.orientation {
            Orientation::Forward => self.offset,
            Orientation::Reverse => file_len.checked_sub(self.offset)?,
        };
        let end = start.checked_add(self.len())?;
        (end <= file_len).then_some(start)
    }

    /// Appends `<offset|length|tag>literal`.
    pub fn encode<B: BufMut>(&self, out: &mut B) {
        let header = format!(
            "<{}|{}|{}>",
            self.offset,
            self.literal.len(),
            self.orientation.tag() as char
        );
        out.put_slice(header.as_bytes());
        out.put_slice(&self.literal);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Offset,
    Length,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Offset => f.write_str("offset"),
            Field::Length => f.write_str("length"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("print ended inside a record header")]
    UnexpectedEnd,
    #[error("expected {expected:?}, found byte 0x{found:02x}")]
    Unexpected { expected: char, found: u8 },
    #[error("empty {0} field")]
    EmptyField(Field),
    #[error("non-digit byte 0x{byte:02x} in {field} field")]
    BadDigit { field: Field, byte: u8 },
    #[error("{0} field overflows u64")]
    Overflow(Field),
    #[error("unknown orientation tag 0x{0:02x}")]
    UnknownOrientation(u8),
    #[error("record declares an empty literal")]
    EmptyLiteral,
    #[error("literal truncated: {declared} bytes declared, {available} left")]
    TruncatedLiteral { declared: u64, available: usize },
}

/// Decodes the record at the front of `buf`, advancing past it.
pub fn decode_record(buf: &mut Bytes) -> Result<PatternRecord, CodecError> {
    expect(buf, b'<')?;
    let offset = decimal(buf, Field::Offset)?;
    let declared = decimal(buf, Field::Length)?;
    let tag = next_byte(buf)?;
    let orientation = Orientation::from_tag(tag).ok_or(CodecError::UnknownOrientation(tag))?;
    expect(buf, b'>')?;

    if declared == 0 {
        return Err(CodecError::EmptyLiteral);
    }
    let len = usize::try_from(declared)
        .ok()
        .filter(|len| *len <= buf.remaining())
        .ok_or(CodecError::TruncatedLiteral {
            declared,
            available: buf.remaining(),
        })?;

    Ok(PatternRecord {
        offset,
        orientation,
        literal: buf.split_to(len),
    })
}

fn next_byte(buf: &mut Bytes) -> Result<u8, CodecError> {
    if !buf.has_remaining() {
        return Err(CodecError::UnexpectedEnd);
    }
    Ok(buf.get_u8())
}

fn expect(buf: &mut Bytes, expected: u8) -> Result<(), CodecError> {
    let found = next_byte(buf)?;
    if found != expected {
        return Err(CodecError::Unexpected {
            expected: expected as char,
            found,
        });
    }
    Ok(())
}

/// Reads a decimal field up to and including its `|` terminator.
fn decimal(buf: &mut Bytes, field: Field) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    let mut digits = 0usize;
    loop {
        let byte = next_byte(buf)?;
        if byte == b'|' {
            break;
        }
        if !byte.is_ascii_digit() {
            return Err(CodecError::BadDigit { field, byte });
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(byte - b'0')))
            .ok_or(CodecError::Overflow(field))?;
        digits += 1;
    }
    if digits == 0 {
        return Err(CodecError::EmptyField(field));
    }
    Ok(value)
}

/// Streams records out of one print. After the first error the reader is
/// exhausted.
pub struct PrintReader {
    buf: Bytes,
}

impl PrintReader {
    pub fn new(print: impl Into<Bytes>) -> Self {
        Self { buf: print.into() }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}

impl Iterator for PrintReader {
    type Item = Result<PatternRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let item = decode_record(&mut self.buf);
        if item.is_err() {
            self.buf = Bytes::new();
        }
        Some(item)
    }
}

pub fn encode_print<'a, I>(records: I) -> Bytes
where
    I: IntoIterator<Item = &'a PatternRecord>,
{
    let mut out = BytesMut::new();
    for record in records {
        record.encode(&mut out);
    }
    out.freeze()
}

/// Decodes a whole print, failing on the first malformed record.
pub fn decode_print(print: impl Into<Bytes>) -> Result<Vec<PatternRecord>, CodecError> {
    PrintReader::new(print).collect()
}
