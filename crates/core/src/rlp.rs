//! Recursive length-prefix (RLP) codec.
//!
//! Flip payloads arrive as a single RLP item. Decoding is strict: non-canonical
//! prefixes, truncated input and trailing bytes are rejected so that the result
//! matches what the node itself would accept.

use thiserror::Error;

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb8;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf8;
const MAX_SHORT_LEN: usize = 55;
/// Deepest list nesting accepted from the wire.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("input is empty")]
    Empty,

    #[error("input truncated at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("single byte {0:#04x} must not carry a string prefix")]
    NonCanonicalSingleByte(u8),

    #[error("long-form length {0} must exceed 55")]
    NonCanonicalLength(usize),

    #[error("length prefix has leading zero bytes")]
    LeadingZeroLength,

    #[error("length does not fit in memory")]
    LengthOverflow,

    #[error("{0} trailing bytes after top-level item")]
    TrailingBytes(usize),

    #[error("integer of {0} bytes does not fit in 64 bits")]
    IntegerOverflow(usize),

    #[error("unexpected shape: {0}")]
    UnexpectedShape(&'static str),

    #[error("lists nested deeper than {0} levels")]
    TooDeep(usize),
}

/// A decoded RLP tree: byte strings at the leaves, ordered lists inside.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rlp {
    Bytes(Vec<u8>),
    List(Vec<Rlp>),
}

impl Rlp {
    #[must_use]
    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(value.into())
    }

    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Rlp>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Minimal big-endian encoding of an unsigned integer; zero is the empty string.
    #[must_use]
    pub fn uint(value: u64) -> Self {
        let be = value.to_be_bytes();
        let skip = be.iter().take_while(|byte| **byte == 0).count();
        Self::Bytes(be[skip..].to_vec())
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::List(_) => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Rlp]> {
        match self {
            Self::List(items) => Some(items),
            Self::Bytes(_) => None,
        }
    }

    /// Interpret a byte string as a big-endian unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnexpectedShape` for lists and
    /// `DecodeError::IntegerOverflow` for strings longer than eight bytes.
    pub fn as_u64(&self) -> Result<u64, DecodeError> {
        let bytes = self
            .as_bytes()
            .ok_or(DecodeError::UnexpectedShape("expected an integer, found a list"))?;
        if bytes.len() > 8 {
            return Err(DecodeError::IntegerOverflow(bytes.len()));
        }
        Ok(bytes
            .iter()
            .fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte)))
    }
}

/// Decode exactly one RLP item from `input`.
///
/// # Errors
///
/// Returns `DecodeError` if the input is empty, truncated, non-canonical, nests
/// lists deeper than [`MAX_DEPTH`], or has bytes left over after the top-level item.
pub fn decode(input: &[u8]) -> Result<Rlp, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::Empty);
    }
    let (item, end) = decode_at(input, 0, 0)?;
    if end != input.len() {
        return Err(DecodeError::TrailingBytes(input.len() - end));
    }
    Ok(item)
}

/// Decodes the item starting at `offset`, returning it with the offset just past it.
fn decode_at(input: &[u8], offset: usize, depth: usize) -> Result<(Rlp, usize), DecodeError> {
    let prefix = take(input, offset, 1)?[0];
    match prefix {
        0x00..SHORT_STRING => Ok((Rlp::Bytes(vec![prefix]), offset + 1)),
        SHORT_STRING..LONG_STRING => {
            let len = usize::from(prefix - SHORT_STRING);
            let start = offset + 1;
            let body = take(input, start, len)?;
            if len == 1 && body[0] < SHORT_STRING {
                return Err(DecodeError::NonCanonicalSingleByte(body[0]));
            }
            Ok((Rlp::Bytes(body.to_vec()), start + len))
        }
        LONG_STRING..SHORT_LIST => {
            let len_of_len = usize::from(prefix - (LONG_STRING - 1));
            let len = read_length(input, offset + 1, len_of_len)?;
            let start = offset + 1 + len_of_len;
            let body = take(input, start, len)?;
            Ok((Rlp::Bytes(body.to_vec()), start + len))
        }
        SHORT_LIST..LONG_LIST => {
            let len = usize::from(prefix - SHORT_LIST);
            decode_list(input, offset + 1, len, depth)
        }
        LONG_LIST..=u8::MAX => {
            let len_of_len = usize::from(prefix - (LONG_LIST - 1));
            let len = read_length(input, offset + 1, len_of_len)?;
            decode_list(input, offset + 1 + len_of_len, len, depth)
        }
    }
}

fn decode_list(
    input: &[u8],
    start: usize,
    len: usize,
    depth: usize,
) -> Result<(Rlp, usize), DecodeError> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::TooDeep(MAX_DEPTH));
    }
    take(input, start, len)?;
    let end = start + len;
    // Children are decoded against the list body only, so none can overrun it.
    let body = &input[..end];
    let mut items = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let (item, next) = decode_at(body, cursor, depth + 1)?;
        items.push(item);
        cursor = next;
    }
    Ok((Rlp::List(items), end))
}

fn read_length(input: &[u8], start: usize, len_of_len: usize) -> Result<usize, DecodeError> {
    let bytes = take(input, start, len_of_len)?;
    if bytes[0] == 0 {
        return Err(DecodeError::LeadingZeroLength);
    }
    let len = bytes.iter().try_fold(0_usize, |acc, byte| {
        acc.checked_mul(256)
            .and_then(|shifted| shifted.checked_add(usize::from(*byte)))
            .ok_or(DecodeError::LengthOverflow)
    })?;
    if len <= MAX_SHORT_LEN {
        return Err(DecodeError::NonCanonicalLength(len));
    }
    Ok(len)
}

fn take(input: &[u8], start: usize, len: usize) -> Result<&[u8], DecodeError> {
    let end = start.checked_add(len).ok_or(DecodeError::LengthOverflow)?;
    input.get(start..end).ok_or(DecodeError::Truncated {
        offset: start,
        needed: len,
        available: input.len().saturating_sub(start),
    })
}

/// Canonical RLP encoding of `item`.
#[must_use]
pub fn encode(item: &Rlp) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(item, &mut out);
    out
}

fn encode_into(item: &Rlp, out: &mut Vec<u8>) {
    match item {
        Rlp::Bytes(bytes) if bytes.len() == 1 && bytes[0] < SHORT_STRING => out.push(bytes[0]),
        Rlp::Bytes(bytes) => {
            write_header(out, SHORT_STRING, bytes.len());
            out.extend_from_slice(bytes);
        }
        Rlp::List(items) => {
            let mut body = Vec::new();
            for child in items {
                encode_into(child, &mut body);
            }
            write_header(out, SHORT_LIST, body.len());
            out.extend_from_slice(&body);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_header(out: &mut Vec<u8>, base: u8, len: usize) {
    if len <= MAX_SHORT_LEN {
        out.push(base + len as u8);
        return;
    }
    let be = len.to_be_bytes();
    let skip = be.iter().take_while(|byte| **byte == 0).count();
    let len_bytes = &be[skip..];
    out.push(base + MAX_SHORT_LEN as u8 + len_bytes.len() as u8);
    out.extend_from_slice(len_bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOREM: &[u8] = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";

    #[test]
    fn decodes_short_string() {
        assert_eq!(decode(&[0x83, b'd', b'o', b'g']).unwrap(), Rlp::bytes(*b"dog"));
    }

    #[test]
    fn decodes_single_byte_and_empty_values() {
        assert_eq!(decode(&[0x0f]).unwrap(), Rlp::bytes([0x0f_u8]));
        assert_eq!(decode(&[0x80]).unwrap(), Rlp::bytes(Vec::new()));
        assert_eq!(decode(&[0xc0]).unwrap(), Rlp::List(Vec::new()));
    }

    #[test]
    fn decodes_list_of_strings() {
        let input = [0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g'];
        assert_eq!(
            decode(&input).unwrap(),
            Rlp::list([Rlp::bytes(*b"cat"), Rlp::bytes(*b"dog")])
        );
    }

    #[test]
    fn decodes_set_theoretic_nesting() {
        let input = [0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0];
        let empty = || Rlp::List(Vec::new());
        let expected = Rlp::list([
            empty(),
            Rlp::list([empty()]),
            Rlp::list([empty(), Rlp::list([empty()])]),
        ]);
        assert_eq!(decode(&input).unwrap(), expected);
        assert_eq!(encode(&expected), input);
    }

    #[test]
    fn decodes_long_string() {
        let mut input = vec![0xb8, 0x38];
        input.extend_from_slice(LOREM);
        assert_eq!(decode(&input).unwrap(), Rlp::bytes(LOREM));
        assert_eq!(encode(&Rlp::bytes(LOREM)), input);
    }

    #[test]
    fn long_list_survives_encoding() {
        let item = Rlp::list((0..60_u8).map(|n| Rlp::bytes([n])));
        let encoded = encode(&item);
        assert_eq!(encoded[0], 0xf8);
        assert_eq!(encoded[1], 60);
        assert_eq!(decode(&encoded).unwrap(), item);
    }

    #[test]
    fn integers_use_minimal_big_endian() {
        assert_eq!(encode(&Rlp::uint(0)), [0x80]);
        assert_eq!(encode(&Rlp::uint(15)), [0x0f]);
        assert_eq!(encode(&Rlp::uint(1024)), [0x82, 0x04, 0x00]);
        assert_eq!(decode(&[0x82, 0x04, 0x00]).unwrap().as_u64().unwrap(), 1024);
        assert_eq!(Rlp::bytes(Vec::new()).as_u64().unwrap(), 0);
    }

    #[test]
    fn integer_wider_than_u64_is_rejected() {
        let wide = Rlp::bytes([1_u8; 9]);
        assert_eq!(wide.as_u64(), Err(DecodeError::IntegerOverflow(9)));
        assert!(matches!(
            Rlp::List(Vec::new()).as_u64(),
            Err(DecodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn rejects_truncated_string() {
        assert!(matches!(
            decode(&[0x83, b'd', b'o']),
            Err(DecodeError::Truncated { needed: 3, .. })
        ));
    }

    #[test]
    fn rejects_child_overrunning_its_list() {
        // List claims 2 bytes of body but its child needs 3.
        assert!(matches!(
            decode(&[0xc2, 0x82, 0x01, 0x02]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_prefixed_single_byte() {
        assert_eq!(
            decode(&[0x81, 0x05]),
            Err(DecodeError::NonCanonicalSingleByte(0x05))
        );
    }

    #[test]
    fn rejects_short_length_in_long_form() {
        let mut input = vec![0xb8, 0x05];
        input.extend_from_slice(b"hello");
        assert_eq!(decode(&input), Err(DecodeError::NonCanonicalLength(5)));
    }

    #[test]
    fn rejects_leading_zero_in_length() {
        let mut input = vec![0xb9, 0x00, 0x40];
        input.extend_from_slice(&[0xaa; 64]);
        assert_eq!(decode(&input), Err(DecodeError::LeadingZeroLength));
    }

    /// `levels` empty lists wrapped inside each other, built without recursion.
    fn nested_lists(levels: usize) -> Vec<u8> {
        let mut headers = Vec::with_capacity(levels);
        let mut len = 1;
        for _ in 0..levels {
            let mut header = Vec::new();
            write_header(&mut header, SHORT_LIST, len);
            len += header.len();
            headers.push(header);
        }
        let mut out = Vec::with_capacity(len);
        for header in headers.iter().rev() {
            out.extend_from_slice(header);
        }
        out.push(SHORT_LIST);
        out
    }

    #[test]
    fn rejects_hostile_nesting_without_overflowing() {
        let payload = nested_lists(20_000);
        assert_eq!(decode(&payload), Err(DecodeError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        assert!(decode(&nested_lists(MAX_DEPTH - 1)).is_ok());
        assert_eq!(
            decode(&nested_lists(MAX_DEPTH)),
            Err(DecodeError::TooDeep(MAX_DEPTH))
        );
    }

    #[test]
    fn rejects_trailing_bytes() {
        assert_eq!(decode(&[0x0f, 0x0f]), Err(DecodeError::TrailingBytes(1)));
    }
}
