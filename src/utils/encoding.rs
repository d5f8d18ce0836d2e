use std::io::{self, Write};

/// Encode a u64 as a variable-length integer
pub fn encode_varint_u64(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a u64 variable-length integer
/// Returns (value, bytes_consumed)
pub fn decode_varint_u64(buf: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None; // Overflow
        }

        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }

        shift += 7;
    }

    None // Incomplete
}

/// Encode `(index, value)` pairs with strictly increasing indices as
/// varint index deltas followed by varint values
pub fn encode_sparse_pairs(pairs: &[(u64, u64)], buf: &mut Vec<u8>) {
    let mut prev = 0u64;
    for &(index, value) in pairs {
        encode_varint_u64(index - prev, buf);
        encode_varint_u64(value, buf);
        prev = index;
    }
}

/// Iterator over pairs written by [`encode_sparse_pairs`].
///
/// Yields `None` for a truncated or overlong encoding by stopping early;
/// callers compare the number of pairs read against the expected count.
pub struct SparsePairs<'a> {
    buf: &'a [u8],
    pos: usize,
    prev: u64,
}

impl<'a> SparsePairs<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, prev: 0 }
    }

    /// Whether every byte was consumed
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

impl Iterator for SparsePairs<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        let (delta, used) = decode_varint_u64(self.buf.get(self.pos..)?)?;
        let (value, used_value) = decode_varint_u64(self.buf.get(self.pos + used..)?)?;
        self.pos += used + used_value;
        self.prev = self.prev.checked_add(delta)?;
        Some((self.prev, value))
    }
}

/// Little-endian u32 at `offset`, or `None` past the end of `data`
#[inline]
pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    bytes.try_into().ok().map(u32::from_le_bytes)
}

/// Little-endian u64 at `offset`, or `None` past the end of `data`
#[inline]
pub fn u64_at(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    bytes.try_into().ok().map(u64::from_le_bytes)
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write a u64 in little-endian format
pub fn write_u64_le<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let values = [0, 1, 127, 128, 16383, 16384, u32::MAX as u64, u64::MAX];
        for value in values {
            let mut buf = Vec::new();
            encode_varint_u64(value, &mut buf);
            let (decoded, used) = decode_varint_u64(&buf).unwrap();
            assert_eq!(value, decoded);
            assert_eq!(used, buf.len());
        }
    }

    #[test]
    fn test_varint_incomplete() {
        assert_eq!(decode_varint_u64(&[0x80, 0x80]), None);
        assert_eq!(decode_varint_u64(&[]), None);
    }

    #[test]
    fn test_sparse_pairs() {
        let pairs = vec![(3, 300), (4, 1), (1000, 70000)];
        let mut buf = Vec::new();
        encode_sparse_pairs(&pairs, &mut buf);

        let mut iter = SparsePairs::new(&buf);
        let decoded: Vec<(u64, u64)> = iter.by_ref().collect();
        assert_eq!(decoded, pairs);
        assert!(iter.is_exhausted());
    }

    #[test]
    fn test_sparse_pairs_truncated() {
        let mut buf = Vec::new();
        encode_sparse_pairs(&[(5, 1000)], &mut buf);
        buf.pop();

        let mut iter = SparsePairs::new(&buf);
        assert_eq!(iter.next(), None);
        assert!(!iter.is_exhausted());
    }

    #[test]
    fn test_slice_readers() {
        let mut data = Vec::new();
        write_u32_le(&mut data, 0xDEADBEEF).unwrap();
        write_u64_le(&mut data, 42).unwrap();

        assert_eq!(u32_at(&data, 0), Some(0xDEADBEEF));
        assert_eq!(u64_at(&data, 4), Some(42));
        assert_eq!(u64_at(&data, 5), None);
        assert_eq!(u32_at(&data, usize::MAX), None);
    }
}
