//! Brute-force reference finders
//!
//! Quadratic in the number of sequences and in their lengths. Used to
//! cross-check the traversal on small inputs.

use memchr::memmem;

use super::types::{SeqNum, Spm};

/// Every `(a, b, len)` with `a != b`, `len >= min_length` and the suffix of
/// `a` of length `len` equal to the prefix of `b` of length `len`.
///
/// Sorted by `(from, to, length)`.
pub fn find_spms_naive<T: AsRef<[u8]>>(sequences: &[T], min_length: u64) -> Vec<Spm> {
    let min_length = min_length.max(1) as usize;
    let mut spms = Vec::new();

    for (a, seq_a) in sequences.iter().enumerate() {
        let seq_a = seq_a.as_ref();
        for (b, seq_b) in sequences.iter().enumerate() {
            if a == b {
                continue;
            }
            let seq_b = seq_b.as_ref();

            let longest = seq_a.len().min(seq_b.len());
            for len in min_length..=longest {
                if seq_a[seq_a.len() - len..] == seq_b[..len] {
                    spms.push(Spm::new(a as SeqNum, b as SeqNum, len as u64));
                }
            }
        }
    }

    spms
}

/// Sequences of length at least `min_length` occurring inside some other
/// sequence, in order
pub fn find_contained_naive<T: AsRef<[u8]>>(sequences: &[T], min_length: u64) -> Vec<SeqNum> {
    let mut contained = Vec::new();

    for (a, seq) in sequences.iter().enumerate() {
        let seq: &[u8] = seq.as_ref();
        if (seq.len() as u64) < min_length.max(1) {
            continue;
        }

        let finder = memmem::Finder::new(seq);
        let inside_other = sequences.iter().enumerate().any(|(b, other)| {
            let other: &[u8] = other.as_ref();
            a != b && finder.find(other).is_some()
        });
        if inside_other {
            contained.push(a as SeqNum);
        }
    }

    contained
}
