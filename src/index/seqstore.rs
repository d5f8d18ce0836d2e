//! Sequence boundaries of a concatenated text
//!
//! Every sequence is followed by exactly one separator, so a collection of
//! `k` sequences with total length `m` occupies `m + k` text positions.

use std::cmp::Ordering;

use super::suffix_array::types::SequenceBoundary;
use crate::error::{EsaError, EsaResult};
use crate::esa::position::PositionMapper;
use crate::esa::types::{SeqNum, TextPosition};

/// Maps text positions to sequences by binary search over the boundaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceStore {
    boundaries: Vec<SequenceBoundary>,
    total_length: u64,
}

impl SequenceStore {
    /// Store for the given boundaries, which must tile the text exactly
    pub fn from_boundaries(boundaries: Vec<SequenceBoundary>, total_length: u64) -> EsaResult<Self> {
        let mut expected_start = 0;
        for (seq, b) in boundaries.iter().enumerate() {
            if b.start != expected_start {
                return Err(EsaError::invalid_format(format!(
                    "sequence {} starts at {} but the previous separator ends at {}",
                    seq, b.start, expected_start
                )));
            }
            if b.is_empty() {
                return Err(EsaError::invalid_format(format!("sequence {} is empty", seq)));
            }
            expected_start = b.end + 1;
        }

        if expected_start != total_length {
            return Err(EsaError::invalid_format(format!(
                "sequences cover {} positions but the text has {}",
                expected_start, total_length
            )));
        }

        Ok(Self {
            boundaries,
            total_length,
        })
    }

    pub fn boundaries(&self) -> &[SequenceBoundary] {
        &self.boundaries
    }

    pub fn boundary(&self, seq: SeqNum) -> Option<&SequenceBoundary> {
        self.boundaries.get(usize::try_from(seq).ok()?)
    }

    /// Lengths of all sequences, in order
    pub fn lengths(&self) -> impl Iterator<Item = u64> + '_ {
        self.boundaries.iter().map(|b| b.len())
    }

    fn locate(&self, pos: TextPosition) -> Option<usize> {
        if pos >= self.total_length {
            return None;
        }

        self.boundaries
            .binary_search_by(|b| {
                if pos < b.start {
                    Ordering::Greater
                } else if pos > b.end {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()
    }
}

impl PositionMapper for SequenceStore {
    fn total_length(&self) -> u64 {
        self.total_length
    }

    fn num_sequences(&self) -> u64 {
        self.boundaries.len() as u64
    }

    fn sequence_of(&self, pos: TextPosition) -> Option<SeqNum> {
        self.locate(pos).map(|idx| idx as SeqNum)
    }

    fn starts_sequence(&self, pos: TextPosition) -> bool {
        self.locate(pos)
            .is_some_and(|idx| self.boundaries[idx].start == pos)
    }

    fn sequence_end(&self, pos: TextPosition) -> Option<TextPosition> {
        self.locate(pos).map(|idx| self.boundaries[idx].end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "ACGT$CG$A$"
    fn store() -> SequenceStore {
        SequenceStore::from_boundaries(
            vec![
                SequenceBoundary { start: 0, end: 4 },
                SequenceBoundary { start: 5, end: 7 },
                SequenceBoundary { start: 8, end: 9 },
            ],
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_sequence_of() {
        let store = store();
        assert_eq!(store.sequence_of(0), Some(0));
        assert_eq!(store.sequence_of(4), Some(0)); // separator
        assert_eq!(store.sequence_of(5), Some(1));
        assert_eq!(store.sequence_of(9), Some(2));
        assert_eq!(store.sequence_of(10), None);
        assert_eq!(store.num_sequences(), 3);
    }

    #[test]
    fn test_starts_and_ends() {
        let store = store();
        assert!(store.starts_sequence(0));
        assert!(store.starts_sequence(5));
        assert!(!store.starts_sequence(6));
        assert!(!store.starts_sequence(4));

        assert_eq!(store.sequence_end(6), Some(7));
        assert!(store.reaches_sequence_end(6, 1));
        assert!(store.reaches_sequence_end(5, 2));
        assert!(!store.reaches_sequence_end(5, 1));
        assert!(store.reaches_sequence_end(8, 1));
    }

    #[test]
    fn test_rejects_gaps_and_empty() {
        let gap = vec![
            SequenceBoundary { start: 0, end: 2 },
            SequenceBoundary { start: 4, end: 6 },
        ];
        assert!(SequenceStore::from_boundaries(gap, 7).is_err());

        let empty = vec![SequenceBoundary { start: 0, end: 0 }];
        assert!(SequenceStore::from_boundaries(empty, 1).is_err());

        let short = vec![SequenceBoundary { start: 0, end: 2 }];
        assert!(SequenceStore::from_boundaries(short, 5).is_err());
    }

    #[test]
    fn test_empty_store() {
        let store = SequenceStore::from_boundaries(Vec::new(), 0).unwrap();
        assert_eq!(store.sequence_of(0), None);
        assert!(!store.starts_sequence(0));
    }
}
