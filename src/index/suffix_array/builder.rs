//! Suffix and LCP array builder
//!
//! Builds an enhanced suffix array from a collection of sequences by:
//! 1. Concatenating all sequences, each followed by a separator
//! 2. Sorting all suffixes using parallel sort
//! 3. Computing the LCP array with Kasai's algorithm
//!
//! Separators compare as unique symbols, so no common prefix ever extends
//! across the end of a sequence.

use super::types::*;
use crate::error::{EsaError, EsaResult};
use crate::esa::stream::SliceStream;
use crate::esa::types::{SeqNum, StreamMeta, TextPosition};
use crate::index::seqstore::SequenceStore;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Builder for constructing suffix arrays from sequences
pub struct SuffixArrayBuilder {
    config: SuffixArrayConfig,
    /// Concatenated text (upper-cased if configured)
    text: Vec<u8>,
    /// Sequence boundaries in the concatenated text
    boundaries: Vec<SequenceBoundary>,
}

impl SuffixArrayBuilder {
    /// Create a new suffix array builder with the given configuration
    pub fn new(config: SuffixArrayConfig) -> Self {
        Self {
            config,
            text: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    /// Create a builder with default configuration
    pub fn with_defaults() -> Self {
        Self::new(SuffixArrayConfig::default())
    }

    /// Append a sequence and return its number
    pub fn add_sequence(&mut self, sequence: &[u8]) -> EsaResult<SeqNum> {
        let seq = self.boundaries.len() as SeqNum;

        if sequence.is_empty() {
            return Err(EsaError::invalid_format(format!("sequence {} is empty", seq)));
        }
        if let Some(offset) = memchr::memchr(SEPARATOR, sequence) {
            return Err(EsaError::invalid_format(format!(
                "sequence {} contains the separator byte at offset {}",
                seq, offset
            )));
        }

        let start = self.text.len() as TextPosition;
        if self.config.normalize_case {
            self.text
                .extend(sequence.iter().map(|&b| b.to_ascii_uppercase()));
        } else {
            self.text.extend_from_slice(sequence);
        }
        let end = self.text.len() as TextPosition;
        self.text.push(SEPARATOR);

        self.boundaries.push(SequenceBoundary { start, end });
        Ok(seq)
    }

    /// Sort all suffixes and compute their LCP values
    pub fn build(self) -> BuiltSuffixArray {
        let suffix_array = build_suffix_array_parallel(&self.text, self.config.parallel_threshold);
        let lcp = build_lcp_array(&self.text, &suffix_array);

        BuiltSuffixArray {
            text: self.text,
            suffix_array,
            lcp,
            boundaries: self.boundaries,
            config: self.config,
        }
    }

    /// Get the current size of accumulated text
    pub fn text_size(&self) -> usize {
        self.text.len()
    }

    /// Get the number of sequences added
    pub fn num_sequences(&self) -> usize {
        self.boundaries.len()
    }
}

/// Result of building an enhanced suffix array
pub struct BuiltSuffixArray {
    /// Concatenated sequence text, separators included
    pub text: Vec<u8>,
    /// Sorted suffix array (positions into text)
    pub suffix_array: Vec<SuffixEntry>,
    /// `lcp[i]` is the longest common prefix of suffixes `i - 1` and `i`;
    /// `lcp[0] == 0`
    pub lcp: Vec<u64>,
    /// Sequence boundaries for position-to-sequence mapping
    pub boundaries: Vec<SequenceBoundary>,
    /// Configuration used for building
    pub config: SuffixArrayConfig,
}

impl BuiltSuffixArray {
    /// Build straight from in-memory sequences with the default config
    pub fn from_sequences<T: AsRef<[u8]>>(sequences: &[T]) -> EsaResult<Self> {
        let mut builder = SuffixArrayBuilder::with_defaults();
        for sequence in sequences {
            builder.add_sequence(sequence.as_ref())?;
        }
        Ok(builder.build())
    }

    pub fn num_sequences(&self) -> u64 {
        self.boundaries.len() as u64
    }

    pub fn max_lcp(&self) -> u64 {
        self.lcp.iter().copied().max().unwrap_or(0)
    }

    /// Position mapper over this text
    pub fn sequence_store(&self) -> EsaResult<SequenceStore> {
        SequenceStore::from_boundaries(self.boundaries.clone(), self.text.len() as u64)
    }

    /// Index stream over the in-memory arrays
    pub fn stream(&self) -> EsaResult<SliceStream<'_>> {
        SliceStream::with_meta(
            &self.suffix_array,
            &self.lcp,
            StreamMeta {
                total_length: self.text.len() as u64,
                num_sequences: self.num_sequences(),
            },
        )
    }

    /// Get metadata about this index
    pub fn meta(&self) -> IndexMeta {
        let lengths = self.boundaries.iter().map(|b| b.len());
        IndexMeta {
            version: SA_VERSION,
            total_length: self.text.len() as u64,
            num_sequences: self.num_sequences(),
            min_sequence_length: lengths.clone().min().unwrap_or(0),
            max_sequence_length: lengths.max().unwrap_or(0),
            max_lcp: self.max_lcp(),
            lcp_exceptions: self
                .lcp
                .iter()
                .filter(|&&v| v >= LCP_ESCAPE as u64)
                .count() as u64,
            normalize_case: self.config.normalize_case,
            source: None,
            created_at: 0,
        }
    }
}

/// Build suffix array using parallel sort
///
/// Time: O(n log n) comparisons, each bounded by the distance to the next
/// separator
fn build_suffix_array_parallel(text: &[u8], parallel_threshold: usize) -> Vec<SuffixEntry> {
    let n = text.len();

    // Create initial array of positions
    let mut sa: Vec<SuffixEntry> = (0..n as SuffixEntry).collect();

    if n > parallel_threshold {
        sa.par_sort_unstable_by(|&a, &b| compare_suffixes(text, a as usize, b as usize));
    } else {
        sa.sort_unstable_by(|&a, &b| compare_suffixes(text, a as usize, b as usize));
    }

    sa
}

/// Compare two suffixes lexicographically
///
/// A separator is greater than every other byte; two separators compare by
/// their text positions.
#[inline]
fn compare_suffixes(text: &[u8], a: usize, b: usize) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut offset = 0;
    loop {
        let (ia, ib) = (a + offset, b + offset);
        match (text.get(ia), text.get(ib)) {
            (Some(&ca), Some(&cb)) => match (ca == SEPARATOR, cb == SEPARATOR) {
                (true, true) => return ia.cmp(&ib),
                (true, false) => return Ordering::Greater,
                (false, true) => return Ordering::Less,
                (false, false) if ca != cb => return ca.cmp(&cb),
                (false, false) => {}
            },
            // Only reachable for texts without a closing separator
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return a.cmp(&b),
        }
        offset += 1;
    }
}

/// Kasai's linear-time LCP construction
///
/// Matches stop at the first separator, which never equals another position's
/// separator.
fn build_lcp_array(text: &[u8], sa: &[SuffixEntry]) -> Vec<u64> {
    let n = sa.len();
    let mut rank = vec![0usize; n];
    for (i, &suffix) in sa.iter().enumerate() {
        rank[suffix as usize] = i;
    }

    let mut lcp = vec![0u64; n];
    let mut h = 0usize;
    for pos in 0..n {
        let r = rank[pos];
        if r == 0 {
            h = 0;
            continue;
        }

        let prev = sa[r - 1] as usize;
        while pos + h < n
            && prev + h < n
            && text[pos + h] == text[prev + h]
            && text[pos + h] != SEPARATOR
        {
            h += 1;
        }
        lcp[r] = h as u64;
        h = h.saturating_sub(1);
    }

    lcp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esa::position::PositionMapper;

    fn naive_lcp(text: &[u8], a: usize, b: usize) -> u64 {
        text[a..]
            .iter()
            .zip(&text[b..])
            .take_while(|(x, y)| x == y && **x != SEPARATOR)
            .count() as u64
    }

    #[test]
    fn test_build_simple() {
        let mut builder = SuffixArrayBuilder::with_defaults();
        builder.add_sequence(b"banana").unwrap();
        let built = builder.build();

        assert_eq!(built.boundaries.len(), 1);
        assert_eq!(built.text, b"BANANA\x00");
    }

    #[test]
    fn test_suffix_array_correctness() {
        let built = BuiltSuffixArray::from_sequences(&[b"BANANA"]).unwrap();

        // Separator sorts last:
        // 1: ANANA$  3: ANA$  5: A$  0: BANANA$  2: NANA$  4: NA$  6: $
        assert_eq!(built.suffix_array, vec![1, 3, 5, 0, 2, 4, 6]);
        assert_eq!(built.lcp, vec![0, 3, 1, 0, 0, 2, 0]);
        assert_eq!(built.max_lcp(), 3);
    }

    #[test]
    fn test_separators_ordered_by_position() {
        let built = BuiltSuffixArray::from_sequences(&[b"A", b"A"]).unwrap();

        // A$1 < A$3 < $1 < $3
        assert_eq!(built.suffix_array, vec![0, 2, 1, 3]);
        assert_eq!(built.lcp, vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_lcp_matches_naive() {
        let built = BuiltSuffixArray::from_sequences(&[
            b"ACGTACGTTA".as_slice(),
            b"CGTACG",
            b"TTTT",
            b"ACGTACGTTA",
        ])
        .unwrap();

        for i in 1..built.suffix_array.len() {
            let a = built.suffix_array[i - 1] as usize;
            let b = built.suffix_array[i] as usize;
            assert_eq!(built.lcp[i], naive_lcp(&built.text, a, b), "index {}", i);
            assert_eq!(compare_suffixes(&built.text, a, b), Ordering::Less);
        }
    }

    #[test]
    fn test_parallel_sort_agrees() {
        let text = b"GATTACA\x00TACAGAT\x00CATTAG\x00";
        let serial = build_suffix_array_parallel(text, usize::MAX);
        let parallel = build_suffix_array_parallel(text, 0);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_invalid_sequences() {
        let mut builder = SuffixArrayBuilder::with_defaults();
        assert!(builder.add_sequence(b"").is_err());
        assert!(builder.add_sequence(b"AC\x00GT").is_err());
        assert_eq!(builder.add_sequence(b"acgt").unwrap(), 0);
        assert_eq!(builder.num_sequences(), 1);
        assert_eq!(builder.text_size(), 5);
    }

    #[test]
    fn test_multiple_sequences() {
        let built = BuiltSuffixArray::from_sequences(&[b"hello".as_slice(), b"world", b"foo"]).unwrap();

        // 5 + 1 + 5 + 1 + 3 + 1 = 16
        assert_eq!(built.text.len(), 16);
        assert_eq!(built.boundaries[1], SequenceBoundary { start: 6, end: 11 });
        assert_eq!(built.boundaries[2], SequenceBoundary { start: 12, end: 15 });

        let store = built.sequence_store().unwrap();
        assert_eq!(store.sequence_of(11), Some(1));
        assert_eq!(store.sequence_of(12), Some(2));

        let meta = built.meta();
        assert_eq!(meta.num_sequences, 3);
        assert_eq!(meta.min_sequence_length, 3);
        assert_eq!(meta.max_sequence_length, 5);
    }

    #[test]
    fn test_empty_collection() {
        let built = SuffixArrayBuilder::with_defaults().build();
        assert!(built.suffix_array.is_empty());
        assert!(built.lcp.is_empty());
        assert_eq!(built.stream().unwrap().count(), 0);
    }
}
