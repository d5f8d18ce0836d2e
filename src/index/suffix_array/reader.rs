//! Index reader
//!
//! Provides memory-mapped access to an enhanced suffix array and streams it
//! in suffix-array order.

use super::types::*;
use crate::error::{EsaError, EsaResult};
use crate::esa::position::PositionMapper;
use crate::esa::stream::IndexStream;
use crate::esa::types::{SeqNum, StreamMeta, SuffixLcp};
use crate::index::seqstore::SequenceStore;
use crate::utils::encoding::{u64_at, SparsePairs};
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Reader for an index directory
///
/// Uses memory-mapped files for efficient access without loading
/// the entire suffix array into memory.
pub struct SuffixArrayReader {
    path: PathBuf,
    /// Memory-mapped concatenated text (absent for an empty collection)
    text_mmap: Option<Mmap>,
    /// Memory-mapped suffix array
    sa_mmap: Mmap,
    /// Memory-mapped small LCP values
    lcp_mmap: Mmap,
    /// Encoded LCP exceptions (small enough to keep in memory)
    exceptions: Vec<u8>,
    num_exceptions: u64,
    /// Sequence boundaries
    store: SequenceStore,
    meta: IndexMeta,
}

impl SuffixArrayReader {
    /// Open an index directory written by `SuffixArrayWriter`
    pub fn open(index_path: &Path) -> Result<Self> {
        let meta_path = index_path.join("meta.json");
        let meta_json = fs::read_to_string(&meta_path)
            .with_context(|| format!("Failed to read {}", meta_path.display()))?;
        let meta: IndexMeta = serde_json::from_str(&meta_json)
            .with_context(|| format!("Failed to parse {}", meta_path.display()))?;

        // Memory-map the concatenated text
        let text_file = File::open(index_path.join("seq.bin")).context("Failed to open seq.bin")?;
        let text_len = text_file.metadata()?.len();
        let text_mmap = if text_len > 0 {
            Some(unsafe { Mmap::map(&text_file)? })
        } else {
            None
        };

        // Memory-map the suffix array
        let sa_file = File::open(index_path.join("sa.bin")).context("Failed to open sa.bin")?;
        let sa_mmap = unsafe { Mmap::map(&sa_file)? };
        let sa_header = FileHeader::parse(&sa_mmap, SA_MAGIC, "sa.bin")?;

        let lcp_file = File::open(index_path.join("lcp.bin")).context("Failed to open lcp.bin")?;
        let lcp_mmap = unsafe { Mmap::map(&lcp_file)? };
        let lcp_header = FileHeader::parse(&lcp_mmap, LCP_MAGIC, "lcp.bin")?;

        let llv = fs::read(index_path.join("lcp.llv")).context("Failed to read lcp.llv")?;
        let llv_header = FileHeader::parse(&llv, LLV_MAGIC, "lcp.llv")?;
        let exceptions = llv[FileHeader::SIZE..].to_vec();

        let store = Self::read_sequence_index(&index_path.join("seq.idx"))?;

        // All arrays must describe the same text
        let n = text_len;
        if sa_header.count != n
            || lcp_header.count != n
            || store.total_length() != n
            || meta.total_length != n
        {
            anyhow::bail!(
                "Inconsistent index {}: text {} bytes, sa.bin {} entries, lcp.bin {} entries, seq.idx {} positions",
                index_path.display(),
                n,
                sa_header.count,
                lcp_header.count,
                store.total_length()
            );
        }
        if (sa_mmap.len() as u64) < FileHeader::SIZE as u64 + n * 8 {
            anyhow::bail!("Invalid sa.bin: truncated");
        }
        if (lcp_mmap.len() as u64) < FileHeader::SIZE as u64 + n {
            anyhow::bail!("Invalid lcp.bin: truncated");
        }

        Ok(Self {
            path: index_path.to_path_buf(),
            text_mmap,
            sa_mmap,
            lcp_mmap,
            exceptions,
            num_exceptions: llv_header.count,
            store,
            meta,
        })
    }

    /// Read sequence boundaries from seq.idx
    fn read_sequence_index(idx_path: &Path) -> Result<SequenceStore> {
        let data = fs::read(idx_path).context("Failed to read seq.idx")?;
        let header = SequenceIndexHeader::parse(&data)?;

        let count = usize::try_from(header.num_sequences)?;
        let mut boundaries = Vec::with_capacity(count);
        let mut offset = SequenceIndexHeader::SIZE;

        for seq in 0..count {
            let (start, end) = match (u64_at(&data, offset), u64_at(&data, offset + 8)) {
                (Some(start), Some(end)) => (start, end),
                _ => anyhow::bail!("Invalid seq.idx: truncated at sequence {}", seq),
            };
            boundaries.push(SequenceBoundary { start, end });
            offset += SEQUENCE_ENTRY_SIZE;
        }

        Ok(SequenceStore::from_boundaries(boundaries, header.total_length)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Get the full text slice
    #[inline]
    pub fn text(&self) -> &[u8] {
        self.text_mmap.as_deref().unwrap_or(&[])
    }

    pub fn sequence_store(&self) -> &SequenceStore {
        &self.store
    }

    pub fn num_sequences(&self) -> u64 {
        self.store.num_sequences()
    }

    /// Symbols of sequence `seq`, without its separator
    pub fn sequence(&self, seq: SeqNum) -> Option<&[u8]> {
        let b = self.store.boundary(seq)?;
        self.text().get(b.start as usize..b.end as usize)
    }

    /// All sequences in order
    pub fn sequences(&self) -> Vec<&[u8]> {
        (0..self.num_sequences())
            .filter_map(|seq| self.sequence(seq))
            .collect()
    }

    /// Stream the suffix and LCP arrays in suffix-array order
    pub fn stream(&self) -> IndexFileStream<'_> {
        let mut exceptions = SparsePairs::new(&self.exceptions);
        let next_exception = exceptions.next();

        IndexFileStream {
            sa: &self.sa_mmap[FileHeader::SIZE..],
            lcp: &self.lcp_mmap[FileHeader::SIZE..],
            exceptions,
            next_exception,
            exceptions_left: self.num_exceptions,
            meta: StreamMeta {
                total_length: self.store.total_length(),
                num_sequences: self.store.num_sequences(),
            },
            next: 0,
            done: false,
        }
    }
}

/// [`IndexStream`] over memory-mapped index files
pub struct IndexFileStream<'a> {
    sa: &'a [u8],
    lcp: &'a [u8],
    exceptions: SparsePairs<'a>,
    next_exception: Option<(u64, u64)>,
    exceptions_left: u64,
    meta: StreamMeta,
    next: u64,
    done: bool,
}

impl IndexFileStream<'_> {
    fn read_record(&mut self, idx: u64) -> EsaResult<SuffixLcp> {
        let suffix = u64_at(self.sa, idx as usize * 8)
            .ok_or_else(|| EsaError::invalid_format(format!("sa.bin: truncated at index {}", idx)))?;
        let byte = *self
            .lcp
            .get(idx as usize)
            .ok_or_else(|| EsaError::invalid_format(format!("lcp.bin: truncated at index {}", idx)))?;

        let lcp = if byte == LCP_ESCAPE {
            match self.next_exception {
                Some((at, value)) if at == idx => {
                    self.next_exception = self.exceptions.next();
                    self.exceptions_left = self.exceptions_left.saturating_sub(1);
                    value
                }
                _ => {
                    return Err(EsaError::invalid_format(format!(
                        "lcp.llv: no value for escaped LCP at index {}",
                        idx
                    )));
                }
            }
        } else {
            byte as u64
        };

        Ok(SuffixLcp { lcp, suffix })
    }
}

impl Iterator for IndexFileStream<'_> {
    type Item = EsaResult<SuffixLcp>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.next >= self.meta.total_length {
            self.done = true;
            if self.next_exception.is_some() || self.exceptions_left > 0 || !self.exceptions.is_exhausted() {
                return Some(Err(EsaError::invalid_format(
                    "lcp.llv: exceptions left over after the last suffix",
                )));
            }
            return None;
        }

        let idx = self.next;
        self.next += 1;
        let record = self.read_record(idx);
        if record.is_err() {
            self.done = true;
        }
        Some(record)
    }
}

impl IndexStream for IndexFileStream<'_> {
    fn meta(&self) -> StreamMeta {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::suffix_array::{BuiltSuffixArray, SuffixArrayWriter};
    use tempfile::tempdir;

    fn write_index(dir: &Path, sequences: &[Vec<u8>]) -> BuiltSuffixArray {
        let built = BuiltSuffixArray::from_sequences(sequences).unwrap();
        SuffixArrayWriter::write(dir, &built, &built.meta()).unwrap();
        built
    }

    #[test]
    fn test_stream_matches_built_arrays() {
        let temp_dir = tempdir().unwrap();
        let built = write_index(
            temp_dir.path(),
            &[b"ACGTTGCA".to_vec(), b"TGCAACG".to_vec(), b"GTTG".to_vec()],
        );

        let reader = SuffixArrayReader::open(temp_dir.path()).unwrap();
        assert_eq!(reader.num_sequences(), 3);
        assert_eq!(reader.sequence(1), Some(b"TGCAACG".as_slice()));
        assert_eq!(reader.text(), built.text.as_slice());

        let records: Vec<SuffixLcp> = reader.stream().map(|r| r.unwrap()).collect();
        let expected: Vec<SuffixLcp> = built
            .suffix_array
            .iter()
            .zip(&built.lcp)
            .map(|(&suffix, &lcp)| SuffixLcp { lcp, suffix })
            .collect();
        assert_eq!(records, expected);
    }

    #[test]
    fn test_long_lcp_values_survive() {
        let temp_dir = tempdir().unwrap();
        let long = vec![b'C'; 600];
        let built = write_index(temp_dir.path(), &[long.clone(), long]);
        assert!(built.max_lcp() >= 300);

        let reader = SuffixArrayReader::open(temp_dir.path()).unwrap();
        let lcps: Vec<u64> = reader.stream().map(|r| r.unwrap().lcp).collect();
        assert_eq!(lcps, built.lcp);
        assert_eq!(reader.meta().max_lcp, built.max_lcp());
    }

    #[test]
    fn test_empty_index() {
        let temp_dir = tempdir().unwrap();
        write_index(temp_dir.path(), &[]);

        let reader = SuffixArrayReader::open(temp_dir.path()).unwrap();
        assert_eq!(reader.num_sequences(), 0);
        assert_eq!(reader.stream().count(), 0);
    }

    #[test]
    fn test_corrupt_magic_rejected() {
        let temp_dir = tempdir().unwrap();
        write_index(temp_dir.path(), &[b"ACGT".to_vec()]);

        let sa_path = temp_dir.path().join("sa.bin");
        let mut data = fs::read(&sa_path).unwrap();
        data[0] ^= 0xFF;
        fs::write(&sa_path, data).unwrap();

        assert!(SuffixArrayReader::open(temp_dir.path()).is_err());
    }

    #[test]
    fn test_missing_exception_is_error() {
        let temp_dir = tempdir().unwrap();
        write_index(temp_dir.path(), &[b"ACGT".to_vec(), b"CGTA".to_vec()]);

        // Escape a value that has no exception entry
        let lcp_path = temp_dir.path().join("lcp.bin");
        let mut data = fs::read(&lcp_path).unwrap();
        data[FileHeader::SIZE + 1] = LCP_ESCAPE;
        fs::write(&lcp_path, data).unwrap();

        let reader = SuffixArrayReader::open(temp_dir.path()).unwrap();
        let results: Vec<EsaResult<SuffixLcp>> = reader.stream().collect();
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(EsaError::InvalidFormat { .. })));
    }
}
