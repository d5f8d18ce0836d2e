//! Index writer
//!
//! Writes the enhanced suffix array to an index directory in a format
//! optimized for memory-mapped reading.

use super::builder::BuiltSuffixArray;
use super::types::*;
use crate::utils::encoding::{encode_sparse_pairs, write_u64_le};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes index files to a directory
pub struct SuffixArrayWriter;

impl SuffixArrayWriter {
    /// Write all index files to `index_path`, creating it if needed
    ///
    /// Creates:
    /// - seq.bin: Concatenated sequence text
    /// - seq.idx: Sequence boundary index
    /// - sa.bin: The suffix array itself
    /// - lcp.bin / lcp.llv: LCP values, large ones as exceptions
    /// - meta.json: Index metadata
    pub fn write(index_path: &Path, built: &BuiltSuffixArray, meta: &IndexMeta) -> Result<()> {
        fs::create_dir_all(index_path)
            .with_context(|| format!("Failed to create {}", index_path.display()))?;

        Self::write_text(index_path, &built.text)?;
        Self::write_sequence_index(index_path, &built.boundaries, built.text.len() as u64)?;
        Self::write_suffix_array(index_path, &built.suffix_array)?;
        Self::write_lcp(index_path, &built.lcp)?;
        Self::write_meta(index_path, meta)?;

        log::debug!(
            "wrote index with {} suffixes to {}",
            built.suffix_array.len(),
            index_path.display()
        );
        Ok(())
    }

    /// Write concatenated text to seq.bin
    fn write_text(index_path: &Path, text: &[u8]) -> Result<()> {
        let path = index_path.join("seq.bin");
        let mut file = BufWriter::with_capacity(65536, File::create(&path)?);
        file.write_all(text)?;
        file.flush()?;
        Ok(())
    }

    /// Write sequence boundaries to seq.idx
    fn write_sequence_index(
        index_path: &Path,
        boundaries: &[SequenceBoundary],
        total_length: u64,
    ) -> Result<()> {
        let path = index_path.join("seq.idx");
        let mut file = BufWriter::with_capacity(65536, File::create(&path)?);

        SequenceIndexHeader::new(boundaries.len() as u64, total_length).write_to(&mut file)?;
        for boundary in boundaries {
            write_u64_le(&mut file, boundary.start)?;
            write_u64_le(&mut file, boundary.end)?;
        }

        file.flush()?;
        Ok(())
    }

    /// Write suffix array to sa.bin
    fn write_suffix_array(index_path: &Path, sa: &[SuffixEntry]) -> Result<()> {
        let path = index_path.join("sa.bin");
        let mut file = BufWriter::with_capacity(65536, File::create(&path)?);

        FileHeader::new(SA_MAGIC, sa.len() as u64).write_to(&mut file)?;

        // Using a buffer to reduce system call overhead
        let mut buffer = Vec::with_capacity(8 * 1024); // 1024 entries at a time
        for &entry in sa {
            buffer.extend_from_slice(&entry.to_le_bytes());
            if buffer.len() >= 8 * 1024 {
                file.write_all(&buffer)?;
                buffer.clear();
            }
        }
        if !buffer.is_empty() {
            file.write_all(&buffer)?;
        }

        file.flush()?;
        Ok(())
    }

    /// Write one byte per LCP value to lcp.bin and values that do not fit
    /// below the escape byte to lcp.llv
    fn write_lcp(index_path: &Path, lcp: &[u64]) -> Result<()> {
        let mut small = Vec::with_capacity(lcp.len());
        let mut exceptions = Vec::new();
        for (idx, &value) in lcp.iter().enumerate() {
            if value >= LCP_ESCAPE as u64 {
                small.push(LCP_ESCAPE);
                exceptions.push((idx as u64, value));
            } else {
                small.push(value as u8);
            }
        }

        let mut file = BufWriter::with_capacity(65536, File::create(index_path.join("lcp.bin"))?);
        FileHeader::new(LCP_MAGIC, lcp.len() as u64).write_to(&mut file)?;
        file.write_all(&small)?;
        file.flush()?;

        let mut encoded = Vec::new();
        encode_sparse_pairs(&exceptions, &mut encoded);
        let mut file = BufWriter::new(File::create(index_path.join("lcp.llv"))?);
        FileHeader::new(LLV_MAGIC, exceptions.len() as u64).write_to(&mut file)?;
        file.write_all(&encoded)?;
        file.flush()?;

        Ok(())
    }

    fn write_meta(index_path: &Path, meta: &IndexMeta) -> Result<()> {
        let path = index_path.join("meta.json");
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encoding::u32_at;
    use tempfile::tempdir;

    #[test]
    fn test_write_index_files() {
        let temp_dir = tempdir().unwrap();
        let index_path = temp_dir.path().join("reads.esa");

        let built = BuiltSuffixArray::from_sequences(&[b"acgt".as_slice(), b"cgta"]).unwrap();
        SuffixArrayWriter::write(&index_path, &built, &built.meta()).unwrap();

        for name in ["seq.bin", "seq.idx", "sa.bin", "lcp.bin", "lcp.llv", "meta.json"] {
            assert!(index_path.join(name).exists(), "{} missing", name);
        }

        let text = fs::read(index_path.join("seq.bin")).unwrap();
        assert_eq!(&text[..5], b"ACGT\x00");

        let sa_data = fs::read(index_path.join("sa.bin")).unwrap();
        assert_eq!(u32_at(&sa_data, 0), Some(SA_MAGIC));
        assert_eq!(sa_data.len(), FileHeader::SIZE + 10 * 8);

        let lcp_data = fs::read(index_path.join("lcp.bin")).unwrap();
        assert_eq!(lcp_data.len(), FileHeader::SIZE + 10);
    }

    #[test]
    fn test_long_lcp_goes_to_exceptions() {
        let temp_dir = tempdir().unwrap();
        let long = vec![b'A'; 300];
        let built = BuiltSuffixArray::from_sequences(&[long.clone(), long]).unwrap();
        SuffixArrayWriter::write(temp_dir.path(), &built, &built.meta()).unwrap();

        let lcp_data = fs::read(temp_dir.path().join("lcp.bin")).unwrap();
        let escapes = lcp_data[FileHeader::SIZE..]
            .iter()
            .filter(|&&b| b == LCP_ESCAPE)
            .count() as u64;
        assert!(escapes > 0);
        assert_eq!(escapes, built.meta().lcp_exceptions);

        let llv = fs::read(temp_dir.path().join("lcp.llv")).unwrap();
        let header = FileHeader::parse(&llv, LLV_MAGIC, "lcp.llv").unwrap();
        assert_eq!(header.count, escapes);
    }
}
