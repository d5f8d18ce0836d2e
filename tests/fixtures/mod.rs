//! Shared helpers for the integration tests

#![allow(dead_code)]

use esa_overlap::error::EsaResult;
use esa_overlap::esa::{find_spms, Spm, SpmCollector, SpmConfig, TraversalOptions};
use esa_overlap::index::suffix_array::{BuiltSuffixArray, SuffixArrayWriter};
use std::fs;
use std::path::{Path, PathBuf};

/// Build an index of `sequences` and write it to `dir`
pub fn write_index<T: AsRef<[u8]>>(dir: &Path, sequences: &[T]) -> PathBuf {
    let built = BuiltSuffixArray::from_sequences(sequences).expect("build index");
    SuffixArrayWriter::write(dir, &built, &built.meta()).expect("write index");
    dir.to_path_buf()
}

/// Write `sequences` as a FASTA file named `name` inside `dir`
pub fn write_fasta<T: AsRef<[u8]>>(dir: &Path, name: &str, sequences: &[T]) -> PathBuf {
    let mut content = Vec::new();
    for (i, seq) in sequences.iter().enumerate() {
        content.extend_from_slice(format!(">read{}\n", i).as_bytes());
        content.extend_from_slice(seq.as_ref());
        content.push(b'\n');
    }
    let path = dir.join(name);
    fs::write(&path, content).expect("write fasta");
    path
}

/// All matches of `sequences` found by the traversal, sorted
pub fn traversal_spms<T: AsRef<[u8]>>(sequences: &[T], min_length: u64) -> EsaResult<Vec<Spm>> {
    let built = BuiltSuffixArray::from_sequences(sequences)?;
    let store = built.sequence_store()?;
    let run = find_spms(
        built.stream()?,
        &store,
        SpmConfig::new(min_length)?,
        SpmCollector::default(),
        TraversalOptions::default(),
    )?;

    let mut spms = run.sink.spms;
    spms.sort();
    Ok(spms)
}

/// Parse `from to length` lines, skipping comments
pub fn parse_text_spms(text: &str) -> Vec<Spm> {
    text.lines()
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let fields: Vec<u64> = line
                .split_whitespace()
                .map(|f| f.parse().expect("numeric field"))
                .collect();
            Spm::new(fields[0], fields[1], fields[2])
        })
        .collect()
}
