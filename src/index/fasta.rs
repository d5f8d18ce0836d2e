//! FASTA/FASTQ ingestion
//!
//! Parsing goes through needletail, which also detects gzip-compressed
//! input. Records with an empty sequence are skipped.

use anyhow::{Context, Result};
use needletail::{parse_fastx_file, parse_fastx_reader, FastxReader};
use std::io::Read;
use std::path::Path;

/// One input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub id: String,
    pub seq: Vec<u8>,
}

/// Read every non-empty record of a FASTA/FASTQ file
pub fn read_sequences(path: &Path) -> Result<Vec<SequenceRecord>> {
    let reader = parse_fastx_file(path)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Failed to open {}", path.display()))?;
    collect_records(reader, &path.display().to_string())
}

/// Read every non-empty record from any FASTA/FASTQ source
pub fn read_sequences_from<R: Read + Send>(reader: R) -> Result<Vec<SequenceRecord>> {
    let reader = parse_fastx_reader(reader)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Failed to read sequence input")?;
    collect_records(reader, "input")
}

fn collect_records(mut reader: Box<dyn FastxReader + '_>, source: &str) -> Result<Vec<SequenceRecord>> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    while let Some(record) = reader.next() {
        let record = record
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to parse record {} of {}", records.len() + skipped + 1, source))?;

        let id = String::from_utf8_lossy(record.id()).to_string();
        let seq = record.seq().to_vec();
        if seq.is_empty() {
            log::warn!("skipping empty record {:?} in {}", id, source);
            skipped += 1;
            continue;
        }

        records.push(SequenceRecord { id, seq });
    }

    log::debug!("read {} records from {} ({} empty)", records.len(), source, skipped);
    Ok(records)
}
