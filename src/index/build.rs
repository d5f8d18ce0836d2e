use crate::index::fasta::read_sequences;
use crate::index::suffix_array::{IndexMeta, SuffixArrayBuilder, SuffixArrayConfig, SuffixArrayWriter};
use crate::utils::progress::spinner;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default index directory for an input file: `<input>.esa` next to it
pub fn default_index_path(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "index".into());
    name.push(".esa");
    input.with_file_name(name)
}

/// Build an index from a FASTA/FASTQ file
pub fn build_index(input: &Path, output: &Path) -> Result<IndexMeta> {
    build_index_with_progress(input, output, SuffixArrayConfig::default(), false)
}

/// Build an index with optional silent mode
pub fn build_index_with_progress(
    input: &Path,
    output: &Path,
    config: SuffixArrayConfig,
    silent: bool,
) -> Result<IndexMeta> {
    log::info!("Indexing: {}", input.display());

    // Phase 1: Read sequences
    let read_spinner = spinner("Reading sequences...", silent);
    let records = read_sequences(input)?;
    read_spinner.finish_with_message(format!("Read {} sequences", records.len()));

    let mut builder = SuffixArrayBuilder::new(config);
    for record in &records {
        builder
            .add_sequence(&record.seq)
            .with_context(|| format!("Invalid sequence {:?}", record.id))?;
    }
    drop(records);

    // Phase 2: Sort suffixes and compute LCP values
    let sort_spinner = spinner("Sorting suffixes...", silent);
    let built = builder.build();
    sort_spinner.finish_with_message(format!("Sorted {} suffixes", built.suffix_array.len()));

    // Phase 3: Write index files
    let mut meta = built.meta();
    meta.source = Some(input.display().to_string());
    meta.created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let write_spinner = spinner("Writing index...", silent);
    SuffixArrayWriter::write(output, &built, &meta)
        .with_context(|| format!("Failed to write index to {}", output.display()))?;
    write_spinner.finish_with_message("Index complete");

    log::info!(
        "Indexed {} sequences ({} symbols, max lcp {}) into {}",
        meta.num_sequences,
        meta.total_length,
        meta.max_lcp,
        output.display()
    );

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::suffix_array::SuffixArrayReader;
    use tempfile::tempdir;

    #[test]
    fn test_default_index_path() {
        assert_eq!(
            default_index_path(Path::new("/data/reads.fa")),
            PathBuf::from("/data/reads.fa.esa")
        );
    }

    #[test]
    fn test_build_from_fasta() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("reads.fa");
        std::fs::write(&input, ">a\nacgt\n>b\nCGTA\n").unwrap();
        let output = dir.path().join("reads.esa");

        let meta = build_index_with_progress(&input, &output, SuffixArrayConfig::default(), true).unwrap();
        assert_eq!(meta.num_sequences, 2);
        assert_eq!(meta.total_length, 10);
        assert!(meta.created_at > 0);

        let reader = SuffixArrayReader::open(&output).unwrap();
        assert_eq!(reader.sequence(0), Some(b"ACGT".as_slice()));
        assert_eq!(reader.meta(), &meta);
    }

    #[test]
    fn test_build_missing_input() {
        let dir = tempdir().unwrap();
        let err = build_index(&dir.path().join("none.fa"), &dir.path().join("out")).unwrap_err();
        assert!(format!("{:#}", err).contains("none.fa"));
    }
}
