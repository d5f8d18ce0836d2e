//! Overlap runs over on-disk indexes
//!
//! [`write_overlaps`] streams matches to a writer as the traversal finds
//! them, so memory stays bounded by the working sets. [`find_overlaps`]
//! collects and sorts them, which the brute-force cross-check needs.

use crate::esa::bottomup::{LcpIntervalTraversal, TraversalOptions, TraversalSummary};
use crate::esa::naive::find_spms_naive;
use crate::esa::spm::{find_spms, find_spms_checked, SpmCollector, SpmConfig, SpmStats};
use crate::esa::stream::Tick;
use crate::esa::types::{Edge, SeqNum, Spm};
use crate::esa::BottomUpVisitor;
use crate::error::EsaResult;
use crate::index::suffix_array::SuffixArrayReader;
use crate::output::{SpmFormat, SpmWriter};
use crate::utils::progress::suffix_bar;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Indexes above this many sequences are not cross-checked
pub const VERIFY_LIMIT: u64 = 5_000;

/// Records between progress bar updates
const TICK: u64 = 1 << 16;

/// Options for one overlap run
#[derive(Debug, Clone, Copy)]
pub struct OverlapOptions {
    pub config: SpmConfig,
    pub check_permutation: bool,
    /// Cross-check the result against the brute-force finder
    pub verify: bool,
    pub silent: bool,
}

impl OverlapOptions {
    fn traversal(&self, total_length: u64) -> TraversalOptions {
        TraversalOptions {
            check_permutation: self.check_permutation,
            total_length: Some(total_length),
        }
    }
}

/// Outcome of one overlap run with its matches in memory
#[derive(Debug)]
pub struct OverlapReport {
    pub index: PathBuf,
    pub num_sequences: u64,
    pub total_length: u64,
    /// Sorted by `(from, to, length)`
    pub spms: Vec<Spm>,
    pub contained: Vec<SeqNum>,
    pub stats: SpmStats,
    pub summary: TraversalSummary,
}

/// Outcome of one overlap run whose matches went to a writer
#[derive(Debug)]
pub struct OverlapSummary {
    pub index: PathBuf,
    pub num_sequences: u64,
    pub matches: u64,
    pub contained: Vec<SeqNum>,
    pub stats: SpmStats,
    pub summary: TraversalSummary,
}

impl From<OverlapReport> for OverlapSummary {
    fn from(report: OverlapReport) -> Self {
        Self {
            index: report.index,
            num_sequences: report.num_sequences,
            matches: report.spms.len() as u64,
            contained: report.contained,
            stats: report.stats,
            summary: report.summary,
        }
    }
}

fn open_index(index_path: &Path) -> Result<SuffixArrayReader> {
    SuffixArrayReader::open(index_path)
        .with_context(|| format!("Failed to open index {}", index_path.display()))
}

/// Find all suffix-prefix matches in one index
pub fn find_overlaps(index_path: &Path, options: &OverlapOptions) -> Result<OverlapReport> {
    let reader = open_index(index_path)?;
    let total_length = reader.meta().total_length;

    let pb = suffix_bar(total_length, "Traversing suffixes", options.silent);
    let stream = Tick::new(reader.stream(), TICK, |n| pb.inc(n));

    let run = find_spms(
        stream,
        reader.sequence_store(),
        options.config,
        SpmCollector::default(),
        options.traversal(total_length),
    )
    .with_context(|| format!("Overlap detection failed for {}", index_path.display()))?;
    pb.finish_and_clear();

    let mut spms = run.sink.spms;
    spms.sort_unstable();

    if options.verify {
        verify_against_naive(&reader, options.config.min_length, &spms)?;
    }

    log::info!(
        "{}: {} matches of length >= {} among {} sequences",
        index_path.display(),
        spms.len(),
        options.config.min_length,
        reader.num_sequences()
    );

    Ok(OverlapReport {
        index: index_path.to_path_buf(),
        num_sequences: reader.num_sequences(),
        total_length,
        spms,
        contained: run.sink.contained,
        stats: run.stats,
        summary: run.summary,
    })
}

/// Stream all suffix-prefix matches of one index to `out`
///
/// Matches arrive in traversal order. The index is checked in a first pass,
/// so nothing is written for an index that fails. With `verify` the matches
/// are collected and written sorted instead.
pub fn write_overlaps<W: Write>(
    index_path: &Path,
    options: &OverlapOptions,
    format: SpmFormat,
    out: W,
) -> Result<OverlapSummary> {
    if options.verify {
        let report = find_overlaps(index_path, options)?;
        let mut writer = SpmWriter::new(out, format, report.total_length);
        for spm in &report.spms {
            writer.write(spm)?;
        }
        writer.finish()?;
        return Ok(report.into());
    }

    let reader = open_index(index_path)?;
    let total_length = reader.meta().total_length;

    // Sequence numbers and lengths are both bounded by the text length
    let writer = SpmWriter::new(out, format, total_length);
    let pb = suffix_bar(2 * total_length, "Traversing suffixes", options.silent);

    let run = {
        let (reader, pb) = (&reader, &pb);
        find_spms_checked(
            move || Ok(Tick::new(reader.stream(), TICK, move |n| pb.inc(n))),
            reader.sequence_store(),
            options.config,
            writer,
            options.traversal(total_length),
        )
    }
    .with_context(|| format!("Overlap detection failed for {}", index_path.display()))?;
    pb.finish_and_clear();

    let mut writer = run.sink;
    let contained = writer.take_contained();
    let matches = writer.count();
    writer.finish()?;

    log::info!(
        "{}: {} matches of length >= {} among {} sequences",
        index_path.display(),
        matches,
        options.config.min_length,
        reader.num_sequences()
    );

    Ok(OverlapSummary {
        index: index_path.to_path_buf(),
        num_sequences: reader.num_sequences(),
        matches,
        contained,
        stats: run.stats,
        summary: run.summary,
    })
}

/// [`write_overlaps`] into a new file, removed again if the run fails
pub fn write_overlap_file(
    index_path: &Path,
    output: &Path,
    options: &OverlapOptions,
    format: SpmFormat,
) -> Result<OverlapSummary> {
    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let result = write_overlaps(index_path, options, format, BufWriter::new(file));
    if result.is_err() {
        let _ = fs::remove_file(output);
    }
    result
}

/// Run [`write_overlap_file`] for `(index, output)` pairs in parallel;
/// summaries come back in argument order
pub fn write_overlap_files(
    jobs: &[(PathBuf, PathBuf)],
    options: &OverlapOptions,
    format: SpmFormat,
) -> Result<Vec<OverlapSummary>> {
    let mut options = *options;
    if jobs.len() > 1 {
        // Interleaved bars from parallel runs are unreadable
        options.silent = true;
    }

    jobs.par_iter()
        .map(|(index, output)| write_overlap_file(index, output, &options, format))
        .collect()
}

fn verify_against_naive(reader: &SuffixArrayReader, min_length: u64, spms: &[Spm]) -> Result<()> {
    if reader.num_sequences() > VERIFY_LIMIT {
        log::warn!(
            "skipping verification: {} sequences exceed the limit of {}",
            reader.num_sequences(),
            VERIFY_LIMIT
        );
        return Ok(());
    }

    let expected = find_spms_naive(&reader.sequences(), min_length);
    if expected.as_slice() != spms {
        let missing = expected.iter().filter(|s| spms.binary_search(s).is_err()).count();
        let extra = spms.iter().filter(|s| expected.binary_search(s).is_err()).count();
        anyhow::bail!(
            "Verification failed for {}: {} matches missing, {} unexpected",
            reader.path().display(),
            missing,
            extra
        );
    }

    log::info!("verified {} matches against brute force", spms.len());
    Ok(())
}

/// Visitor printing every closed interval as `lcp lb rb`
struct IntervalPrinter<W: Write> {
    out: W,
    count: u64,
}

impl<W: Write> BottomUpVisitor for IntervalPrinter<W> {
    type Info = ();

    fn visit(&mut self, edge: Edge<'_, ()>) -> EsaResult<()> {
        if let Edge::Close { interval } = edge {
            writeln!(self.out, "{} {} {}", interval.lcp, interval.lb, interval.rb)?;
            self.count += 1;
        }
        Ok(())
    }
}

/// Write every lcp-interval of an index in closing order; returns the count
pub fn write_intervals<W: Write>(index_path: &Path, out: W) -> Result<u64> {
    let reader = SuffixArrayReader::open(index_path)
        .with_context(|| format!("Failed to open index {}", index_path.display()))?;

    let printer = IntervalPrinter { out, count: 0 };
    let (mut printer, _) = LcpIntervalTraversal::new(printer, TraversalOptions::default())
        .run(reader.stream())
        .with_context(|| format!("Traversal failed for {}", index_path.display()))?;
    printer.out.flush()?;
    Ok(printer.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::suffix_array::{BuiltSuffixArray, SuffixArrayWriter};
    use crate::output::read_spm_list;
    use tempfile::tempdir;

    fn index_of(dir: &Path, sequences: &[&[u8]]) -> PathBuf {
        let built = BuiltSuffixArray::from_sequences(sequences).unwrap();
        SuffixArrayWriter::write(dir, &built, &built.meta()).unwrap();
        dir.to_path_buf()
    }

    fn options(min_length: u64) -> OverlapOptions {
        OverlapOptions {
            config: SpmConfig::new(min_length).unwrap().with_contained(true),
            check_permutation: true,
            verify: true,
            silent: true,
        }
    }

    #[test]
    fn test_find_overlaps_verified() {
        let dir = tempdir().unwrap();
        let path = index_of(dir.path(), &[b"ACGTTGCA", b"TGCAACG", b"ACGACGT", b"GTTG"]);

        let report = find_overlaps(&path, &options(2)).unwrap();
        assert_eq!(report.num_sequences, 4);
        assert!(!report.spms.is_empty());
        assert!(report.spms.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(report.contained, vec![3]);
    }

    #[test]
    fn test_write_overlaps_streams_every_match() {
        let dir = tempdir().unwrap();
        let seqs: [&[u8]; 4] = [b"ACGTTGCA", b"TGCAACG", b"ACGACGT", b"GTTG"];
        let path = index_of(dir.path(), &seqs);
        let mut opts = options(2);
        opts.verify = false;

        let mut out = Vec::new();
        let summary = write_overlaps(&path, &opts, SpmFormat::Binary, &mut out).unwrap();

        let mut spms = read_spm_list(out.as_slice(), 0).unwrap();
        spms.sort();
        assert_eq!(spms, find_spms_naive(&seqs, 2));
        assert_eq!(summary.matches, spms.len() as u64);
        assert_eq!(summary.contained, vec![3]);
    }

    #[test]
    fn test_write_overlaps_verified_is_sorted() {
        let dir = tempdir().unwrap();
        let path = index_of(dir.path(), &[b"ACGTTGCA", b"TGCAACG", b"GTTG"]);

        let mut out = Vec::new();
        let summary = write_overlaps(&path, &options(2), SpmFormat::Text, &mut out).unwrap();
        let spms = read_spm_list(out.as_slice(), 0).unwrap();
        assert!(spms.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(summary.matches, spms.len() as u64);
    }

    /// Overwrite the last suffix array entry with the first one
    fn duplicate_last_suffix(index: &Path, n: usize) {
        let sa_path = index.join("sa.bin");
        let mut data = fs::read(&sa_path).unwrap();
        let base = data.len() - 8 * n;
        let first: Vec<u8> = data[base..base + 8].to_vec();
        let len = data.len();
        data[len - 8..].copy_from_slice(&first);
        fs::write(&sa_path, data).unwrap();
    }

    #[test]
    fn test_corrupt_index_writes_nothing() {
        let dir = tempdir().unwrap();
        let path = index_of(dir.path(), &[b"ACGT", b"CGTA"]);
        duplicate_last_suffix(&path, 10);
        let mut opts = options(3);
        opts.verify = false;

        let mut out = Vec::new();
        let err = write_overlaps(&path, &opts, SpmFormat::Binary, &mut out).unwrap_err();
        assert!(format!("{:#}", err).contains("appears twice"), "{:#}", err);
        assert!(out.is_empty());

        let list = dir.path().join("pair.spm");
        assert!(write_overlap_file(&path, &list, &opts, SpmFormat::Text).is_err());
        assert!(!list.exists());
    }

    #[test]
    fn test_overlap_files_keep_order() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let out = tempdir().unwrap();
        let jobs = vec![
            (index_of(a.path(), &[b"ACGT", b"CGTA"]), out.path().join("a.spm")),
            (index_of(b.path(), &[b"AAAA", b"AAAA"]), out.path().join("b.spm")),
        ];

        let summaries = write_overlap_files(&jobs, &options(3), SpmFormat::Text).unwrap();
        assert_eq!(summaries[0].matches, 1);
        assert_eq!(summaries[1].matches, 4);
        assert_eq!(summaries[1].index, jobs[1].0);
        assert_eq!(fs::read_to_string(&jobs[0].1).unwrap(), "0 1 3\n");
    }

    #[test]
    fn test_missing_index() {
        let dir = tempdir().unwrap();
        assert!(find_overlaps(&dir.path().join("nope"), &options(3)).is_err());
    }

    #[test]
    fn test_write_intervals() {
        let dir = tempdir().unwrap();
        let path = index_of(dir.path(), &[b"BANANA"]);

        let mut out = Vec::new();
        let count = write_intervals(&path, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        // ANA, A, NA, root
        assert_eq!(count, 4);
        assert_eq!(text, "3 0 2\n1 0 3\n2 4 6\n0 0 7\n");
    }
}
