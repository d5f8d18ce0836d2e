//! End-to-end overlap scenarios, in memory and through on-disk indexes.

mod fixtures;

use esa_overlap::error::{EsaError, EsaResult};
use esa_overlap::esa::{find_spms, find_spms_checked, SliceStream, Spm, SpmConfig, SpmSink, TraversalOptions};
use esa_overlap::index::overlap::{find_overlaps, write_overlaps, OverlapOptions};
use esa_overlap::index::suffix_array::{BuiltSuffixArray, SuffixArrayReader};
use esa_overlap::output::SpmFormat;
use fixtures::{parse_text_spms, traversal_spms, write_index};
use std::cell::RefCell;
use tempfile::tempdir;

fn overlap_options(min_length: u64) -> OverlapOptions {
    OverlapOptions {
        config: SpmConfig::new(min_length).unwrap(),
        check_permutation: true,
        verify: true,
        silent: true,
    }
}

#[test]
fn test_two_sequences_single_overlap() {
    let spms = traversal_spms(&[b"ACGT", b"CGTA"], 3).unwrap();
    assert_eq!(spms, vec![Spm::new(0, 1, 3)]);
}

#[test]
fn test_single_sequence_has_no_partner() {
    let spms = traversal_spms(&[b"ACGTACGTAC"], 1).unwrap();
    assert!(spms.is_empty());
}

#[test]
fn test_identical_sequences_pair_every_way() {
    let spms = traversal_spms(&[b"AAAA", b"AAAA", b"AAAA"], 2).unwrap();

    let mut expected = Vec::new();
    for from in 0..3 {
        for to in 0..3 {
            if from != to {
                for length in 2..=4 {
                    expected.push(Spm::new(from, to, length));
                }
            }
        }
    }
    assert_eq!(spms, expected);
    assert!(spms.iter().all(|s| s.from != s.to));
}

/// Sink that outlives a failed run
#[derive(Debug)]
struct SharedSink<'a>(&'a RefCell<Vec<Spm>>);

impl SpmSink for SharedSink<'_> {
    fn spm(&mut self, spm: Spm) -> EsaResult<()> {
        self.0.borrow_mut().push(spm);
        Ok(())
    }
}

#[test]
fn test_duplicate_suffix_is_data_integrity() {
    let built = BuiltSuffixArray::from_sequences(&[b"ACGT", b"CGTA"]).unwrap();
    let store = built.sequence_store().unwrap();

    let mut suffixes = built.suffix_array.clone();
    suffixes[1] = suffixes[0];
    let stream = SliceStream::new(&suffixes, &built.lcp, 2).unwrap();

    let emitted = RefCell::new(Vec::new());
    let err = find_spms(
        stream,
        &store,
        SpmConfig::new(1).unwrap(),
        SharedSink(&emitted),
        TraversalOptions::default(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, EsaError::DataIntegrity { .. }), "{}", err);
    assert!(emitted.borrow().is_empty());
}

#[test]
fn test_late_duplicate_suffix_emits_nothing() {
    let built = BuiltSuffixArray::from_sequences(&[b"ACGT", b"CGTA"]).unwrap();
    let store = built.sequence_store().unwrap();

    // The overlap (0, 1, 3) closes before the duplicate is reached
    let mut suffixes = built.suffix_array.clone();
    let last = suffixes.len() - 1;
    suffixes[last] = suffixes[0];

    let emitted = RefCell::new(Vec::new());
    let err = find_spms_checked(
        || SliceStream::new(&suffixes, &built.lcp, 2),
        &store,
        SpmConfig::new(3).unwrap(),
        SharedSink(&emitted),
        TraversalOptions::default(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, EsaError::DataIntegrity { .. }), "{}", err);
    assert!(emitted.borrow().is_empty());
}

#[test]
fn test_min_length_above_every_overlap() {
    let spms = traversal_spms(&[b"ACGTAC", b"TACGGA", b"GGATTT"], 50).unwrap();
    assert!(spms.is_empty());
}

#[test]
fn test_min_length_zero_is_config_error() {
    let err = traversal_spms(&[b"ACGT", b"CGTA"], 0).unwrap_err();
    assert!(matches!(err, EsaError::Config { .. }));
}

#[test]
fn test_on_disk_matches_in_memory() {
    let sequences: [&[u8]; 5] = [b"ACGTTGCAAC", b"GCAACGTA", b"CGTATTACG", b"TTACGACGTT", b"ACGT"];
    let dir = tempdir().unwrap();
    let path = write_index(dir.path(), &sequences);

    let report = find_overlaps(&path, &overlap_options(2)).unwrap();
    assert_eq!(report.spms, traversal_spms(&sequences, 2).unwrap());
    assert_eq!(report.num_sequences, 5);
    assert_eq!(report.summary.suffixes, report.total_length);
}

#[test]
fn test_long_overlaps_survive_lcp_exceptions() {
    // Overlaps of 300 bases push LCP values through the exception list
    let shared = "ACGT".repeat(75);
    let a = format!("GGG{}", shared);
    let b = format!("{}TTT", shared);
    let dir = tempdir().unwrap();
    let path = write_index(dir.path(), &[a.as_bytes(), b.as_bytes()]);

    let reader = SuffixArrayReader::open(&path).unwrap();
    assert!(reader.meta().lcp_exceptions > 0);

    let report = find_overlaps(&path, &overlap_options(290)).unwrap();
    assert!(report.spms.contains(&Spm::new(0, 1, 300)));
    assert!(report.spms.iter().all(|s| s.length >= 290));
}

#[test]
fn test_streamed_output_matches_collected() {
    let sequences: [&[u8]; 5] = [b"ACGTTGCAAC", b"GCAACGTA", b"CGTATTACG", b"TTACGACGTT", b"ACGT"];
    let dir = tempdir().unwrap();
    let path = write_index(dir.path(), &sequences);
    let options = OverlapOptions {
        verify: false,
        ..overlap_options(2)
    };

    let mut out = Vec::new();
    let summary = write_overlaps(&path, &options, SpmFormat::Text, &mut out).unwrap();
    let mut streamed = parse_text_spms(&String::from_utf8(out).unwrap());
    streamed.sort();

    assert_eq!(streamed, traversal_spms(&sequences, 2).unwrap());
    assert_eq!(summary.matches, streamed.len() as u64);
}

#[test]
fn test_rerun_is_identical() {
    let sequences: [&[u8]; 3] = [b"TTAGGC", b"GGCTTA", b"CTTAGG"];
    let dir = tempdir().unwrap();
    let path = write_index(dir.path(), &sequences);

    let first = find_overlaps(&path, &overlap_options(2)).unwrap();
    let second = find_overlaps(&path, &overlap_options(2)).unwrap();
    assert_eq!(first.spms, second.spms);
    assert_eq!(first.summary, second.summary);
}
