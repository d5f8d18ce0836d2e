#![no_main]

use arbitrary::Arbitrary;
use esa_overlap::esa::naive::find_spms_naive;
use esa_overlap::esa::{find_spms, SpmCollector, SpmConfig, TraversalOptions};
use esa_overlap::index::suffix_array::BuiltSuffixArray;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    min_length: u8,
    sequences: Vec<Vec<u8>>,
}

fuzz_target!(|input: Input| {
    // Map arbitrary bytes onto a four-letter alphabet; drop empty reads
    let sequences: Vec<Vec<u8>> = input
        .sequences
        .iter()
        .take(16)
        .map(|s| s.iter().take(64).map(|b| b"ACGT"[(b % 4) as usize]).collect::<Vec<u8>>())
        .filter(|s| !s.is_empty())
        .collect();
    if sequences.is_empty() {
        return;
    }
    let min_length = u64::from(input.min_length % 16) + 1;

    let built = BuiltSuffixArray::from_sequences(&sequences).expect("valid sequences");
    let store = built.sequence_store().expect("valid boundaries");
    let run = find_spms(
        built.stream().expect("stream"),
        &store,
        SpmConfig::new(min_length).expect("positive min length"),
        SpmCollector::default(),
        TraversalOptions::default(),
    )
    .expect("well-formed index");

    let mut spms = run.sink.spms;
    spms.sort();
    assert_eq!(spms, find_spms_naive(&sequences, min_length));
});
