//! On-disk enhanced suffix array indexes
//!
//! - [`fasta`] - sequence input
//! - [`suffix_array`] - building, writing and reading index files
//! - [`seqstore`] - sequence boundaries of an indexed collection
//! - [`build`] - FASTA to index pipeline
//! - [`overlap`] - overlap runs over stored indexes
//! - [`stats`] - index statistics

pub mod build;
pub mod fasta;
pub mod overlap;
pub mod seqstore;
pub mod stats;
pub mod suffix_array;

pub use build::{build_index, build_index_with_progress, default_index_path};
pub use overlap::{
    find_overlaps, write_intervals, write_overlap_file, write_overlap_files, write_overlaps, OverlapOptions,
    OverlapReport, OverlapSummary,
};
pub use seqstore::SequenceStore;
