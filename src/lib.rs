//! # esa-overlap - Suffix-prefix matches from enhanced suffix arrays
//!
//! Finds all exact suffix-prefix matches (SPMs) of at least a minimum length
//! between the sequences of a collection, the overlap step of string-graph
//! genome assembly. The collection is indexed once as an enhanced suffix
//! array (suffix array plus LCP table); a single bottom-up pass over its
//! lcp-intervals then reports every match without comparing sequences
//! pairwise.
//!
//! ## Architecture
//!
//! - [`esa`] - Bottom-up lcp-interval traversal and SPM extraction (I/O free)
//! - [`index`] - FASTA ingestion, index construction, mmap reader, overlap runs
//! - [`output`] - SPM list formats (text and binary)
//! - [`error`] - Error taxonomy of the core
//! - [`utils`] - Configuration, varint encoding, progress bars
//!
//! ## Quick Start
//!
//! ```no_run
//! use esa_overlap::esa::{find_spms, SpmCollector, SpmConfig, TraversalOptions};
//! use esa_overlap::index::suffix_array::BuiltSuffixArray;
//!
//! let built = BuiltSuffixArray::from_sequences(&[b"ACGTT".as_slice(), b"GTTCA"])?;
//! let store = built.sequence_store()?;
//! let run = find_spms(
//!     built.stream()?,
//!     &store,
//!     SpmConfig::new(3)?,
//!     SpmCollector::default(),
//!     TraversalOptions::default(),
//! )?;
//!
//! for spm in &run.sink.spms {
//!     println!("{} {} {}", spm.from, spm.to, spm.length);
//! }
//! # Ok::<(), esa_overlap::error::EsaError>(())
//! ```
//!
//! ## Traversal
//!
//! The suffix array is consumed as a stream of `(lcp, suffix)` records.
//! A stack of open lcp-intervals turns the stream into leaf, branch and
//! close events; the SPM extractor keeps two working sets over those events
//! (sequences starting at a node and sequences ending at it) and pairs them
//! when an interval of sufficient depth closes. Memory is bounded by the
//! stack depth and the working sets, never by the number of pairs.

pub mod error;
pub mod esa;
pub mod index;
pub mod output;
pub mod utils;
