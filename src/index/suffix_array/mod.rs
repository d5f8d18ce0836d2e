//! Enhanced suffix array module
//!
//! Builds, stores and streams the suffix array and LCP array of a sequence
//! collection.
//!
//! ## Architecture
//!
//! - `builder`: Constructs suffix and LCP arrays from sequences
//! - `writer`: Persists them to disk
//! - `reader`: Memory-mapped reading, exposed as an index stream
//! - `types`: Headers, boundaries and metadata
//!
//! ## File Format
//!
//! Per index directory:
//! - `seq.bin`: Concatenated sequences, each followed by a separator
//! - `seq.idx`: Sequence boundary index for position-to-sequence mapping
//! - `sa.bin`: The sorted suffix array (positions into seq.bin)
//! - `lcp.bin`: One byte per LCP value, `255` escapes to `lcp.llv`
//! - `lcp.llv`: Varint `(index delta, value)` pairs for large LCP values
//! - `meta.json`: Index metadata

pub mod builder;
pub mod reader;
pub mod types;
pub mod writer;

// Re-exports for convenience
pub use builder::{BuiltSuffixArray, SuffixArrayBuilder};
pub use reader::{IndexFileStream, SuffixArrayReader};
pub use types::{IndexMeta, SequenceBoundary, SuffixArrayConfig, SEPARATOR};
pub use writer::SuffixArrayWriter;
