//! Bottom-up traversal of enhanced suffix arrays
//!
//! - [`stream`] - the `(lcp, suffix)` record stream the traversal consumes
//! - [`bottomup`] - stack-based lcp-interval traversal emitting edge events
//! - [`position`] - text position to sequence mapping
//! - [`spm`] - suffix-prefix match extraction on top of the traversal
//! - [`naive`] - brute-force reference finders

pub mod bottomup;
pub mod naive;
pub mod position;
pub mod spm;
pub mod stream;
pub mod types;

pub use bottomup::{BottomUpVisitor, EdgeLog, LcpIntervalTraversal, TraversalOptions, TraversalSummary};
pub use position::PositionMapper;
pub use spm::{find_spms, find_spms_checked, find_spms_parallel, SpmCollector, SpmConfig, SpmExtractor, SpmRun, SpmSink, SpmStats};
pub use stream::{IndexStream, SliceStream};
pub use types::*;
