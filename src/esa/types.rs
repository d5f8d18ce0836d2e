//! Types for the bottom-up traversal
//!
//! These are the value types shared by the index stream, the lcp-interval
//! traversal and the suffix-prefix match extractor.

use std::ops::Range;

/// Position in the concatenated text
pub type TextPosition = u64;

/// Sequence number (0-based, in input order)
pub type SeqNum = u64;

/// `rb` of an interval that is still on the stack
pub const OPEN_RB: u64 = u64::MAX;

/// One suffix-array entry together with its LCP to the previous entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuffixLcp {
    /// Longest common prefix with the previous suffix (ignored for index 0)
    pub lcp: u64,
    /// Text position of the suffix
    pub suffix: TextPosition,
}

impl SuffixLcp {
    pub fn new(lcp: u64, suffix: TextPosition) -> Self {
        Self { lcp, suffix }
    }
}

/// Metadata announced by an index stream before the first record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamMeta {
    /// Text length including separators; equals the number of records
    pub total_length: u64,
    /// Number of sequences in the text
    pub num_sequences: u64,
}

/// An lcp-interval, i.e. an internal node of the virtual suffix tree.
///
/// `[lb, rb)` is the range of suffix-array indices sharing a prefix of length
/// `lcp`. `info` is per-interval state owned by whoever visits the traversal.
#[derive(Debug, Clone)]
pub struct LcpInterval<I> {
    pub lcp: u64,
    pub lb: u64,
    pub rb: u64,
    /// Suffix-array ranges of the child intervals attached so far
    pub children: Vec<Range<u64>>,
    pub info: I,
}

impl<I: Default> LcpInterval<I> {
    pub(crate) fn open(lcp: u64, lb: u64) -> Self {
        Self {
            lcp,
            lb,
            rb: OPEN_RB,
            children: Vec::new(),
            info: I::default(),
        }
    }
}

impl<I> LcpInterval<I> {
    pub fn is_root(&self) -> bool {
        self.lcp == 0
    }

    pub fn is_closed(&self) -> bool {
        self.rb != OPEN_RB
    }

    /// Suffix-array range covered by the interval (only meaningful once closed)
    pub fn range(&self) -> Range<u64> {
        self.lb..self.rb
    }

    /// Number of suffixes below the interval (only meaningful once closed)
    pub fn width(&self) -> u64 {
        self.rb - self.lb
    }
}

/// Event emitted by the traversal.
///
/// The borrowed intervals live on the traversal's stack (or, for a popped
/// child, in the traversal step) and never outlive the call that reports them.
#[derive(Debug)]
pub enum Edge<'a, I> {
    /// A single suffix hanging directly below `parent`
    Leaf {
        parent: &'a mut LcpInterval<I>,
        first_edge: bool,
        suffix: TextPosition,
    },
    /// A closed child interval attached below `parent`
    Branch {
        parent: &'a mut LcpInterval<I>,
        first_edge: bool,
        child: &'a LcpInterval<I>,
    },
    /// `interval` is complete; `rb` is set
    Close { interval: &'a LcpInterval<I> },
}

/// Owned snapshot of an [`Edge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRecord {
    Leaf {
        parent_lcp: u64,
        parent_lb: u64,
        first_edge: bool,
        suffix: TextPosition,
    },
    Branch {
        parent_lcp: u64,
        parent_lb: u64,
        first_edge: bool,
        child_lcp: u64,
        child_lb: u64,
        child_rb: u64,
    },
    Close {
        lcp: u64,
        lb: u64,
        rb: u64,
        children: usize,
    },
}

impl<I> From<&Edge<'_, I>> for EdgeRecord {
    fn from(edge: &Edge<'_, I>) -> Self {
        match edge {
            Edge::Leaf {
                parent,
                first_edge,
                suffix,
            } => EdgeRecord::Leaf {
                parent_lcp: parent.lcp,
                parent_lb: parent.lb,
                first_edge: *first_edge,
                suffix: *suffix,
            },
            Edge::Branch {
                parent,
                first_edge,
                child,
            } => EdgeRecord::Branch {
                parent_lcp: parent.lcp,
                parent_lb: parent.lb,
                first_edge: *first_edge,
                child_lcp: child.lcp,
                child_lb: child.lb,
                child_rb: child.rb,
            },
            Edge::Close { interval } => EdgeRecord::Close {
                lcp: interval.lcp,
                lb: interval.lb,
                rb: interval.rb,
                children: interval.children.len(),
            },
        }
    }
}

/// A suffix-prefix match: the suffix of `from` of length `length` equals the
/// prefix of `to` of the same length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Spm {
    pub from: SeqNum,
    pub to: SeqNum,
    pub length: u64,
}

impl Spm {
    pub fn new(from: SeqNum, to: SeqNum, length: u64) -> Self {
        Self { from, to, length }
    }
}
