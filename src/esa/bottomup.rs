//! Bottom-up traversal of lcp-intervals
//!
//! A single left-to-right scan over the `(lcp, suffix)` stream reconstructs
//! the lcp-interval tree on a stack and reports it as a sequence of edge
//! events: every suffix becomes exactly one [`Edge::Leaf`], every closed
//! non-root interval exactly one [`Edge::Branch`] into its parent, and every
//! interval (root included) exactly one [`Edge::Close`]. A child is always
//! closed before it is attached.
//!
//! Record `i` carries the LCP between suffix `i - 1` and suffix `i`, so the
//! work for a suffix happens once the next record (or the end of the stream)
//! is known. Interval bounds are half-open: `[lb, rb)`.

use roaring::RoaringTreemap;

use super::stream::IndexStream;
use super::types::{Edge, EdgeRecord, LcpInterval, TextPosition};
use crate::error::{EsaError, EsaResult};

/// Consumer of traversal events.
///
/// `Info` is stored in every interval on the stack. A visitor may write to
/// the parent's `info` on `Leaf` and `Branch` events; it is carried along
/// when the interval is later closed or attached.
pub trait BottomUpVisitor {
    type Info: Default;

    fn visit(&mut self, edge: Edge<'_, Self::Info>) -> EsaResult<()>;
}

/// Integrity checking knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalOptions {
    /// Reject streams that repeat a suffix position
    pub check_permutation: bool,
    /// Expected number of records; taken from the stream metadata by `run`
    /// when unset
    pub total_length: Option<u64>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            check_permutation: true,
            total_length: None,
        }
    }
}

/// Counters gathered during a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalSummary {
    /// Records consumed
    pub suffixes: u64,
    /// Intervals closed, root included
    pub intervals: u64,
    /// Deepest interval stack observed
    pub max_stack: usize,
    /// Largest LCP value seen
    pub max_lcp: u64,
}

/// Stack-based reconstruction of the lcp-interval tree
pub struct LcpIntervalTraversal<V: BottomUpVisitor> {
    visitor: V,
    options: TraversalOptions,
    stack: Vec<LcpInterval<V::Info>>,
    /// Suffix of the last record, waiting for its successor's LCP
    pending: Option<TextPosition>,
    next_idx: u64,
    first_edge_from_root: bool,
    seen: Option<RoaringTreemap>,
    summary: TraversalSummary,
    finished: bool,
}

impl<V: BottomUpVisitor> LcpIntervalTraversal<V> {
    pub fn new(visitor: V, options: TraversalOptions) -> Self {
        let seen = options.check_permutation.then(RoaringTreemap::new);

        Self {
            visitor,
            options,
            stack: vec![LcpInterval::open(0, 0)],
            pending: None,
            next_idx: 0,
            first_edge_from_root: true,
            seen,
            summary: TraversalSummary::default(),
            finished: false,
        }
    }

    /// Drive the traversal over a whole stream and hand back the visitor
    pub fn run<S: IndexStream>(mut self, stream: S) -> EsaResult<(V, TraversalSummary)> {
        if self.options.total_length.is_none() {
            self.options.total_length = Some(stream.meta().total_length);
        }

        for (idx, record) in stream.enumerate() {
            let record = record?;
            self.process_step(idx as u64, record.lcp, record.suffix)?;
        }

        let summary = self.flush()?;
        Ok((self.visitor, summary))
    }

    /// Feed record `idx`: `suffix` at suffix-array index `idx`, `lcp` to the
    /// suffix at `idx - 1` (ignored for `idx == 0`)
    pub fn process_step(&mut self, idx: u64, lcp: u64, suffix: TextPosition) -> EsaResult<()> {
        if self.finished {
            return Err(EsaError::data_integrity(format!(
                "record {} arrived after the end of the stream",
                idx
            )));
        }
        if idx != self.next_idx {
            return Err(EsaError::data_integrity(format!(
                "expected suffix-array index {} but got {}",
                self.next_idx, idx
            )));
        }

        self.check_suffix(idx, suffix)?;

        if let Some(prev) = self.pending {
            self.check_lcp(idx, lcp, prev, suffix)?;
            self.summary.max_lcp = self.summary.max_lcp.max(lcp);
            self.step(idx - 1, lcp, prev)?;
        }

        self.pending = Some(suffix);
        self.next_idx += 1;
        Ok(())
    }

    /// Finish the stream: process the last suffix against a virtual LCP of
    /// 0 and close the root
    pub fn flush(&mut self) -> EsaResult<TraversalSummary> {
        if self.finished {
            return Err(EsaError::data_integrity("traversal flushed twice"));
        }

        if let Some(expected) = self.options.total_length {
            if self.next_idx != expected {
                return Err(EsaError::data_integrity(format!(
                    "stream ended after {} records, expected {}",
                    self.next_idx, expected
                )));
            }
        }

        if let Some(last) = self.pending.take() {
            self.step(self.next_idx - 1, 0, last)?;
        }

        let mut root = self
            .stack
            .pop()
            .ok_or_else(|| EsaError::data_integrity("interval stack lost its root"))?;
        if !self.stack.is_empty() || !root.is_root() {
            return Err(EsaError::data_integrity(format!(
                "{} intervals left open at end of stream",
                self.stack.len() + 1
            )));
        }

        root.rb = self.next_idx;
        self.summary.intervals += 1;
        self.visitor.visit(Edge::Close { interval: &root })?;

        self.finished = true;
        self.summary.suffixes = self.next_idx;
        Ok(self.summary)
    }

    /// LCP values of the open intervals, bottom to top
    pub fn stack_lcps(&self) -> Vec<u64> {
        self.stack.iter().map(|itv| itv.lcp).collect()
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }

    pub fn into_visitor(self) -> V {
        self.visitor
    }

    /// One step of the scan for the suffix at index `idx`, whose LCP with its
    /// successor is `lcp`
    fn step(&mut self, idx: u64, lcp: u64, suffix: TextPosition) -> EsaResult<()> {
        let top_lcp = self.top_lcp()?;
        if lcp <= top_lcp {
            let first_edge = self.take_first_edge(top_lcp);
            let parent = self.stack.last_mut().ok_or_else(empty_stack)?;
            self.visitor.visit(Edge::Leaf {
                parent,
                first_edge,
                suffix,
            })?;
        }

        // Close everything deeper than the next suffix can share
        let mut last_interval: Option<LcpInterval<V::Info>> = None;
        while lcp < self.top_lcp()? {
            let mut interval = self.stack.pop().ok_or_else(empty_stack)?;
            interval.rb = idx + 1;
            self.summary.intervals += 1;
            self.visitor.visit(Edge::Close {
                interval: &interval,
            })?;

            let parent_lcp = self.top_lcp()?;
            if lcp <= parent_lcp {
                let first_edge = self.take_first_edge(parent_lcp);
                let parent = self.stack.last_mut().ok_or_else(empty_stack)?;
                self.visitor.visit(Edge::Branch {
                    parent: &mut *parent,
                    first_edge,
                    child: &interval,
                })?;
                parent.children.push(interval.range());
            } else {
                last_interval = Some(interval);
            }
        }

        if lcp > self.top_lcp()? {
            match last_interval.take() {
                Some(child) => {
                    let mut interval = LcpInterval::open(lcp, child.lb);
                    self.visitor.visit(Edge::Branch {
                        parent: &mut interval,
                        first_edge: true,
                        child: &child,
                    })?;
                    interval.children.push(child.range());
                    self.stack.push(interval);
                }
                None => {
                    let mut interval = LcpInterval::open(lcp, idx);
                    self.visitor.visit(Edge::Leaf {
                        parent: &mut interval,
                        first_edge: true,
                        suffix,
                    })?;
                    self.stack.push(interval);
                }
            }
        }

        let top_lcp = self.top_lcp()?;
        if top_lcp != lcp {
            return Err(EsaError::data_integrity(format!(
                "interval stack top has lcp {} after step {} with lcp {}",
                top_lcp, idx, lcp
            )));
        }

        self.summary.max_stack = self.summary.max_stack.max(self.stack.len());
        Ok(())
    }

    fn top_lcp(&self) -> EsaResult<u64> {
        self.stack.last().map(|itv| itv.lcp).ok_or_else(empty_stack)
    }

    /// Only the very first edge out of the root counts as its first edge;
    /// every fresh non-root interval gets its first edge when it is pushed
    fn take_first_edge(&mut self, parent_lcp: u64) -> bool {
        if parent_lcp == 0 && self.first_edge_from_root {
            self.first_edge_from_root = false;
            true
        } else {
            false
        }
    }

    fn check_suffix(&mut self, idx: u64, suffix: TextPosition) -> EsaResult<()> {
        if let Some(total) = self.options.total_length {
            if suffix >= total {
                return Err(EsaError::data_integrity(format!(
                    "suffix {} at index {} lies outside a text of length {}",
                    suffix, idx, total
                )));
            }
        }

        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(suffix) {
                return Err(EsaError::data_integrity(format!(
                    "suffix {} appears twice (again at index {})",
                    suffix, idx
                )));
            }
        }

        Ok(())
    }

    fn check_lcp(&self, idx: u64, lcp: u64, prev: TextPosition, suffix: TextPosition) -> EsaResult<()> {
        if let Some(total) = self.options.total_length {
            let remaining = total - prev.max(suffix);
            if lcp > remaining {
                return Err(EsaError::data_integrity(format!(
                    "lcp {} at index {} exceeds the {} symbols left after suffix {}",
                    lcp,
                    idx,
                    remaining,
                    prev.max(suffix)
                )));
            }
        }
        Ok(())
    }
}

fn empty_stack() -> EsaError {
    EsaError::data_integrity("interval stack is empty")
}

/// Visitor that records every event as an [`EdgeRecord`]
#[derive(Debug, Default)]
pub struct EdgeLog {
    pub records: Vec<EdgeRecord>,
}

impl EdgeLog {
    /// Closed intervals as `(lcp, lb, rb)`, in closing order
    pub fn intervals(&self) -> Vec<(u64, u64, u64)> {
        self.records
            .iter()
            .filter_map(|r| match *r {
                EdgeRecord::Close { lcp, lb, rb, .. } => Some((lcp, lb, rb)),
                _ => None,
            })
            .collect()
    }

    /// Suffixes reported as leaves, in reporting order
    pub fn leaves(&self) -> Vec<TextPosition> {
        self.records
            .iter()
            .filter_map(|r| match *r {
                EdgeRecord::Leaf { suffix, .. } => Some(suffix),
                _ => None,
            })
            .collect()
    }
}

impl BottomUpVisitor for EdgeLog {
    type Info = ();

    fn visit(&mut self, edge: Edge<'_, ()>) -> EsaResult<()> {
        self.records.push(EdgeRecord::from(&edge));
        Ok(())
    }
}
