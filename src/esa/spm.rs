//! Suffix-prefix match extraction
//!
//! [`SpmExtractor`] rides on the bottom-up traversal. Two working sets are
//! kept while the lcp-interval tree is walked:
//!
//! - W: sequences whose *prefix* is the label of the current interval, in
//!   leaf order. Every interval remembers where its own part of W starts
//!   (`SpmInfo::w_left`).
//! - L: sequences whose *suffix* is exactly the label of the current
//!   interval.
//!
//! When an interval of depth `d >= min_length` closes, every sequence in L
//! overlaps every sequence in its part of W by `d` symbols. Separators are
//! unique, so each match `(from, to, d)` is reported exactly once, at the
//! interval of depth `d`.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::bottomup::{BottomUpVisitor, LcpIntervalTraversal, TraversalOptions, TraversalSummary};
use super::position::PositionMapper;
use super::stream::IndexStream;
use super::types::{Edge, LcpInterval, SeqNum, Spm, TextPosition};
use crate::error::{EsaError, EsaResult};

/// Extraction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpmConfig {
    /// Shortest overlap reported; must be positive
    pub min_length: u64,
    /// Upper bound on the W set; `None` for unbounded
    pub max_set_size: Option<usize>,
    /// Report sequences that occur entirely inside another one
    pub report_contained: bool,
}

impl SpmConfig {
    pub fn new(min_length: u64) -> EsaResult<Self> {
        let config = Self {
            min_length,
            max_set_size: None,
            report_contained: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_set_size(mut self, limit: Option<usize>) -> Self {
        self.max_set_size = limit;
        self
    }

    pub fn with_contained(mut self, report: bool) -> Self {
        self.report_contained = report;
        self
    }

    pub fn validate(&self) -> EsaResult<()> {
        if self.min_length == 0 {
            return Err(EsaError::config("minimum match length must be at least 1"));
        }
        if self.max_set_size == Some(0) {
            return Err(EsaError::config("working set limit must be at least 1"));
        }
        Ok(())
    }
}

/// Receiver of extraction results
pub trait SpmSink {
    fn spm(&mut self, spm: Spm) -> EsaResult<()>;

    /// A sequence equal to the label of some interval shared with another
    /// sequence, i.e. contained in it
    fn contained(&mut self, _seq: SeqNum) -> EsaResult<()> {
        Ok(())
    }
}

impl<S: SpmSink + ?Sized> SpmSink for &mut S {
    fn spm(&mut self, spm: Spm) -> EsaResult<()> {
        (**self).spm(spm)
    }

    fn contained(&mut self, seq: SeqNum) -> EsaResult<()> {
        (**self).contained(seq)
    }
}

/// Discards everything
impl SpmSink for () {
    fn spm(&mut self, _spm: Spm) -> EsaResult<()> {
        Ok(())
    }
}

impl SpmSink for Vec<Spm> {
    fn spm(&mut self, spm: Spm) -> EsaResult<()> {
        self.push(spm);
        Ok(())
    }
}

/// Sink that keeps both matches and contained sequences
#[derive(Debug, Default, Clone)]
pub struct SpmCollector {
    pub spms: Vec<Spm>,
    pub contained: Vec<SeqNum>,
}

impl SpmSink for SpmCollector {
    fn spm(&mut self, spm: Spm) -> EsaResult<()> {
        self.spms.push(spm);
        Ok(())
    }

    fn contained(&mut self, seq: SeqNum) -> EsaResult<()> {
        self.contained.push(seq);
        Ok(())
    }
}

/// Counters collected by the extractor
#[derive(Debug, Clone, Default)]
pub struct SpmStats {
    pub intervals_closed: u64,
    pub wset_appends: u64,
    pub lset_appends: u64,
    pub wset_resets: u64,
    pub max_wset: usize,
    pub max_lset: usize,
    pub spms: u64,
    pub contained: u64,
    /// Number of matches per overlap length
    pub length_distribution: FxHashMap<u64, u64>,
}

impl SpmStats {
    /// Length histogram sorted by length
    pub fn sorted_lengths(&self) -> Vec<(u64, u64)> {
        let mut lengths: Vec<(u64, u64)> = self
            .length_distribution
            .iter()
            .map(|(&len, &count)| (len, count))
            .collect();
        lengths.sort_unstable();
        lengths
    }
}

/// Per-interval state: first W entry belonging to the interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpmInfo {
    pub w_left: usize,
}

/// Bottom-up visitor reporting suffix-prefix matches
pub struct SpmExtractor<'m, M: PositionMapper, S: SpmSink> {
    mapper: &'m M,
    sink: S,
    config: SpmConfig,
    wset: Vec<SeqNum>,
    lset: Vec<SeqNum>,
    stats: SpmStats,
}

impl<'m, M: PositionMapper, S: SpmSink> SpmExtractor<'m, M, S> {
    pub fn new(mapper: &'m M, config: SpmConfig, sink: S) -> EsaResult<Self> {
        config.validate()?;
        Ok(Self {
            mapper,
            sink,
            config,
            wset: Vec::new(),
            lset: Vec::new(),
            stats: SpmStats::default(),
        })
    }

    pub fn stats(&self) -> &SpmStats {
        &self.stats
    }

    pub fn into_parts(self) -> (S, SpmStats) {
        (self.sink, self.stats)
    }

    fn reset_wset(&mut self) {
        if !self.wset.is_empty() {
            self.wset.clear();
            self.stats.wset_resets += 1;
        }
    }

    fn leaf_edge(
        &mut self,
        parent: &mut LcpInterval<SpmInfo>,
        first_edge: bool,
        suffix: TextPosition,
    ) -> EsaResult<()> {
        let depth = parent.lcp;
        if depth < self.config.min_length {
            self.reset_wset();
            return Ok(());
        }
        if first_edge {
            parent.info.w_left = self.wset.len();
        }

        let seq = self.mapper.sequence_of(suffix).ok_or_else(|| {
            EsaError::data_integrity(format!("suffix {} lies outside the text", suffix))
        })?;
        let end = self.mapper.sequence_end(suffix).ok_or_else(|| {
            EsaError::data_integrity(format!("no sequence end for suffix {}", suffix))
        })?;
        if suffix + depth > end {
            return Err(EsaError::data_integrity(format!(
                "interval label of length {} at suffix {} crosses the end of sequence {}",
                depth, suffix, seq
            )));
        }

        let starts = self.mapper.starts_sequence(suffix);
        if starts {
            self.push_w(seq, depth)?;
        }
        if self.mapper.reaches_sequence_end(suffix, depth) {
            if starts && self.config.report_contained {
                self.stats.contained += 1;
                self.sink.contained(seq)?;
            }
            self.push_l(seq, depth)?;
        }
        Ok(())
    }

    fn branching_edge(
        &mut self,
        parent: &mut LcpInterval<SpmInfo>,
        first_edge: bool,
        child: &LcpInterval<SpmInfo>,
    ) -> EsaResult<()> {
        if parent.lcp < self.config.min_length {
            self.reset_wset();
            return Ok(());
        }
        if first_edge {
            parent.info.w_left = child.info.w_left;
        }
        Ok(())
    }

    fn close_interval(&mut self, interval: &LcpInterval<SpmInfo>) -> EsaResult<()> {
        self.stats.intervals_closed += 1;

        if interval.lcp < self.config.min_length {
            self.reset_wset();
            self.lset.clear();
            return Ok(());
        }

        let members = self.wset.get(interval.info.w_left..).ok_or_else(|| {
            EsaError::data_integrity(format!(
                "interval [{}, {}) claims W entries from {} but only {} exist",
                interval.lb,
                interval.rb,
                interval.info.w_left,
                self.wset.len()
            ))
        })?;

        let length = interval.lcp;
        for &from in &self.lset {
            for &to in members {
                if from == to {
                    continue;
                }
                self.sink.spm(Spm::new(from, to, length))?;
                self.stats.spms += 1;
                *self.stats.length_distribution.entry(length).or_insert(0) += 1;
            }
        }

        if !self.lset.is_empty() {
            log::trace!(
                "interval lcp={} [{}, {}): {} suffixes x {} prefixes",
                length,
                interval.lb,
                interval.rb,
                self.lset.len(),
                members.len()
            );
        }
        self.lset.clear();
        Ok(())
    }

    fn push_w(&mut self, seq: SeqNum, depth: u64) -> EsaResult<()> {
        check_capacity("W", self.wset.len(), self.config.max_set_size, depth)?;
        self.wset.push(seq);
        self.stats.wset_appends += 1;
        self.stats.max_wset = self.stats.max_wset.max(self.wset.len());
        Ok(())
    }

    fn push_l(&mut self, seq: SeqNum, depth: u64) -> EsaResult<()> {
        check_capacity("L", self.lset.len(), self.config.max_set_size, depth)?;
        self.lset.push(seq);
        self.stats.lset_appends += 1;
        self.stats.max_lset = self.stats.max_lset.max(self.lset.len());
        Ok(())
    }
}

fn check_capacity(name: &str, len: usize, limit: Option<usize>, depth: u64) -> EsaResult<()> {
    match limit {
        Some(limit) if len >= limit => Err(EsaError::resource_limit(format!(
            "{} set reached {} entries below an interval of depth {}",
            name, limit, depth
        ))),
        _ => Ok(()),
    }
}

impl<M: PositionMapper, S: SpmSink> BottomUpVisitor for SpmExtractor<'_, M, S> {
    type Info = SpmInfo;

    fn visit(&mut self, edge: Edge<'_, SpmInfo>) -> EsaResult<()> {
        match edge {
            Edge::Leaf {
                parent,
                first_edge,
                suffix,
            } => self.leaf_edge(parent, first_edge, suffix),
            Edge::Branch {
                parent,
                first_edge,
                child,
            } => self.branching_edge(parent, first_edge, child),
            Edge::Close { interval } => self.close_interval(interval),
        }
    }
}

/// Result of one complete extraction run
#[derive(Debug)]
pub struct SpmRun<S> {
    pub sink: S,
    pub stats: SpmStats,
    pub summary: TraversalSummary,
}

/// Run the traversal over `stream` and report all suffix-prefix matches of
/// length at least `config.min_length` to `sink`.
///
/// On error the sink may hold a partial result and must be discarded. Use
/// [`find_spms_checked`] when the sink cannot take anything back.
pub fn find_spms<St, M, S>(
    stream: St,
    mapper: &M,
    config: SpmConfig,
    sink: S,
    options: TraversalOptions,
) -> EsaResult<SpmRun<S>>
where
    St: IndexStream,
    M: PositionMapper,
    S: SpmSink,
{
    let meta = stream.meta();
    if meta.total_length != mapper.total_length() {
        return Err(EsaError::data_integrity(format!(
            "index stream covers {} symbols but the sequence map covers {}",
            meta.total_length,
            mapper.total_length()
        )));
    }

    let extractor = SpmExtractor::new(mapper, config, sink)?;
    let (extractor, summary) = LcpIntervalTraversal::new(extractor, options).run(stream)?;
    let (sink, stats) = extractor.into_parts();

    log::debug!(
        "{} intervals, {} matches, largest W set {}, largest L set {}",
        summary.intervals,
        stats.spms,
        stats.max_wset,
        stats.max_lset
    );

    Ok(SpmRun {
        sink,
        stats,
        summary,
    })
}

/// Like [`find_spms`], but nothing reaches `sink` unless the whole index
/// passes every integrity and resource check.
///
/// `open` is called twice over the same index. The first pass runs the full
/// extraction with matches discarded; the second reports them to `sink`.
/// Memory stays bounded by the working sets in both passes.
pub fn find_spms_checked<St, O, M, S>(
    mut open: O,
    mapper: &M,
    config: SpmConfig,
    sink: S,
    options: TraversalOptions,
) -> EsaResult<SpmRun<S>>
where
    St: IndexStream,
    O: FnMut() -> EsaResult<St>,
    M: PositionMapper,
    S: SpmSink,
{
    let dry = find_spms(open()?, mapper, config, (), options)?;

    // The first pass already proved the permutation
    let options = TraversalOptions {
        check_permutation: false,
        ..options
    };
    let run = find_spms(open()?, mapper, config, sink, options)?;

    if run.summary != dry.summary || run.stats.spms != dry.stats.spms {
        return Err(EsaError::data_integrity(format!(
            "index stream changed between passes: {} then {} matches",
            dry.stats.spms, run.stats.spms
        )));
    }
    Ok(run)
}

/// Run independent extraction jobs on the rayon pool.
///
/// Each job owns its own stream, mapper and extractor; results come back in
/// job order.
pub fn find_spms_parallel<J, F, R>(jobs: &[J], run: F) -> Vec<EsaResult<R>>
where
    J: Sync,
    R: Send,
    F: Fn(&J) -> EsaResult<R> + Sync + Send,
{
    jobs.par_iter().map(run).collect()
}
