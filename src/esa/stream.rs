//! Index stream contract
//!
//! The traversal consumes suffix-array entries as a pull-based, finite,
//! forward-only sequence of [`SuffixLcp`] records. A stream is not
//! restartable; open a new one to run again.

use super::types::{StreamMeta, SuffixLcp};
use crate::error::{EsaError, EsaResult};

/// A lazy sequence of `(lcp, suffix)` records in suffix-array order
pub trait IndexStream: Iterator<Item = EsaResult<SuffixLcp>> {
    /// Text length and sequence count of the underlying collection
    fn meta(&self) -> StreamMeta;
}

/// Index stream over in-memory suffix and LCP arrays
pub struct SliceStream<'a> {
    suffixes: &'a [u64],
    lcps: &'a [u64],
    meta: StreamMeta,
    next: usize,
}

impl<'a> SliceStream<'a> {
    /// Stream over `suffixes`/`lcps`, announcing a text of `suffixes.len()`
    /// symbols
    pub fn new(suffixes: &'a [u64], lcps: &'a [u64], num_sequences: u64) -> EsaResult<Self> {
        Self::with_meta(
            suffixes,
            lcps,
            StreamMeta {
                total_length: suffixes.len() as u64,
                num_sequences,
            },
        )
    }

    /// Stream with explicitly announced metadata
    pub fn with_meta(suffixes: &'a [u64], lcps: &'a [u64], meta: StreamMeta) -> EsaResult<Self> {
        if suffixes.len() != lcps.len() {
            return Err(EsaError::invalid_format(format!(
                "suffix array has {} entries but LCP array has {}",
                suffixes.len(),
                lcps.len()
            )));
        }

        Ok(Self {
            suffixes,
            lcps,
            meta,
            next: 0,
        })
    }
}

impl Iterator for SliceStream<'_> {
    type Item = EsaResult<SuffixLcp>;

    fn next(&mut self) -> Option<Self::Item> {
        let suffix = *self.suffixes.get(self.next)?;
        let lcp = self.lcps[self.next];
        self.next += 1;
        Some(Ok(SuffixLcp { lcp, suffix }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.suffixes.len() - self.next;
        (remaining, Some(remaining))
    }
}

impl IndexStream for SliceStream<'_> {
    fn meta(&self) -> StreamMeta {
        self.meta
    }
}

/// Wraps a stream and reports every `every` consumed records to a callback.
///
/// The callback receives the number of records consumed since its last call.
pub struct Tick<S, F> {
    inner: S,
    every: u64,
    pending: u64,
    on_tick: F,
}

impl<S: IndexStream, F: FnMut(u64)> Tick<S, F> {
    pub fn new(inner: S, every: u64, on_tick: F) -> Self {
        Self {
            inner,
            every: every.max(1),
            pending: 0,
            on_tick,
        }
    }
}

impl<S: IndexStream, F: FnMut(u64)> Iterator for Tick<S, F> {
    type Item = EsaResult<SuffixLcp>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(item) => {
                self.pending += 1;
                if self.pending == self.every {
                    (self.on_tick)(self.pending);
                    self.pending = 0;
                }
                Some(item)
            }
            None => {
                if self.pending > 0 {
                    (self.on_tick)(self.pending);
                    self.pending = 0;
                }
                None
            }
        }
    }
}

impl<S: IndexStream, F: FnMut(u64)> IndexStream for Tick<S, F> {
    fn meta(&self) -> StreamMeta {
        self.inner.meta()
    }
}
