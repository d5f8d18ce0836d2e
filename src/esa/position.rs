//! Text position to sequence mapping
//!
//! The extractor only sees text positions. A [`PositionMapper`] answers which
//! sequence a position belongs to and where that sequence starts and ends.
//! Every sequence occupies `[start, end)` and is followed by one separator at
//! `end`.

use super::types::{SeqNum, TextPosition};

pub trait PositionMapper {
    /// Length of the concatenated text, separators included
    fn total_length(&self) -> u64;

    fn num_sequences(&self) -> u64;

    /// Sequence containing `pos`. The separator after a sequence counts as
    /// part of it. `None` when `pos` is outside the text.
    fn sequence_of(&self, pos: TextPosition) -> Option<SeqNum>;

    /// Whether `pos` is the first symbol of a sequence
    fn starts_sequence(&self, pos: TextPosition) -> bool;

    /// Position of the separator closing the sequence that contains `pos`
    fn sequence_end(&self, pos: TextPosition) -> Option<TextPosition>;

    /// Whether `length` symbols from `pos` end exactly at the separator of
    /// its sequence
    fn reaches_sequence_end(&self, pos: TextPosition, length: u64) -> bool {
        self.sequence_end(pos)
            .is_some_and(|end| pos.checked_add(length) == Some(end))
    }
}
