//! Types for suffix array indexing
//!
//! This module defines the on-disk headers and the in-memory types shared by
//! the suffix/LCP array builder, writer and reader.

use crate::error::{EsaError, EsaResult};
use crate::esa::types::TextPosition;
use crate::utils::encoding::{u32_at, u64_at, write_u32_le, write_u64_le};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Suffix array entry - position in concatenated text
pub type SuffixEntry = u64;

/// Magic number for sa.bin
pub const SA_MAGIC: u32 = 0x41534F45; // "EOSA" in little-endian

/// Magic number for lcp.bin
pub const LCP_MAGIC: u32 = 0x434C4F45; // "EOLC" in little-endian

/// Magic number for lcp.llv
pub const LLV_MAGIC: u32 = 0x564C4F45; // "EOLV" in little-endian

/// Magic number for seq.idx
pub const SEQ_MAGIC: u32 = 0x51534F45; // "EOSQ" in little-endian

/// Current version of the index format
pub const SA_VERSION: u32 = 1;

/// Byte closing every sequence in the concatenated text.
///
/// Each occurrence sorts as its own symbol: after every base, and after
/// other separators that occur earlier in the text.
pub const SEPARATOR: u8 = 0x00;

/// lcp.bin byte marking a value stored in lcp.llv
pub const LCP_ESCAPE: u8 = u8::MAX;

/// Sequence boundary in concatenated text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBoundary {
    /// Start position in concatenated text (inclusive)
    pub start: TextPosition,
    /// End position in concatenated text (exclusive); the separator sits here
    pub end: TextPosition,
}

impl SequenceBoundary {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether `pos` lies in the sequence or on its separator
    pub fn covers(&self, pos: TextPosition) -> bool {
        pos >= self.start && pos <= self.end
    }
}

/// Configuration for suffix array building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuffixArrayConfig {
    /// Upper-case bases on ingestion (default: true)
    pub normalize_case: bool,
    /// Suffix count above which sorting runs on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for SuffixArrayConfig {
    fn default() -> Self {
        Self {
            normalize_case: true,
            parallel_threshold: 100_000,
        }
    }
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IndexMeta {
    pub version: u32,
    /// Length of the concatenated text, separators included
    pub total_length: u64,
    pub num_sequences: u64,
    pub min_sequence_length: u64,
    pub max_sequence_length: u64,
    pub max_lcp: u64,
    /// Number of LCP values stored in lcp.llv
    pub lcp_exceptions: u64,
    pub normalize_case: bool,
    /// Input file the index was built from
    #[serde(default)]
    pub source: Option<String>,
    /// Unix timestamp of the build
    #[serde(default)]
    pub created_at: u64,
}

/// Header shared by sa.bin, lcp.bin and lcp.llv
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub magic: u32,
    pub version: u32,
    /// Number of entries following the header
    pub count: u64,
    /// Flags (reserved for future use)
    pub flags: u32,
}

impl FileHeader {
    /// Size of header in bytes
    pub const SIZE: usize = 4 + 4 + 8 + 4; // 20 bytes

    pub fn new(magic: u32, count: u64) -> Self {
        Self {
            magic,
            version: SA_VERSION,
            count,
            flags: 0,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32_le(writer, self.magic)?;
        write_u32_le(writer, self.version)?;
        write_u64_le(writer, self.count)?;
        write_u32_le(writer, self.flags)
    }

    /// Parse and validate the header at the start of `data`
    pub fn parse(data: &[u8], magic: u32, name: &str) -> EsaResult<Self> {
        if data.len() < Self::SIZE {
            return Err(EsaError::invalid_format(format!("{}: file too small", name)));
        }

        let header = Self {
            magic: u32_at(data, 0).unwrap_or_default(),
            version: u32_at(data, 4).unwrap_or_default(),
            count: u64_at(data, 8).unwrap_or_default(),
            flags: u32_at(data, 16).unwrap_or_default(),
        };

        if header.magic != magic {
            return Err(EsaError::invalid_format(format!("{}: bad magic number", name)));
        }
        if header.version != SA_VERSION {
            return Err(EsaError::invalid_format(format!(
                "{}: unsupported version {}",
                name, header.version
            )));
        }
        Ok(header)
    }
}

/// Header for seq.idx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceIndexHeader {
    pub magic: u32,
    pub version: u32,
    pub num_sequences: u64,
    pub total_length: u64,
    /// Flags (reserved)
    pub flags: u32,
}

impl SequenceIndexHeader {
    /// Size of header in bytes
    pub const SIZE: usize = 4 + 4 + 8 + 8 + 4; // 28 bytes

    pub fn new(num_sequences: u64, total_length: u64) -> Self {
        Self {
            magic: SEQ_MAGIC,
            version: SA_VERSION,
            num_sequences,
            total_length,
            flags: 0,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_u32_le(writer, self.magic)?;
        write_u32_le(writer, self.version)?;
        write_u64_le(writer, self.num_sequences)?;
        write_u64_le(writer, self.total_length)?;
        write_u32_le(writer, self.flags)
    }

    pub fn parse(data: &[u8]) -> EsaResult<Self> {
        if data.len() < Self::SIZE {
            return Err(EsaError::invalid_format("seq.idx: file too small"));
        }

        let header = Self {
            magic: u32_at(data, 0).unwrap_or_default(),
            version: u32_at(data, 4).unwrap_or_default(),
            num_sequences: u64_at(data, 8).unwrap_or_default(),
            total_length: u64_at(data, 16).unwrap_or_default(),
            flags: u32_at(data, 24).unwrap_or_default(),
        };

        if header.magic != SEQ_MAGIC {
            return Err(EsaError::invalid_format("seq.idx: bad magic number"));
        }
        if header.version != SA_VERSION {
            return Err(EsaError::invalid_format(format!(
                "seq.idx: unsupported version {}",
                header.version
            )));
        }
        Ok(header)
    }
}

/// Size of each seq.idx entry (start, end)
pub const SEQUENCE_ENTRY_SIZE: usize = 8 + 8;
