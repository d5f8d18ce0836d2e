//! SPM list formats and terminal summaries
//!
//! Text lists hold one `from to length` line per match. Binary lists start
//! with one byte giving the integer width (32 or 64) followed by
//! little-endian `(from, to, length)` triples.

use crate::error::{EsaError, EsaResult};
use crate::esa::spm::{SpmSink, SpmStats};
use crate::esa::types::{SeqNum, Spm};
use crate::utils::encoding::{u32_at, u64_at, write_u32_le, write_u64_le};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Read, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Header byte of a binary list with 32-bit fields
pub const BIN32_HEADER: u8 = 32;

/// Header byte of a binary list with 64-bit fields
pub const BIN64_HEADER: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpmFormat {
    #[default]
    Text,
    Binary,
}

/// Streams SPMs to a writer in either format
///
/// As a sink it also keeps the contained sequences it is told about; there
/// is at most one entry per sequence.
pub struct SpmWriter<W: Write> {
    out: W,
    format: SpmFormat,
    wide: bool,
    /// Binary header written
    started: bool,
    count: u64,
    contained: Vec<SeqNum>,
}

impl<W: Write> SpmWriter<W> {
    /// `max_value` bounds every sequence number and length that will be
    /// written; binary lists use 32-bit fields when it fits.
    ///
    /// Nothing reaches `out` before the first match or [`finish`](Self::finish).
    pub fn new(out: W, format: SpmFormat, max_value: u64) -> Self {
        Self {
            out,
            format,
            wide: max_value > u32::MAX as u64,
            started: false,
            count: 0,
            contained: Vec::new(),
        }
    }

    fn start(&mut self) -> EsaResult<()> {
        if !self.started && self.format == SpmFormat::Binary {
            let header = if self.wide { BIN64_HEADER } else { BIN32_HEADER };
            self.out.write_all(&[header])?;
        }
        self.started = true;
        Ok(())
    }

    pub fn write(&mut self, spm: &Spm) -> EsaResult<()> {
        self.start()?;
        match self.format {
            SpmFormat::Text => writeln!(self.out, "{} {} {}", spm.from, spm.to, spm.length)?,
            SpmFormat::Binary if self.wide => {
                write_u64_le(&mut self.out, spm.from)?;
                write_u64_le(&mut self.out, spm.to)?;
                write_u64_le(&mut self.out, spm.length)?;
            }
            SpmFormat::Binary => {
                for value in [spm.from, spm.to, spm.length] {
                    let narrow = u32::try_from(value).map_err(|_| {
                        EsaError::invalid_format(format!("{} does not fit a 32-bit SPM list", value))
                    })?;
                    write_u32_le(&mut self.out, narrow)?;
                }
            }
        }
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn take_contained(&mut self) -> Vec<SeqNum> {
        std::mem::take(&mut self.contained)
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> EsaResult<W> {
        self.start()?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> SpmSink for SpmWriter<W> {
    fn spm(&mut self, spm: Spm) -> EsaResult<()> {
        self.write(&spm)
    }

    fn contained(&mut self, seq: SeqNum) -> EsaResult<()> {
        self.contained.push(seq);
        Ok(())
    }
}

/// Read a text or binary SPM list, keeping matches of at least `min_length`
///
/// A leading `@` always starts a binary list. A leading space may also start
/// a text list, so it is taken as the 32-bit header only when the rest holds
/// bytes no text list can contain.
pub fn read_spm_list<R: Read>(mut reader: R, min_length: u64) -> EsaResult<Vec<Spm>> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let spms = match data.split_first() {
        None => Vec::new(),
        Some((&BIN64_HEADER, rest)) => read_binary(rest, true)?,
        Some((&BIN32_HEADER, rest)) if !is_text(rest) => read_binary(rest, false)?,
        Some(_) => read_text(data.as_slice())?,
    };

    Ok(spms.into_iter().filter(|s| s.length >= min_length).collect())
}

/// Text lists hold printable ASCII and line breaks only
fn is_text(data: &[u8]) -> bool {
    data.iter()
        .all(|&b| b.is_ascii_whitespace() || (b.is_ascii() && !b.is_ascii_control()))
}

fn read_binary(data: &[u8], wide: bool) -> EsaResult<Vec<Spm>> {
    let field = if wide { 8 } else { 4 };
    let triples = data.chunks_exact(3 * field);
    if !triples.remainder().is_empty() {
        return Err(EsaError::invalid_format(format!(
            "binary SPM list truncated after {} complete entries",
            data.len() / (3 * field)
        )));
    }

    let spms = triples
        .map(|triple| {
            let value = |i: usize| -> u64 {
                if wide {
                    u64_at(triple, i * field).unwrap_or_default()
                } else {
                    u32_at(triple, i * field).unwrap_or_default() as u64
                }
            };
            Spm::new(value(0), value(1), value(2))
        })
        .collect();
    Ok(spms)
}

fn read_text<R: BufRead>(reader: R) -> EsaResult<Vec<Spm>> {
    let mut spms = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<u64> = line
            .split_whitespace()
            .map(|f| f.parse::<u64>())
            .collect::<Result<_, _>>()
            .map_err(|e| {
                EsaError::invalid_format(format!("line {}: {}: {:?}", line_no + 1, e, line))
            })?;

        match fields.as_slice() {
            &[from, to, length] => spms.push(Spm::new(from, to, length)),
            _ => {
                return Err(EsaError::invalid_format(format!(
                    "line {}: expected 3 fields, found {}",
                    line_no + 1,
                    fields.len()
                )));
            }
        }
    }

    Ok(spms)
}

/// Write contained sequence numbers, one per line
pub fn write_contained<W: Write>(mut out: W, contained: &[SeqNum]) -> io::Result<()> {
    for seq in contained {
        writeln!(out, "{}", seq)?;
    }
    out.flush()
}

/// Print a run summary to stderr (stdout may carry the SPM list)
pub fn print_spm_summary(label: &str, stats: &SpmStats, color: bool) -> io::Result<()> {
    let choice = if color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stderr = StandardStream::stderr(choice);

    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
    writeln!(stderr, "{}", label)?;
    stderr.reset()?;

    print_count(&mut stderr, "matches", stats.spms)?;
    print_count(&mut stderr, "contained", stats.contained)?;
    print_count(&mut stderr, "intervals", stats.intervals_closed)?;
    print_count(&mut stderr, "largest W set", stats.max_wset as u64)?;
    print_count(&mut stderr, "largest L set", stats.max_lset as u64)?;

    let lengths = stats.sorted_lengths();
    if !lengths.is_empty() {
        writeln!(stderr, "  length distribution:")?;
        for (length, count) in lengths {
            stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
            write!(stderr, "    {:>8}", length)?;
            stderr.reset()?;
            writeln!(stderr, " {}", count)?;
        }
    }

    Ok(())
}

fn print_count(stderr: &mut StandardStream, name: &str, value: u64) -> io::Result<()> {
    write!(stderr, "  {:<16}", name)?;
    stderr.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    writeln!(stderr, "{}", value)?;
    stderr.reset()
}
