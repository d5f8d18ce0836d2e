use crate::index::suffix_array::SuffixArrayReader;
use anyhow::Result;
use std::path::Path;

/// Length summary of the indexed sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LengthStats {
    pub count: u64,
    pub total: u64,
    pub min: u64,
    pub max: u64,
    /// Smallest length such that sequences at least this long cover half the bases
    pub n50: u64,
}

impl LengthStats {
    pub fn from_lengths(lengths: impl IntoIterator<Item = u64>) -> Self {
        let mut lengths: Vec<u64> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return Self::default();
        }
        lengths.sort_unstable_by(|a, b| b.cmp(a));

        let total: u64 = lengths.iter().sum();
        let mut covered = 0;
        let mut n50 = 0;
        for &len in &lengths {
            covered += len;
            if covered * 2 >= total {
                n50 = len;
                break;
            }
        }

        Self {
            count: lengths.len() as u64,
            total,
            min: lengths[lengths.len() - 1],
            max: lengths[0],
            n50,
        }
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total as f64 / self.count as f64
        }
    }
}

/// Display index statistics
pub fn show_stats(index_path: &Path) -> Result<()> {
    let reader = SuffixArrayReader::open(index_path)?;
    let meta = reader.meta();
    let lengths = LengthStats::from_lengths(reader.sequence_store().lengths());

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Index location:   {}", index_path.display());
    if let Some(source) = &meta.source {
        println!("Source:           {}", source);
    }
    println!("Index version:    {}", meta.version);
    println!("Sequences:        {}", meta.num_sequences);
    println!("Text length:      {} (separators included)", meta.total_length);
    println!("Case normalized:  {}", if meta.normalize_case { "yes" } else { "no" });

    println!();
    println!("Sequence lengths:");
    println!("  {:15} {}", "bases", lengths.total);
    println!("  {:15} {}", "min", lengths.min);
    println!("  {:15} {}", "max", lengths.max);
    println!("  {:15} {:.1}", "mean", lengths.mean());
    println!("  {:15} {}", "N50", lengths.n50);

    println!();
    println!("Max LCP:          {}", meta.max_lcp);
    println!("LCP exceptions:   {}", meta.lcp_exceptions);

    // Index size
    if let Ok(size) = dir_size(index_path) {
        println!();
        println!("Index size:       {}", format_size(size));
    }

    if meta.created_at > 0 {
        println!();
        println!("Created:          {}", format_timestamp(meta.created_at));
    }

    Ok(())
}

/// Calculate directory size recursively
fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Format unix timestamp
fn format_timestamp(ts: u64) -> String {
    use std::time::{Duration, UNIX_EPOCH};
    let datetime = UNIX_EPOCH + Duration::from_secs(ts);
    format!("{:?}", datetime)
}
