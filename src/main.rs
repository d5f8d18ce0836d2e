use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use esa_overlap::esa::SpmConfig;
use esa_overlap::index::overlap::{
    write_intervals, write_overlap_files, write_overlaps, OverlapOptions, OverlapSummary,
};
use esa_overlap::index::suffix_array::SuffixArrayConfig;
use esa_overlap::index::{build_index_with_progress, default_index_path, stats};
use esa_overlap::output::{print_spm_summary, read_spm_list, write_contained, SpmFormat, SpmWriter};
use esa_overlap::utils::AppConfig;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "esa-overlap")]
#[command(about = "Suffix-prefix match detection on enhanced suffix arrays")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors and hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Worker threads (overrides the config file; 0 uses every core)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an index from a FASTA/FASTQ file
    Index {
        /// Input sequences (optionally gzipped)
        input: PathBuf,

        /// Index directory (default: <input>.esa)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the case of the input bases
        #[arg(long)]
        keep_case: bool,
    },
    /// Find all suffix-prefix matches in one or more indexes
    Overlap {
        /// Index directories
        #[arg(required = true)]
        indexes: Vec<PathBuf>,

        /// Minimum match length
        #[arg(short = 'l', long)]
        min_length: u64,

        /// Output format (default from config, else text)
        #[arg(short, long, value_enum)]
        format: Option<SpmFormat>,

        /// Write matches to FILE (FILE.<n> for the n-th of several indexes)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail when a working set grows beyond N entries
        #[arg(long)]
        max_set_size: Option<usize>,

        /// Skip the suffix permutation check
        #[arg(long)]
        no_check: bool,

        /// Write contained sequence numbers to FILE
        #[arg(long)]
        contained: Option<PathBuf>,

        /// Cross-check the matches against the brute-force finder
        #[arg(long)]
        verify: bool,
    },
    /// Print every lcp-interval as `lcp lb rb` in closing order
    Intervals {
        /// Index directory
        index: PathBuf,
    },
    /// Print a text or binary match list as text
    Show {
        /// Match list file
        file: PathBuf,

        /// Only show matches of at least this length
        #[arg(short = 'l', long, default_value_t = 0)]
        min_length: u64,
    },
    /// Show index statistics
    Stats {
        /// Index directory
        index: PathBuf,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let mut config = AppConfig::load()?;
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_threads())
        .build_global()
        .context("Failed to set thread count")?;

    match cli.command {
        Commands::Index {
            input,
            output,
            keep_case,
        } => {
            let output = output.unwrap_or_else(|| default_index_path(&input));
            let sa_config = SuffixArrayConfig {
                normalize_case: !keep_case,
                ..SuffixArrayConfig::default()
            };
            build_index_with_progress(&input, &output, sa_config, cli.quiet)?;
        }
        Commands::Overlap {
            indexes,
            min_length,
            format,
            output,
            max_set_size,
            no_check,
            contained,
            verify,
        } => {
            let spm_config = SpmConfig::new(min_length)?
                .with_max_set_size(max_set_size.or(config.max_set_size))
                .with_contained(contained.is_some());
            let options = OverlapOptions {
                config: spm_config,
                check_permutation: config.check_permutation && !no_check,
                verify,
                silent: cli.quiet,
            };
            let format = format.unwrap_or(config.output_format);
            if format == SpmFormat::Binary && output.is_none() && indexes.len() > 1 {
                anyhow::bail!("Binary output of several indexes needs --output");
            }

            let summaries = run_overlaps(&indexes, &options, format, output.as_deref())?;
            report_overlaps(&summaries, contained.as_deref(), !cli.quiet)?;
        }
        Commands::Intervals { index } => {
            let stdout = io::stdout();
            let count = write_intervals(&index, BufWriter::new(stdout.lock()))?;
            log::info!("{} intervals", count);
        }
        Commands::Show { file, min_length } => {
            let input = File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
            let spms = read_spm_list(input, min_length)
                .with_context(|| format!("Failed to read match list {}", file.display()))?;

            let stdout = io::stdout();
            let mut writer = SpmWriter::new(BufWriter::new(stdout.lock()), SpmFormat::Text, 0);
            for spm in &spms {
                writer.write(spm)?;
            }
            writer.finish()?;
        }
        Commands::Stats { index } => {
            stats::show_stats(&index)?;
        }
    }

    Ok(())
}

/// `path` itself for a single index, `path.<n>` for the n-th of several
fn numbered_path(path: &Path, n: usize, total: usize) -> PathBuf {
    if total == 1 {
        return path.to_path_buf();
    }
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Write matches to one file per index (in parallel), or to stdout one index
/// after the other
fn run_overlaps(
    indexes: &[PathBuf],
    options: &OverlapOptions,
    format: SpmFormat,
    output: Option<&Path>,
) -> Result<Vec<OverlapSummary>> {
    let total = indexes.len();

    if let Some(path) = output {
        let jobs: Vec<(PathBuf, PathBuf)> = indexes
            .iter()
            .enumerate()
            .map(|(n, index)| (index.clone(), numbered_path(path, n, total)))
            .collect();
        let summaries = write_overlap_files(&jobs, options, format)?;
        for (summary, (_, path)) in summaries.iter().zip(&jobs) {
            log::info!("wrote {} matches to {}", summary.matches, path.display());
        }
        return Ok(summaries);
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut summaries = Vec::with_capacity(total);
    for index in indexes {
        if total > 1 {
            writeln!(out, "# {}", index.display())?;
        }
        summaries.push(write_overlaps(index, options, format, &mut out)?);
    }
    out.flush()?;
    Ok(summaries)
}

fn report_overlaps(summaries: &[OverlapSummary], contained: Option<&Path>, summary: bool) -> Result<()> {
    let total = summaries.len();

    for (n, run) in summaries.iter().enumerate() {
        if let Some(path) = contained {
            let path = numbered_path(path, n, total);
            let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_contained(BufWriter::new(file), &run.contained)?;
        }

        if summary {
            print_spm_summary(&run.index.display().to_string(), &run.stats, true)?;
        }
    }

    Ok(())
}
