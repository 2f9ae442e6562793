mod counters;

use anyhow::Result;
use clap::Parser;
use counters::table::Entry;
use counters::{format_bytes, Coordinator, Limits, MAX_NAME_LENGTH, MAX_UNIQUE_NAMES};
use serde::Serialize;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Parser, Debug)]
#[command(name = "countnames")]
#[command(about = "Count names, one per line, from stdin or from files in parallel", long_about = None)]
struct Args {
    /// Most distinct names kept per table; further new names are dropped
    #[arg(short = 'u', long, default_value_t = MAX_UNIQUE_NAMES)]
    max_unique: usize,

    /// Names are truncated to this many characters
    #[arg(short = 'l', long, default_value_t = MAX_NAME_LENGTH, value_parser = parse_positive)]
    max_name_length: usize,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Input files, one worker each. Reads stdin when none are given
    files: Vec<PathBuf>,
}

impl Args {
    fn limits(&self) -> Limits {
        Limits {
            max_unique: self.max_unique,
            max_name_length: self.max_name_length,
        }
    }
}

#[derive(Serialize)]
struct Config {
    max_unique: usize,
    max_name_length: usize,
    sources: Vec<String>,
}

#[derive(Serialize)]
struct Results<'a> {
    entries: &'a [Entry],
    unique_tokens: usize,
    total_tokens: u64,
    sources_read: usize,
    failed_sources: usize,
    empty_lines: u64,
    dropped: u64,
    elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    peak_memory_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peak_memory_human: Option<String>,
}

#[derive(Serialize)]
struct OutputData<'a> {
    config: Config,
    results: Results<'a>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let start = Instant::now();
    let coordinator = Coordinator::new(args.limits());

    let tally = if args.files.is_empty() {
        coordinator.run_stream(io::stdin().lock(), "stdin")
    } else {
        coordinator.run_files(&args.files)?
    };
    let elapsed = start.elapsed();

    let mut stdout = BufWriter::new(io::stdout().lock());

    if args.json {
        let sources = if args.files.is_empty() {
            vec!["stdin".to_string()]
        } else {
            args.files.iter().map(|p| p.display().to_string()).collect()
        };
        let peak_memory = coordinator.peak_memory_bytes();

        let output = OutputData {
            config: Config {
                max_unique: args.max_unique,
                max_name_length: args.max_name_length,
                sources,
            },
            results: Results {
                entries: tally.table.entries(),
                unique_tokens: tally.table.len(),
                total_tokens: tally.table.total(),
                sources_read: tally.sources,
                failed_sources: tally.failed_sources,
                empty_lines: tally.empty_lines,
                dropped: tally.dropped,
                elapsed_ms: elapsed.as_secs_f64() * 1000.0,
                peak_memory_bytes: peak_memory,
                peak_memory_human: peak_memory.map(format_bytes),
            },
        };

        writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        for entry in tally.table.entries() {
            writeln!(stdout, "{}: {}", entry.token, entry.count)?;
        }
    }

    stdout.flush()?;
    Ok(())
}
