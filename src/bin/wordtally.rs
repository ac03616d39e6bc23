use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use wordtally::config::CountBuilder;
use wordtally::report::{render_table, to_json};
use wordtally::{
    resolve_inputs, CountConfig, InputOptions, TextEncoding, WordCounter, DEFAULT_TOP_N,
};

const EXIT_USAGE: u8 = 1;
const EXIT_PARTIAL_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Count word frequencies across text files", long_about = None)]
struct Cli {
    /// Files or directories to count
    #[arg(value_name = "PATH")]
    inputs: Vec<PathBuf>,

    /// Characters decoded per read (overrides WORDTALLY_CHUNK_SIZE)
    #[arg(long, value_name = "CHARS")]
    chunk_size: Option<usize>,

    /// Maximum files processed at once (overrides WORDTALLY_MAX_PARALLELISM)
    #[arg(long, alias = "threads", value_name = "COUNT")]
    max_parallelism: Option<usize>,

    /// Input text encoding
    #[arg(long, value_enum, default_value_t = EncodingArg::Auto)]
    encoding: EncodingArg,

    /// Fail a file on malformed input instead of substituting U+FFFD
    #[arg(long)]
    strict: bool,

    /// Number of ranked words to display
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TOP_N)]
    top: usize,

    /// Emit a JSON summary instead of the table
    #[arg(long)]
    json: bool,

    /// Only count files directly inside directory inputs
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks while expanding directories
    #[arg(long)]
    follow_symlinks: bool,

    /// Disable the progress spinner
    #[arg(long)]
    no_progress: bool,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EncodingArg {
    /// Detect from a byte order mark, defaulting to UTF-8.
    Auto,
    /// UTF-8.
    Utf8,
    /// Little-endian UTF-16.
    Utf16le,
    /// Big-endian UTF-16.
    Utf16be,
    /// Little-endian UTF-32.
    Utf32le,
    /// Big-endian UTF-32.
    Utf32be,
}

impl From<EncodingArg> for TextEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Auto => Self::Auto,
            EncodingArg::Utf8 => Self::Utf8,
            EncodingArg::Utf16le => Self::Utf16Le,
            EncodingArg::Utf16be => Self::Utf16Be,
            EncodingArg::Utf32le => Self::Utf32Le,
            EncodingArg::Utf32be => Self::Utf32Be,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    run(cli)
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    if cli.inputs.is_empty() {
        println!("Usage: wordtally <file_path> [file_path2] [file_path3] ...");
        println!("Example: wordtally file1.txt file2.txt file3.txt");
        return Ok(ExitCode::from(EXIT_USAGE));
    }

    let input_opts = InputOptions {
        recursive: !cli.no_recursive,
        follow_symlinks: cli.follow_symlinks,
    };
    let resolved = resolve_inputs(&cli.inputs, &input_opts);
    if resolved.files.is_empty() {
        println!("Error: No valid files found.");
        return Ok(ExitCode::from(EXIT_USAGE));
    }
    if !resolved.missing.is_empty() {
        println!(
            "Warning: {} file(s) not found and will be skipped.",
            resolved.missing.len()
        );
    }
    if !resolved.unreadable.is_empty() {
        println!(
            "Warning: {} path(s) could not be read and will be skipped.",
            resolved.unreadable.len()
        );
    }

    let mut builder = CountBuilder::from_config(CountConfig::from_env());
    if let Some(chunk_size) = cli.chunk_size {
        builder = builder.chunk_size(chunk_size);
    }
    if cli.max_parallelism.is_some() {
        builder = builder.max_parallelism(cli.max_parallelism);
    }
    let cfg = builder
        .encoding(cli.encoding.into())
        .strict_decoding(cli.strict)
        .build()?;
    info!(
        "chunk size {} chars, {} workers, encoding {}",
        cfg.chunk_size,
        cfg.resolve_parallelism(resolved.files.len()),
        cfg.encoding
    );

    if !cli.json {
        println!("Processing {} file(s)...\n", resolved.files.len());
    }

    let spinner = if cli.no_progress || cli.json {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} counting words... {elapsed}")
            .context("invalid progress template")?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ");
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    };

    let result = WordCounter::new(cfg).count_files(&resolved.files)?;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut out, &to_json(&result, cli.top))?;
        writeln!(out)?;
    } else {
        render_table(&result, cli.top, &mut out).context("failed to write report")?;
    }
    out.flush()?;

    if result.has_errors() {
        return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
    }
    Ok(ExitCode::SUCCESS)
}
