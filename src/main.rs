use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    process,
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{info, warn};

use lz77::config::{DEFAULT_LOOKAHEAD_CAPACITY, DEFAULT_MIN_MATCH_LENGTH, DEFAULT_SEARCH_CAPACITY};
use lz77::{decode, encode, Config};

const EXTENSION: &str = "lz77";
const STDIO: &str = "-";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Overwrite existing output files
    #[arg(short, long, global = true)]
    force: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Suppress progress messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an input file
    Compress {
        /// Input file path (use - for stdin)
        input: String,
        /// Output file path (use - for stdout); defaults to <INPUT>.lz77
        output: Option<String>,
        /// Search window size in bytes
        #[arg(long, default_value_t = DEFAULT_SEARCH_CAPACITY)]
        window: usize,
        /// Lookahead window size in bytes
        #[arg(long, default_value_t = DEFAULT_LOOKAHEAD_CAPACITY)]
        lookahead: usize,
        /// Shortest match emitted as a back-reference
        #[arg(long, default_value_t = DEFAULT_MIN_MATCH_LENGTH)]
        min_match: usize,
    },
    /// Decompress an input file
    Decompress {
        /// Input file path (use - for stdin)
        input: String,
        /// Output file path (use - for stdout); defaults to INPUT without .lz77
        output: Option<String>,
    },
}

// Helper to open input (file or stdin)
fn open_input(path: &str) -> Result<Box<dyn Read>> {
    if path == STDIO {
        Ok(Box::new(BufReader::new(io::stdin())))
    } else {
        let file =
            File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
        Ok(Box::new(BufReader::new(file)))
    }
}

// Helper to open output (file or stdout)
fn open_output(path: &str, force: bool) -> Result<Box<dyn Write>> {
    if path == STDIO {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if Path::new(path).exists() {
        if !force {
            bail!("Output file {} already exists (use --force to overwrite)", path);
        }
        warn!("overwriting {}", path);
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create output file: {}", path))?;
    Ok(Box::new(BufWriter::new(file)))
}

// Creating the output truncates it, so it must not be the input.
fn ensure_distinct(input: &str, output: &str) -> Result<()> {
    if input == STDIO || output == STDIO {
        return Ok(());
    }
    let same = input == output
        || match (fs::canonicalize(input), fs::canonicalize(output)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
    if same {
        bail!("Input and output are the same file: {}", input);
    }
    Ok(())
}

fn compressed_name(input: &str) -> Result<String> {
    if input == STDIO {
        bail!("An output path is required when compressing from stdin");
    }
    Ok(format!("{}.{}", input, EXTENSION))
}

fn decompressed_name(input: &str) -> Result<String> {
    if input == STDIO {
        bail!("An output path is required when decompressing from stdin");
    }
    let path = PathBuf::from(input);
    if path.extension().is_some_and(|ext| ext == EXTENSION) {
        Ok(path.with_extension("").to_string_lossy().into_owned())
    } else {
        Ok(format!("{}.out", input))
    }
}

// Remove a partially written output so failures don't leave corrupt files.
fn discard_output(path: &str) {
    if path != STDIO {
        if let Err(e) = fs::remove_file(path) {
            warn!("could not remove partial output {}: {}", path, e);
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_filter = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    // Progress goes to stderr so stdout stays clean for piped data.
    let report = |message: String| {
        if !cli.quiet {
            eprintln!("{}", message);
        }
    };

    match cli.command {
        Commands::Compress {
            input,
            output,
            window,
            lookahead,
            min_match,
        } => {
            let config = Config::default()
                .with_search_capacity(window)
                .with_lookahead_capacity(lookahead)
                .with_min_match_length(min_match);
            config.validate().context("Invalid compression settings")?;

            let output = match output {
                Some(output) => output,
                None => compressed_name(&input)?,
            };
            ensure_distinct(&input, &output)?;
            let mut reader = open_input(&input)?;
            let mut writer = open_output(&output, cli.force)?;

            report(format!("Compressing {} to {} using LZ77...", input, output));
            info!(
                "window={} lookahead={} min_match={}",
                config.search_capacity, config.lookahead_capacity, config.min_match_length
            );
            let stats = match encode(&mut reader, &mut writer, &config) {
                Ok(stats) => stats,
                Err(e) => {
                    drop(writer);
                    discard_output(&output);
                    return Err(e).with_context(|| {
                        format!("LZ77 compression failed from {} to {}", input, output)
                    });
                }
            };
            report(format!(
                "Compression successful: {} -> {} bytes ({:.1}%).",
                stats.input_bytes,
                stats.output_bytes,
                stats.ratio() * 100.0
            ));
        }
        Commands::Decompress { input, output } => {
            let output = match output {
                Some(output) => output,
                None => decompressed_name(&input)?,
            };
            ensure_distinct(&input, &output)?;
            let mut reader = open_input(&input)?;
            let mut writer = open_output(&output, cli.force)?;

            report(format!("Decompressing {} to {} using LZ77...", input, output));
            let stats = match decode(&mut reader, &mut writer) {
                Ok(stats) => stats,
                Err(e) => {
                    drop(writer);
                    discard_output(&output);
                    return Err(e).with_context(|| {
                        format!("LZ77 decompression failed from {} to {}", input, output)
                    });
                }
            };
            report(format!(
                "Decompression successful: {} tokens -> {} bytes.",
                stats.tokens, stats.output_bytes
            ));
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("lz77: {:#}", e);
        process::exit(1);
    }
}
