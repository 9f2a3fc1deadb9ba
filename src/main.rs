//! # printrack CLI
//!
//! `learn` samples of a known format, `compile` a format's print, then
//! `identify` files that have lost their extension.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use printrack::{FormatTag, Ranking, Tracker, TrackerConfig};
use std::path::{Path, PathBuf};
use tracing::Level;

const CONFIG_FILE: &str = "printrack.toml";

#[derive(Parser, Debug)]
#[command(
    name = "printrack",
    version,
    about = "Identifies file formats that have lost their extension.",
    long_about = "printrack learns fixed byte patterns from example files of a format, compiles them into a print, and ranks the formats whose prints match an unknown file."
)]
struct Cli {
    /// TOML configuration file (default: printrack.toml in the store root, if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the learns/ and prints/ directories.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Learn from one or more files of a known format.
    Learn {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Format to learn the files as (default: each file's extension).
        #[arg(long)]
        format: Option<String>,
    },

    /// Compile the learned consensus of a format into its print.
    Compile {
        /// Format tag, without the dot.
        format: String,
    },

    /// Compare a file against every print and rank the likely formats.
    Identify {
        file: PathBuf,

        /// Rows to show before summarising the rest (default from config).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the formats that have a compiled print.
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.store.as_deref())?;
    let mut tracker = Tracker::open(&config);

    match cli.command {
        Commands::Learn { files, format } => {
            let format = format.map(FormatTag::new).transpose()?;
            for file in &files {
                let report = tracker
                    .learn_file(file, format.as_ref())
                    .with_context(|| format!("learning {}", file.display()))?;
                if report.seeded {
                    println!("{}: new format {} ({} bytes)", file.display(), report.format, report.cells);
                } else {
                    println!(
                        "{}: {} updated, {} new unknown bytes ({} cells)",
                        file.display(),
                        report.format,
                        report.newly_wildcarded,
                        report.cells
                    );
                }
            }
        }
        Commands::Compile { format } => {
            let format = FormatTag::new(format)?;
            let compiled = tracker.compile(&format)?;
            println!(
                "{}: {} prints ({} from the start, {} from the end)",
                compiled.format,
                compiled.records(),
                compiled.forward_records,
                compiled.reverse_records
            );
        }
        Commands::Identify { file, limit } => {
            let ranking = tracker.identify_file(&file)?;
            print_ranking(&ranking, limit.unwrap_or(config.report_limit));
        }
        Commands::List => {
            for format in tracker.formats()? {
                println!("{}", format);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<&Path>, store: Option<&Path>) -> Result<TrackerConfig> {
    let mut config = match explicit {
        Some(path) => TrackerConfig::load(path)?,
        None => {
            let default = store.unwrap_or(Path::new(".")).join(CONFIG_FILE);
            if default.is_file() {
                TrackerConfig::load(&default)?
            } else {
                TrackerConfig::default()
            }
        }
    };
    if let Some(store) = store {
        config.store_root = store.to_path_buf();
    }
    Ok(config)
}

fn print_ranking(ranking: &Ranking, limit: usize) {
    if ranking.is_empty() {
        println!("\nNo learned format matches this file.\n");
        return;
    }

    let (shown, rest) = ranking.top(limit);
    println!("\nResults:\n\n {:>10} | {:>12} | {:>12}", "Format", "Success rate", "Total prints");
    for answer in shown {
        let header = if answer.header_matched {
            "   <= a header matching this format was detected"
        } else {
            ""
        };
        println!(
            " {:>10} | {:>11}% | {:>12}{}",
            answer.format.as_str(),
            answer.percent,
            answer.total_records,
            header
        );
    }
    if rest > 0 {
        println!(" {} other possible formats ...", rest);
    }
    println!();
}
