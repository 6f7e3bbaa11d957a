//! Rivulet CLI
//!
//! Inspection and maintenance of a Rivulet log file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rivulet::{Config, Datum, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// Rivulet CLI
#[derive(Parser, Debug)]
#[command(name = "rivulet-cli")]
#[command(about = "Inspect and maintain Rivulet log files")]
#[command(version)]
struct Args {
    /// Log file
    #[arg(short, long, default_value = "./rivulet.db")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print datum counts, sizes and the file checksum
    Stats,

    /// List datums in file order
    Dump {
        /// Stop after this many datums
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the latest record number per path
    Index,

    /// Rebuild the index with a full scan
    Analyze,

    /// Drop deleted datums and clear update flags
    Compact,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rivulet=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> rivulet::Result<()> {
    if !args.file.exists() {
        return Err(rivulet::RivuletError::Config(format!(
            "log file {} does not exist",
            args.file.display()
        )));
    }

    let config = Config::builder().path(&args.file).build();
    let mut engine = Engine::open(config)?;

    match args.command {
        Commands::Stats => {
            let stats = engine.stats()?;
            println!("datums:      {}", stats.datums);
            println!("  normal:    {}", stats.normal);
            println!("  updated:   {}", stats.updated);
            println!("  deleted:   {}", stats.deleted);
            println!("bytes:       {}", stats.bytes);
            println!("reclaimable: {}", stats.reclaimable_bytes);
            println!("unreadable:  {}", stats.unreadable_bytes);
            println!("crc32:       {:08x}", stats.crc32);
        }
        Commands::Dump { limit } => {
            for item in engine.scan()?.take(limit.unwrap_or(usize::MAX)) {
                let (offset, datum) = item?;
                println!("{:>10}  {}", offset, describe(&datum));
            }
        }
        Commands::Index => {
            for (path, record) in engine.index().entries() {
                println!("{:>8}  {}", record, path);
            }
        }
        Commands::Analyze => {
            let scanned = engine.analyze()?;
            println!("{} datums scanned, {} paths indexed", scanned, engine.index().len());
        }
        Commands::Compact => {
            let stats = engine.compact()?;
            println!(
                "kept {} datums, dropped {}, reclaimed {} bytes",
                stats.datums_kept,
                stats.datums_dropped,
                stats.bytes_reclaimed()
            );
        }
    }

    engine.close()
}

fn describe(datum: &Datum) -> String {
    let preview: String = match datum.as_str() {
        Ok(text) if text.chars().all(|c| !c.is_control()) => format!("{:?}", text),
        _ => datum.payload.iter().map(|b| format!("{:02x}", b)).collect(),
    };
    format!(
        "v{} {:<7} record={:<6} {} ({} bytes) {}",
        datum.version,
        datum.status,
        datum.record,
        datum.path(),
        datum.payload_size(),
        preview
    )
}
