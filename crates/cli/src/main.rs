//! Prefetch trace-replay CLI.
//!
//! This binary replays recorded memory access traces through the cache model
//! and the prefetch engines. It provides:
//! 1. **Run:** Replay a JSON-lines trace and print (or dump as JSON) the statistics.
//! 2. **Config:** Validate a configuration file and print the effective configuration.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use smsim_core::config::{Config, Prefetcher};
use smsim_core::sim::{Simulator, load_trace};
use smsim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "smsim",
    author,
    version,
    about = "Stride and spatial prefetcher trace replay",
    long_about = "Replay a memory access trace through a cache model and the stride / spatial prefetch engines.\n\nExamples:\n  smsim run --trace loop.jsonl --prefetcher stride --degree 4\n  smsim run --trace db.jsonl --config sms.json --json\n  smsim run --trace db.jsonl --stats-sections summary,engines\n  smsim config --config sms.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and report statistics.
    Run {
        /// JSON-lines access trace.
        #[arg(short, long)]
        trace: PathBuf,

        /// JSON configuration file (defaults are used for missing fields).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Engines to run (overrides the configuration).
        #[arg(short, long, value_enum)]
        prefetcher: Option<EngineArg>,

        /// Stride prefetch degree (overrides the configuration).
        #[arg(long)]
        degree: Option<usize>,

        /// Spatial region size in bytes (overrides the configuration).
        #[arg(long)]
        region_size: Option<usize>,

        /// Print statistics as JSON instead of the text report.
        #[arg(long)]
        json: bool,

        /// Text report sections to print (comma-separated); all when omitted.
        #[arg(
            long,
            value_delimiter = ',',
            value_parser = PossibleValuesParser::new(STATS_SECTIONS.iter().copied())
        )]
        stats_sections: Vec<String>,
    },

    /// Validate a configuration and print the effective values as JSON.
    Config {
        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EngineArg {
    None,
    Stride,
    Spatial,
    Hybrid,
}

impl From<EngineArg> for Prefetcher {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::None => Self::None,
            EngineArg::Stride => Self::Stride,
            EngineArg::Spatial => Self::Spatial,
            EngineArg::Hybrid => Self::Hybrid,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            trace,
            config,
            prefetcher,
            degree,
            region_size,
            json,
            stats_sections,
        } => load_config(config.as_deref()).and_then(|mut cfg| {
            if let Some(p) = prefetcher {
                cfg.prefetch.prefetcher = p.into();
            }
            if let Some(d) = degree {
                cfg.prefetch.stride.degree = d;
            }
            if let Some(r) = region_size {
                cfg.prefetch.spatial.region_size = r;
            }
            init_logging(&cfg);
            cmd_run(&cfg, &trace, json, &stats_sections)
        }),
        Commands::Config { config } => load_config(config.as_deref()).and_then(|cfg| {
            cfg.validate().map_err(|e| e.to_string())?;
            let text = serde_json::to_string_pretty(&cfg).map_err(|e| e.to_string())?;
            println!("{text}");
            Ok(())
        }),
    };

    if let Err(msg) = result {
        error!("{msg}");
        eprintln!("Error: {msg}");
        process::exit(1);
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise the filter is `warn`, or `trace` when
/// the configuration asks for per-access tracing.
fn init_logging(config: &Config) {
    let fallback = if config.general.trace_accesses {
        "trace"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Reads a configuration file, or returns the defaults when none is given.
///
/// Validation is left to the caller so command-line overrides apply first.
fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| format!("could not read config '{}': {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid config '{}': {e}", path.display()))
}

/// Replays `trace` with `config` and prints the statistics.
///
/// `sections` limits the text report; an empty list prints every section.
fn cmd_run(config: &Config, trace: &Path, json: bool, sections: &[String]) -> Result<(), String> {
    let records = load_trace(trace).map_err(|e| e.to_string())?;
    info!(
        "replaying {} accesses from {} ({:?})",
        records.len(),
        trace.display(),
        config.prefetch.prefetcher
    );

    let mut sim = Simulator::new(config).map_err(|e| e.to_string())?;
    let stats = sim.run(&records).map_err(|e| e.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&stats).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        stats.print_sections(sections);
    }
    Ok(())
}
