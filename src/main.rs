//! CLI entry point for the stop heading tool.
//!
//! Reads a GTFS `stops.txt` and `stop_times.txt`, works out which way a
//! street-level camera should face to look at each stop, and writes the
//! stops that got a heading to a JSON array.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use stop_headings::config::Config;
use stop_headings::heading::HeadingStrategy;
use stop_headings::pipeline::{compute, log_stats, run};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "stop_headings")]
#[command(about = "Derive street-level camera headings for GTFS stops", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute headings and write them to a JSON file
    Compute {
        #[command(flatten)]
        feed: FeedArgs,

        /// JSON file to write headed stops to
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// CSV file to append run statistics to
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },
    /// Compute headings and log the run statistics without writing output
    Summarize {
        #[command(flatten)]
        feed: FeedArgs,
    },
}

#[derive(Args)]
struct FeedArgs {
    /// Directory holding the feed; default file names are resolved inside it
    #[arg(short = 'd', long, value_name = "DIR")]
    feed_dir: Option<PathBuf>,

    /// Path to stops.txt
    #[arg(long, value_name = "FILE")]
    stops: Option<PathBuf>,

    /// Path to stop_times.txt
    #[arg(long, value_name = "FILE")]
    stop_times: Option<PathBuf>,

    /// How the direction of travel at a stop is estimated
    #[arg(short, long, value_enum, default_value_t = HeadingStrategy::PrevTangent)]
    strategy: HeadingStrategy,
}

impl FeedArgs {
    fn into_config(self) -> Config {
        let mut config = match self.feed_dir {
            Some(dir) => Config::from_feed_dir(dir),
            None => Config::default(),
        }
        .with_strategy(self.strategy);

        if let Some(stops) = self.stops {
            config.stops_path = stops;
        }
        if let Some(stop_times) = self.stop_times {
            config.stop_times_path = stop_times;
        }
        config
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/stop_headings.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("stop_headings.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            feed,
            output,
            summary,
        } => {
            let mut config = feed.into_config();
            if let Some(output) = output {
                config.output_path = output;
            }
            if let Some(summary) = summary {
                config = config.with_summary(summary);
            }

            let stats = run(&config)?;
            info!(
                output = %config.output_path.display(),
                with_heading = stats.with_heading,
                "Headings written"
            );
        }
        Commands::Summarize { feed } => {
            let config = feed.into_config();
            let computed = compute(&config)?;
            log_stats(&computed.stats);
        }
    }

    Ok(())
}
