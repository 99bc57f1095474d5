//! CLI entry point for the scrobble stats tool.
//!
//! Provides subcommands for building the dashboard report from the enriched
//! listening log and for running the offline artist-classification batch.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use scrobble_stats::classify::batch;
use scrobble_stats::classify::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiChat};
use scrobble_stats::events::{ListenEvent, MacroGenre};
use scrobble_stats::filter::FilterSpec;
use scrobble_stats::loader::EventStore;
use scrobble_stats::report;
use scrobble_stats::views::heatmap::HeatmapMetric;
use scrobble_stats::views::stream::StreamCategory;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "scrobble_stats")]
#[command(about = "A tool to analyze personal music-listening logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dashboard report from the enriched listening log
    Report {
        /// Path to the enriched scrobble CSV
        #[arg(value_name = "EVENTS_CSV")]
        input: String,

        /// JSON file to write the report to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Start of the date range, inclusive (e.g. 2023-01-01); defaults to the oldest event
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End of the date range, inclusive; defaults to the newest event
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Macro genres to keep (comma-separated); all pass when omitted
        #[arg(short, long, value_delimiter = ',')]
        genres: Vec<MacroGenre>,

        /// Category dimension for the stream matrix: genre, mood or energy
        #[arg(long, default_value = "genre")]
        stream_by: StreamCategory,

        /// Metric for the weekday/hour heatmap: volume, energy or mood
        #[arg(long, default_value = "volume")]
        heatmap: HeatmapMetric,

        /// Number of rows in each ranking
        #[arg(short = 'n', long, default_value_t = report::DEFAULT_RANKING_SIZE)]
        top_n: usize,
    },
    /// Classify the most-played artists via an OpenAI-compatible chat model
    ClassifyArtists {
        /// Ranked artist-frequency CSV (descending play count)
        #[arg(value_name = "FREQUENCY_CSV")]
        input: String,

        /// CSV file to write the classification table to
        #[arg(short, long, default_value = "artist_classification.csv")]
        output: String,

        /// How many artists from the top of the ranking to classify
        #[arg(short = 'n', long, default_value_t = batch::DEFAULT_TOP_N)]
        top_n: usize,

        /// Chat model to use
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/scrobble_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("scrobble_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            output,
            start,
            end,
            genres,
            stream_by,
            heatmap,
            top_n,
        } => {
            let store = EventStore::new();
            let events = store.load(Path::new(&input))?;

            let spec = resolve_filter(&events, start, end, genres);
            let report = report::build(&events, &spec, top_n, stream_by, heatmap);

            match output {
                Some(path) => report::write_json(&path, &report)?,
                None => report::print_json(&report)?,
            }
        }
        Commands::ClassifyArtists {
            input,
            output,
            top_n,
            model,
        } => {
            let api_key = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");
            let base_url =
                std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

            let chat = OpenAiChat::new(api_key, model, base_url)?;
            let count = batch::run(chat, Path::new(&input), Path::new(&output), top_n).await?;

            info!(count, output = %output, "Artist classification finished");
        }
    }

    Ok(())
}

/// Resolves the CLI filter arguments against the loaded log: explicit bounds
/// win, anything left open falls back to the log's full span.
fn resolve_filter(
    events: &[ListenEvent],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    genres: Vec<MacroGenre>,
) -> FilterSpec {
    let span = FilterSpec::full_span(events);
    let (span_start, span_end) = match &span {
        Some(s) => (s.start_date, s.end_date),
        // Empty log: the report is empty whatever the range says.
        None => {
            let today = chrono::Utc::now().date_naive();
            (today, today)
        }
    };

    FilterSpec {
        start_date: start.unwrap_or(span_start),
        end_date: end.unwrap_or(span_end),
        genres: genres.into_iter().collect::<BTreeSet<_>>(),
    }
}
