// src/main.rs
// ContainerShip - streaming Dockerfile analysis client

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use containership::config::Settings;
use containership::document::segment::segment_clauses;
use containership::document::{DocumentModel, LineRole};
use containership::ingest::{Analyzer, IngestReport, Upload};
use containership::transport::HttpTransport;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "containership")]
#[command(about = "Streaming Dockerfile analysis client")]
#[command(version)]
struct Cli {
    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a Dockerfile to the analysis service and print the result
    Analyze {
        /// Path to the Dockerfile
        path: PathBuf,

        /// Ingestion flow
        #[arg(short, long, value_enum, default_value_t = Mode::Stream)]
        mode: Mode,

        /// Analysis service base URL (overrides config and environment)
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the local clause segmentation without contacting the service
    Segment {
        /// Path to the Dockerfile
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Stream,
    Batch,
    Sequential,
}

async fn run_analyze(settings: Settings, path: PathBuf, mode: Mode, url: Option<String>) -> Result<()> {
    let settings = match url {
        Some(url) => settings.with_base_url(&url)?,
        None => settings,
    };
    let upload = Upload::from_path(&path).await?;
    let expected = settings.expected_file_name.clone();
    info!(base_url = %settings.base_url, file = %path.display(), "Analyzing");

    let analyzer = Analyzer::new(Arc::new(HttpTransport::new(settings)), expected);
    let outcome = match mode {
        Mode::Stream => analyzer.analyze_stream(&upload).await,
        Mode::Batch => analyzer.analyze_batch(&upload).await,
        Mode::Sequential => analyzer.analyze_sequential(&upload).await,
    };

    let document = analyzer.document().await;
    let model = document.read().await;
    match outcome {
        Ok(report) => {
            print_document(&model);
            print_summary(&report);
            Ok(())
        }
        Err(e) => {
            // Whatever arrived before the failure is still worth showing
            if !model.clauses().is_empty() {
                print_document(&model);
            }
            Err(anyhow::anyhow!(e.to_user_string()))
        }
    }
}

async fn run_segment(path: PathBuf) -> Result<()> {
    let upload = Upload::from_path(&path).await?;
    let clauses = segment_clauses(&upload.text())?;

    for (i, clause) in clauses.iter().enumerate() {
        println!(
            "#{} {} [{}]",
            i + 1,
            clause.instruction.as_deref().unwrap_or("?"),
            clause.technology.as_deref().unwrap_or("Generic")
        );
        for (line, text) in &clause.lines {
            println!("  {:>4} | {}", line, text);
        }
    }
    println!("{} clauses", clauses.len());
    Ok(())
}

fn print_document(model: &DocumentModel) {
    for (i, clause) in model.clauses().iter().enumerate() {
        println!("── Recommendation {} of {} ──", i + 1, model.clauses().len());
        for (line, text) in &clause.lines {
            let marker = match model.index().line_role(*line) {
                Some(LineRole::First) => "┌",
                Some(LineRole::Middle) => "│",
                Some(LineRole::Last) => "└",
                Some(LineRole::Single) | None => " ",
            };
            println!("{} {:>4} | {}", marker, line, text);
        }
        println!("{}\n", clause.recommendation.trim_end());
    }

    if let Some(optimized) = model.optimized_text() {
        println!("── Optimized Dockerfile ──");
        println!("{}", optimized.trim_end());
    }
}

fn print_summary(report: &IngestReport) {
    let skipped = report.dispatch.skipped_total;
    let failed = report.items.as_ref().map_or(0, |items| items.failed.len());
    eprintln!(
        "{} analysis {}: {} frames applied, {} skipped, {} items failed",
        report.mode, report.progress, report.dispatch.applied, skipped, failed
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env files (global first, then project - project overrides)
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".containership/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        settings.log_level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Analyze { path, mode, url } => {
            run_analyze(settings, path, mode, url).await?;
        }
        Commands::Segment { path } => {
            run_segment(path).await?;
        }
    }

    Ok(())
}
