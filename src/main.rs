//! # docsim CLI
//!
//! The `docsim` binary is the operator surface for the analysis core. It
//! submits a batch through the same task queue the service embeds, so a CLI
//! run exercises the full submit → worker → poll path.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docsim analyze <files>...` | Queue a batch, wait for the worker, print the result |
//! | `docsim inspect <file>` | Print the features extracted from one document |
//!
//! ## Examples
//!
//! ```bash
//! # Compare a batch of submissions with the stock weights
//! docsim analyze submissions/*.docx
//!
//! # Machine-readable output, custom threshold
//! docsim analyze --json --threshold 0.5 a.docx b.docx
//!
//! # Operator-tuned weights from a config file
//! docsim --config docsim.toml analyze a.docx b.docx
//!
//! # Debug what the extractor sees in one document
//! docsim inspect a.docx
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsim::config::{self, Config};
use docsim::extract;
use docsim::models::{AnalysisTask, DocumentRef, TaskStatus};
use docsim::queue::{start_worker, AnalysisQueue};

/// docsim — batch similarity analysis for office documents.
///
/// Scoring weights and the plagiarism threshold come from an optional TOML
/// configuration file; without one, the stock weights apply.
#[derive(Parser)]
#[command(
    name = "docsim",
    about = "Batch similarity analysis for office documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Optional — defaults apply.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Analyze a batch of documents for similarity.
    ///
    /// Parses every file, scores all pairs on text, image, structure, and
    /// metadata similarity, and reports pairs above the plagiarism
    /// threshold. Unreadable files are skipped with a warning.
    Analyze {
        /// Documents to compare (at least one; fewer than two readable
        /// documents yields an empty result).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Override the plagiarism threshold from configuration.
        #[arg(long)]
        threshold: Option<f64>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// Show the features extracted from one document.
    ///
    /// Prints body text, headings, image hashes, and document properties as
    /// JSON. Useful for checking what the comparators will actually see.
    Inspect {
        /// The document to inspect.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Analyze {
            files,
            threshold,
            json,
        } => {
            if let Some(t) = threshold {
                config.scoring.threshold = t;
                config::validate(&config)?;
            }
            run_analyze(config, files, json).await
        }
        Commands::Inspect { file } => run_inspect(&file),
    }
}

async fn run_analyze(config: Config, files: Vec<PathBuf>, json: bool) -> Result<()> {
    let refs: Vec<DocumentRef> = files.into_iter().map(DocumentRef::from_path).collect();
    let submitted = refs.len();

    let queue = Arc::new(AnalysisQueue::new(config.clone()));
    let task_id = queue.submit(refs)?;
    let worker = start_worker(
        queue.clone(),
        Duration::from_millis(config.queue.tick_interval_ms),
    );

    let task = wait_for_terminal(&queue, &task_id).await?;
    worker.stop().await;

    match task.status {
        TaskStatus::Completed => {
            let result = task
                .result
                .context("completed task is missing its result")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("analyze");
                println!("  documents submitted: {}", submitted);
                println!("  comparisons: {}", result.comparisons.len());
                println!("  suspected pairs: {}", result.network.len());
                for edge in &result.network {
                    println!(
                        "    {:.2}  {}  <->  {}",
                        edge.similarity, edge.source, edge.target
                    );
                }
                println!("ok");
            }
            Ok(())
        }
        TaskStatus::Failed => {
            anyhow::bail!(
                "analysis failed: {}",
                task.error.unwrap_or_else(|| "unknown error".to_string())
            )
        }
        _ => unreachable!("wait_for_terminal returned a non-terminal task"),
    }
}

/// Poll the queue until the task reaches a terminal state.
async fn wait_for_terminal(queue: &AnalysisQueue, task_id: &str) -> Result<AnalysisTask> {
    loop {
        let task = queue
            .get_status(task_id)
            .context("submitted task disappeared from the queue")?;
        if task.status.is_terminal() {
            return Ok(task);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

fn run_inspect(file: &Path) -> Result<()> {
    let features = extract::extract_features(file)
        .map_err(|e| anyhow::anyhow!("{}: {}", file.display(), e))?;
    println!("{}", serde_json::to_string_pretty(&features)?);
    Ok(())
}
