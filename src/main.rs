use clap::Parser;
use std::path::PathBuf;

mod client;
mod config;
mod dataset;
mod repl;
mod report;
mod scorer;
mod session;
mod template;

use crate::config::{Credentials, Settings};
use crate::dataset::Dataset;
use crate::repl::Repl;

/// Interactive prompt evaluation - template prompts over a dataset, score
/// each response for faithfulness, relevancy, and hallucination
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON dataset of scenario entries
    #[arg(default_value = "llm_requests.json")]
    dataset: PathBuf,

    /// Optional TOML settings file overriding models, endpoints, and thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for per-iteration snapshot files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Verbose output - show progress for each API request
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.display().to_string();
    }

    let credentials = Credentials::from_env(&settings)?;
    let dataset = Dataset::from_file(&args.dataset)?;

    let mut repl = Repl::new(&settings, &credentials, dataset, args.verbose);
    repl.run().await
}
