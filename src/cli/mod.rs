// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All work is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `prepare` — tokenize a raw corpus into the block layout
//   2. `build`   — build and export windowed span tables
//   3. `show`    — print one assembled sample
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BuildArgs, Commands, PrepareArgs, ShowArgs};

use crate::application::{
    build_use_case::BuildUseCase,
    prepare_use_case::PrepareUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "qa-windows",
    version = "0.1.0",
    about = "Prepare sliding-window training data for extractive question answering."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routing and printing here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Build(args)   => run_build(args),
            Commands::Show(args)    => run_show(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    tracing::info!("Preparing corpus '{}'", args.corpus);

    let summary = PrepareUseCase::new(args.into()).execute()?;

    println!(
        "Prepared {} questions, {} contexts, {} answers ({} skipped).",
        summary.questions, summary.contexts, summary.annotations, summary.skipped
    );
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<()> {
    tracing::info!("Building span tables from '{}'", args.window.tokenized_dir);

    let output_dir = args.output_dir.clone();
    let summary    = BuildUseCase::new(args.into()).execute()?;

    println!(
        "Train: {} windows ({} answerable, {} unanswerable)",
        summary.train.rows, summary.train.answerable, summary.train.unanswerable
    );
    if let Some(val) = &summary.validation {
        println!(
            "Validation: {} windows ({} answerable, {} unanswerable)",
            val.rows, val.answerable, val.unanswerable
        );
    }
    println!("Reports saved to '{output_dir}'.");
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<()> {
    let index   = args.index;
    let dataset = BuildUseCase::new(args.into()).open_dataset()?;

    let sample = dataset
        .sample(index)?
        .ok_or_else(|| anyhow::anyhow!("Index {index} is out of range ({} rows)", dataset.row_count()))?;

    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(())
}
