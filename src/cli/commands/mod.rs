//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod classify;
mod config_cmd;
mod pdf;
mod process;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{load_config, LoadOptions};

use process::PagePipeline;

#[derive(Parser)]
#[command(name = "pagesift")]
#[command(about = "Table extraction, layout analysis and batch OCR for scanned pages")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Input and output options shared by the batch commands.
#[derive(Args, Debug, Clone)]
struct BatchArgs {
    /// Image file or directory of images
    input: PathBuf,
    /// Output directory (default: batch.output_dir from config)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Number of workers (default: CPU count minus one)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// OCR every image into a JSON file of text lines
    Ocr(BatchArgs),

    /// Extract ruled tables from every image into CSV files
    Tables(BatchArgs),

    /// Split recognized text into headings and paragraphs
    Layout(BatchArgs),

    /// Detect layout blocks and write an annotated image
    Blocks(BatchArgs),

    /// Denoise and binarize pages ahead of recognition
    Enhance(BatchArgs),

    /// Split multi-page documents into pages and OCR each page
    Pdf {
        #[command(flatten)]
        batch: BatchArgs,
        /// Render resolution (default: batch.dpi from config)
        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Label documents with the configured classifier command
    Classify {
        /// Image, document, or directory of them
        input: PathBuf,
    },

    /// Check if required tools (OCR, page conversion) are installed
    Check,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show which config file is in use
    Path,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(LoadOptions {
        config_path: cli.config,
    })
    .await;

    let page_batch = |pipeline: PagePipeline, args: BatchArgs| {
        let config = config.clone();
        async move {
            process::cmd_process(&config, pipeline, &args.input, args.output, args.workers).await
        }
    };

    match cli.command {
        Commands::Ocr(args) => page_batch(PagePipeline::Ocr, args).await,
        Commands::Tables(args) => page_batch(PagePipeline::Tables, args).await,
        Commands::Layout(args) => page_batch(PagePipeline::Layout, args).await,
        Commands::Blocks(args) => page_batch(PagePipeline::Blocks, args).await,
        Commands::Enhance(args) => page_batch(PagePipeline::Enhance, args).await,
        Commands::Pdf { batch, dpi } => {
            pdf::cmd_pdf(&config, &batch.input, batch.output, batch.workers, dpi).await
        }
        Commands::Classify { input } => classify::cmd_classify(&config, &input).await,
        Commands::Check => check::cmd_check(&config).await,
        Commands::Config { command } => match command {
            ConfigCommands::Show => config_cmd::cmd_config_show(&config).await,
            ConfigCommands::Path => config_cmd::cmd_config_path(&config).await,
        },
    }
}
