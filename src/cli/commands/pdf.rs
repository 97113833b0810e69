//! Multi-page document command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use crate::cli::helpers::{print_batch_summary, spawn_progress_handler};
use crate::config::Config;
use crate::ocr::{check_pdftoppm_hint, PdftoppmConverter, Recognizer, TesseractBackend};
use crate::services::{enumerate_documents, DocumentProcessor};

/// Split every document under `input` into pages and OCR them.
pub async fn cmd_pdf(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    workers: Option<usize>,
    dpi: Option<u32>,
) -> anyhow::Result<()> {
    if let Some(hint) = check_pdftoppm_hint() {
        println!("{} {}", style("✗").red(), hint);
        anyhow::bail!("pdftoppm is required for multi-page documents");
    }
    let recognizer = TesseractBackend::with_config(config.ocr.clone());
    if !recognizer.is_available() {
        println!("  {}", style(recognizer.availability_hint()).dim());
        anyhow::bail!("tesseract is not available");
    }

    let documents = enumerate_documents(input)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    if documents.is_empty() {
        println!(
            "{} No documents found in {}",
            style("!").yellow(),
            input.display()
        );
        return Ok(());
    }

    let output_root = output.unwrap_or_else(|| config.output_dir());
    let processor = DocumentProcessor::new(
        Arc::new(PdftoppmConverter::new()),
        Arc::new(recognizer),
        dpi.unwrap_or(config.batch.dpi),
        workers.unwrap_or_else(|| config.workers()),
    );

    let (event_tx, event_rx) = mpsc::channel(100);
    let handler = spawn_progress_handler(event_rx, "Page OCR");
    let runs = processor
        .process_all(&documents, &output_root, event_tx)
        .await;
    let _ = handler.await;

    let mut converted = 0;
    for run in &runs {
        match &run.outcome {
            Ok(results) => {
                converted += 1;
                println!(
                    "{} {}: {} pages",
                    style("✓").green(),
                    run.name,
                    results.len()
                );
                print_batch_summary(results, &output_root.join(stem_of(&run.name)));
            }
            Err(e) => println!("{} {}: {}", style("✗").red(), run.name, e),
        }
    }
    println!(
        "\n{} {} of {} documents processed",
        style("→").cyan(),
        converted,
        runs.len()
    );
    Ok(())
}

fn stem_of(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}
