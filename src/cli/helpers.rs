//! Shared helper functions for CLI commands.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::BatchResult;
use crate::services::BatchEvent;

/// Progress bar style shared by every batch command.
fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("█▓░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Render batch events until the sender side is dropped.
pub fn spawn_progress_handler(
    mut event_rx: mpsc::Receiver<BatchEvent>,
    label: &str,
) -> JoinHandle<()> {
    let label = label.to_string();
    tokio::spawn(async move {
        let mut progress: Option<ProgressBar> = None;

        while let Some(event) = event_rx.recv().await {
            match event {
                BatchEvent::Started { total } => {
                    println!("{} {}: {} items", style("→").cyan(), label, total);
                    let bar = ProgressBar::new(total as u64);
                    bar.set_style(bar_style());
                    bar.set_message(format!("{}...", label));
                    progress = Some(bar);
                }
                BatchEvent::ItemStarted { name } => {
                    if let Some(ref bar) = progress {
                        bar.set_message(name);
                    }
                }
                BatchEvent::ItemCompleted { .. } => {
                    if let Some(ref bar) = progress {
                        bar.inc(1);
                    }
                }
                BatchEvent::ItemFailed { name, error } => {
                    let line = format!("  {} {} failed: {}", style("✗").red(), name, error);
                    if let Some(ref bar) = progress {
                        bar.suspend(|| eprintln!("{}", line));
                        bar.inc(1);
                    } else {
                        eprintln!("{}", line);
                    }
                }
                BatchEvent::Completed { succeeded, failed } => {
                    if let Some(bar) = progress.take() {
                        bar.finish_and_clear();
                    }
                    println!(
                        "{} {} complete: {} succeeded",
                        style("✓").green(),
                        label,
                        succeeded
                    );
                    if failed > 0 {
                        println!("  {} {} failed", style("!").yellow(), failed);
                    }
                }
            }
        }

        // Progress events are dropped when the channel is full, so the
        // final event may never arrive.
        if let Some(bar) = progress.take() {
            bar.finish_and_clear();
        }
    })
}

/// Print where results went and list failures with their reasons.
pub fn print_batch_summary(results: &[BatchResult], output_dir: &Path) {
    let failures: Vec<_> = results.iter().filter(|r| !r.is_success()).collect();
    println!(
        "  {} Results written to {}",
        style("→").dim(),
        output_dir.display()
    );
    if !failures.is_empty() {
        println!("\n{}", style("Errors:").red().bold());
        for result in failures {
            println!("  {}", result.error_reason().unwrap_or(&result.source_name));
        }
    }
}
