//! Tool availability check.

use console::style;

use crate::config::Config;
use crate::ocr::{check_binary, check_pdftoppm_hint, Recognizer, TesseractBackend};

/// Check which external tools the pipelines can use.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    println!("\n{}", style("Recognizer:").cyan());
    let tesseract = TesseractBackend::with_config(config.ocr.clone());
    let tesseract_ok = tesseract.is_available();
    let status = if tesseract_ok {
        style("✓ available").green()
    } else {
        style("✗ not available").red()
    };
    println!("  {:<20} {}", "Tesseract", status);
    if !tesseract_ok {
        println!("                       {}", style(tesseract.availability_hint()).dim());
    }
    println!(
        "  {:<20} {}",
        "Language",
        style(&config.ocr.language).dim()
    );

    println!("\n{}", style("Page converter:").cyan());
    let pdftoppm_hint = check_pdftoppm_hint();
    let status = if pdftoppm_hint.is_none() {
        style("✓ found").green()
    } else {
        style("✗ not found").red()
    };
    println!("  {:<20} {}", "pdftoppm", status);
    if let Some(ref hint) = pdftoppm_hint {
        println!("                       {}", style(hint).dim());
    }

    println!("\n{}", style("Document classifier:").cyan());
    let classifier = &config.document_classifier;
    if classifier.is_configured() {
        let status = if check_binary(&classifier.command) {
            style("✓ found").green()
        } else {
            style("✗ not found").red()
        };
        println!("  {:<20} {}", classifier.command, status);
    } else {
        println!("  {}", style("○ not configured").yellow());
    }

    println!();
    if tesseract_ok && pdftoppm_hint.is_none() {
        println!("{} All pipelines are available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing. Install them for full support:",
            style("!").yellow()
        );
        println!("  - tesseract: tesseract-ocr package");
        println!("  - pdftoppm: poppler-utils package");
    }

    Ok(())
}
