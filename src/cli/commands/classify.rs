//! Whole-document classification command.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use crate::config::Config;
use crate::ocr::{CommandClassifier, PdftoppmConverter};
use crate::services::{classify_document, enumerate_documents, enumerate_images};

/// Label every image and document under `input` with the configured
/// classifier command.
pub async fn cmd_classify(config: &Config, input: &Path) -> anyhow::Result<()> {
    if !config.document_classifier.is_configured() {
        anyhow::bail!(
            "No document classifier configured. Set [document_classifier] command in the config file."
        );
    }

    let mut paths: Vec<PathBuf> = enumerate_images(input, &config.batch.image_extensions)
        .with_context(|| format!("Failed to read input {}", input.display()))?
        .into_iter()
        .map(|item| item.path)
        .collect();
    if input.is_dir() {
        paths.extend(enumerate_documents(input)?);
    }
    paths.sort();
    paths.dedup();

    let classifier = CommandClassifier::new(config.document_classifier.clone());
    let dpi = config.batch.dpi;
    let results = tokio::task::spawn_blocking(move || {
        let converter = PdftoppmConverter::new();
        paths
            .into_iter()
            .map(|path| {
                let label = classify_document(&path, &converter, &classifier, dpi);
                (path, label)
            })
            .collect::<Vec<_>>()
    })
    .await?;

    for (path, label) in results {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match label {
            Ok(label) => println!("{:<40} {}", name, style(label).cyan()),
            Err(e) => eprintln!("{} {}: {}", style("✗").red(), name, e),
        }
    }
    Ok(())
}
