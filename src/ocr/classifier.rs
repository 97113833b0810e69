//! Whole-document categorization through an external classifier.
//!
//! The classifier model itself is a black box. `CommandClassifier` hands it a
//! page image through a configured command and reads the label from stdout.
//! Arguments may use `{file}`, `{basename}` and `{stem}` placeholders.

use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use super::backend::OcrError;

/// Labels a whole document from its first page image.
pub trait DocumentClassifier: Send + Sync {
    fn classify_document(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// External classifier command from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentClassifierConfig {
    /// Command to execute. Empty means no classifier is configured.
    #[serde(default)]
    pub command: String,
    /// Arguments (can include {file}, {basename} and {stem} placeholders).
    #[serde(default)]
    pub args: Vec<String>,
}

impl DocumentClassifierConfig {
    pub fn is_configured(&self) -> bool {
        !self.command.trim().is_empty()
    }
}

/// Classifier that runs a configured command per document.
pub struct CommandClassifier {
    config: DocumentClassifierConfig,
}

impl CommandClassifier {
    pub fn new(config: DocumentClassifierConfig) -> Self {
        Self { config }
    }

    /// Replace placeholders in an argument string.
    fn expand_arg(&self, arg: &str, file_path: &Path) -> String {
        let file_str = file_path.to_string_lossy();
        let mut result = arg.replace("{file}", &file_str);
        if let Some(basename) = file_path.file_name().and_then(|n| n.to_str()) {
            result = result.replace("{basename}", basename);
        }
        if let Some(stem) = file_path.file_stem().and_then(|n| n.to_str()) {
            result = result.replace("{stem}", stem);
        }
        result
    }

    /// Run the command against an image already on disk.
    pub fn classify_path(&self, image_path: &Path) -> Result<String, OcrError> {
        if !self.config.is_configured() {
            return Err(OcrError::BackendNotAvailable(
                "no document classifier command configured".to_string(),
            ));
        }

        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| self.expand_arg(arg, image_path))
            .collect();
        if !self.config.args.iter().any(|arg| arg.contains("{file}")) {
            args.push(image_path.to_string_lossy().to_string());
        }

        let output = Command::new(&self.config.command).args(&args).output();
        match output {
            Ok(output) if output.status.success() => {
                let label = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if label.is_empty() {
                    Err(OcrError::OcrFailed(format!(
                        "{} produced no label",
                        self.config.command
                    )))
                } else {
                    Ok(label)
                }
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(OcrError::OcrFailed(format!(
                    "{} failed: {}",
                    self.config.command,
                    stderr.trim()
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(format!("{} not found", self.config.command)),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl DocumentClassifier for CommandClassifier {
    fn classify_document(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("document.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to write temp image: {}", e)))?;
        self.classify_path(&image_path)
    }
}
