//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.
//! Each call spawns its own process on its own temp file, so one
//! `TesseractBackend` can be shared by any number of workers.

use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::{OcrConfig, OcrError, Recognizer};
use super::model_utils::{check_binary, TESSERACT_NOT_FOUND};
use crate::models::RecognizedWord;

/// Number of columns in Tesseract TSV output.
const TSV_COLUMNS: usize = 12;

/// Tesseract OCR backend.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: OcrConfig::default(),
        }
    }

    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Run Tesseract on an image file, optionally with a trailing config name
    /// such as `tsv`.
    fn run_tesseract(&self, image_path: &Path, output_config: Option<&str>) -> Result<String, OcrError> {
        let psm = self.config.page_segmentation_mode.to_string();
        let mut command = Command::new("tesseract");
        command
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.config.language])
            .args(["--psm", &psm]);
        if let Some(config) = output_config {
            command.arg(config);
        }

        match command.output() {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(OcrError::OcrFailed(format!("tesseract failed: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(OcrError::BackendNotAvailable(TESSERACT_NOT_FOUND.to_string()))
            }
            Err(e) => Err(OcrError::Io(e)),
        }
    }

    /// Write the image to a temp PNG and run Tesseract on it.
    fn run_on_image(&self, image: &DynamicImage, output_config: Option<&str>) -> Result<String, OcrError> {
        let temp_dir = TempDir::new()?;
        let image_path = temp_dir.path().join("input.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to write temp image: {}", e)))?;
        self.run_tesseract(&image_path, output_config)
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Recognizer for TesseractBackend {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary("tesseract")
    }

    fn availability_hint(&self) -> String {
        if !check_binary("tesseract") {
            "Tesseract not installed. Install with: apt install tesseract-ocr".to_string()
        } else {
            "Tesseract is available".to_string()
        }
    }

    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
        let text = self.run_on_image(image, None)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn recognize_words(&self, image: &DynamicImage) -> Result<Vec<RecognizedWord>, OcrError> {
        let tsv = self.run_on_image(image, Some("tsv"))?;
        Ok(parse_tsv(&tsv))
    }

    fn recognize_hocr(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self.run_on_image(image, Some("hocr"))
    }
}

/// Parse Tesseract TSV output into word records.
///
/// Rows that are not well-formed (wrong column count, unparsable numbers) are
/// skipped. Structural rows (page, block, line) come through with a negative
/// confidence and empty text, so the usual confidence filter removes them.
pub fn parse_tsv(tsv: &str) -> Vec<RecognizedWord> {
    tsv.lines()
        .filter(|line| !line.starts_with("level"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.splitn(TSV_COLUMNS, '\t').collect();
            if cols.len() < TSV_COLUMNS - 1 {
                return None;
            }
            Some(RecognizedWord {
                x: cols[6].trim().parse().ok()?,
                y: cols[7].trim().parse().ok()?,
                width: cols[8].trim().parse().ok()?,
                height: cols[9].trim().parse().ok()?,
                confidence: cols[10].trim().parse().ok()?,
                text: cols.get(11).map(|t| t.trim().to_string()).unwrap_or_default(),
            })
        })
        .collect()
}
