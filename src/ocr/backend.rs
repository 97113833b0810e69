//! Recognizer abstraction over external OCR engines.

use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::RecognizedWord;

/// Errors from recognition engines and other external tools.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("{backend} does not support {operation}")]
    Unsupported {
        backend: String,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(String),
}

/// Result of a timed recognition call.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Recognized lines, in engine order.
    pub lines: Vec<String>,
    /// Which backend produced this result.
    pub backend: String,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Recognition engine shared read-only across workers.
pub trait Recognizer: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Check if this backend can run (binaries installed, models present).
    fn is_available(&self) -> bool;

    /// Describe what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Recognize an image or crop into text lines.
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError>;

    /// Recognize word-level blocks with positions and confidences.
    fn recognize_words(&self, _image: &DynamicImage) -> Result<Vec<RecognizedWord>, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.name().to_string(),
            operation: "word-level recognition",
        })
    }

    /// Page layout as an hOCR document.
    fn recognize_hocr(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.name().to_string(),
            operation: "hOCR output",
        })
    }

    /// Recognize an image, returning a timed result.
    fn recognize_timed(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let lines = self.recognize(image)?;
        Ok(OcrResult {
            lines,
            backend: self.name().to_string(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// Recognition engine with internal mutable state.
///
/// Not shareable on its own; wrap it in [`super::Serialized`] to get a
/// `Recognizer` that takes one call at a time.
pub trait StatefulRecognizer: Send {
    fn name(&self) -> &str;

    fn recognize_mut(&mut self, image: &DynamicImage) -> Result<Vec<String>, OcrError>;

    fn recognize_words_mut(
        &mut self,
        _image: &DynamicImage,
    ) -> Result<Vec<RecognizedWord>, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.name().to_string(),
            operation: "word-level recognition",
        })
    }

    fn recognize_hocr_mut(&mut self, _image: &DynamicImage) -> Result<String, OcrError> {
        Err(OcrError::Unsupported {
            backend: self.name().to_string(),
            operation: "hOCR output",
        })
    }
}

/// Configuration for recognition backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language for OCR (e.g., "eng", "eng+rus").
    pub language: String,
    /// Tesseract page segmentation mode. 6 assumes a single uniform block.
    pub page_segmentation_mode: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}
