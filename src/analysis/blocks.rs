//! Heading/paragraph classification of recognized text blocks.

use std::fmt::Write as _;
use std::path::Path;

use image::DynamicImage;
use imageproc::contrast::otsu_level;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::mask::{BinaryMask, Polarity};
use crate::models::{BlockKind, ClassifiedBlock, PageLayout, TextBlock};
use crate::ocr::{OcrError, Recognizer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("page has no text blocks to classify")]
    EmptyPage,
}

/// Tunables for block extraction and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A block is a heading when taller than `heading_ratio` times the
    /// page's mean block height.
    pub heading_ratio: f64,
    /// Recognizer confidence (0-100) a word must exceed to be kept.
    pub min_confidence: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            heading_ratio: 1.5,
            min_confidence: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockClassifier {
    config: ClassifierConfig,
}

impl BlockClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Tag every block as heading or paragraph relative to the page mean.
    ///
    /// Pure function of the block set; output keeps input order.
    pub fn classify(&self, blocks: &[TextBlock]) -> Result<PageLayout, ClassifyError> {
        if blocks.is_empty() {
            return Err(ClassifyError::EmptyPage);
        }

        let total: f64 = blocks.iter().map(|b| f64::from(b.height)).sum();
        let avg_height = total / blocks.len() as f64;
        let cutoff = avg_height * self.config.heading_ratio;

        let blocks = blocks
            .iter()
            .map(|block| ClassifiedBlock {
                kind: if f64::from(block.height) > cutoff {
                    BlockKind::Heading
                } else {
                    BlockKind::Paragraph
                },
                block: block.clone(),
            })
            .collect();
        Ok(PageLayout { blocks })
    }

    /// Classify, treating a page without blocks as an empty layout.
    pub fn classify_or_empty(&self, blocks: &[TextBlock]) -> PageLayout {
        self.classify(blocks).unwrap_or_default()
    }
}

/// Otsu-binarize the page and collect confident, non-empty word blocks.
pub fn extract_text_blocks(
    image: &DynamicImage,
    recognizer: &dyn Recognizer,
    min_confidence: f32,
) -> Result<Vec<TextBlock>, OcrError> {
    let gray = image.to_luma8();
    let level = otsu_level(&gray);
    let binary = BinaryMask::threshold(&gray, level, Polarity::Direct).to_image();

    let words = recognizer.recognize_words(&DynamicImage::ImageLuma8(binary))?;
    Ok(words
        .into_iter()
        .filter_map(|word| TextBlock::from_word(word, min_confidence))
        .collect())
}

/// Render the headings/paragraphs report.
pub fn render_report(layout: &PageLayout) -> String {
    let mut out = String::from("=== Headings ===\n");
    for block in layout.headings() {
        let _ = writeln!(out, "{} (coordinates: {}, {})", block.text, block.x, block.y);
    }
    out.push_str("\n=== Paragraphs ===\n");
    for block in layout.paragraphs() {
        let _ = writeln!(out, "{} (coordinates: {}, {})", block.text, block.x, block.y);
    }
    out
}

pub fn write_report(layout: &PageLayout, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, render_report(layout))
}
