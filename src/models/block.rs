//! Text block models for heading/paragraph analysis.

use serde::{Deserialize, Serialize};

/// A word-level result from the recognizer, before confidence filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedWord {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Engine confidence on a 0-100 scale. Negative for structural rows.
    pub confidence: f32,
}

/// A unit of text passed to the block classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Keep a recognized word if it clears the confidence bar and has text.
    pub fn from_word(word: RecognizedWord, min_confidence: f32) -> Option<Self> {
        let text = word.text.trim();
        if word.confidence > min_confidence && !text.is_empty() {
            Some(Self::new(text, word.x, word.y, word.width, word.height))
        } else {
            None
        }
    }
}

/// Role of a block within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedBlock {
    pub kind: BlockKind,
    #[serde(flatten)]
    pub block: TextBlock,
}

/// Classified blocks of one page, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageLayout {
    pub blocks: Vec<ClassifiedBlock>,
}

impl PageLayout {
    pub fn headings(&self) -> impl Iterator<Item = &TextBlock> {
        self.of_kind(BlockKind::Heading)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &TextBlock> {
        self.of_kind(BlockKind::Paragraph)
    }

    fn of_kind(&self, kind: BlockKind) -> impl Iterator<Item = &TextBlock> {
        self.blocks
            .iter()
            .filter(move |b| b.kind == kind)
            .map(|b| &b.block)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}
