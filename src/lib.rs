//! pagesift - structured extraction from scanned document pages.
//!
//! Locates ruled tables, separates headings from body text, and runs OCR
//! over large batches of pages with bounded parallelism. Recognition itself
//! is delegated to an external engine behind [`ocr::Recognizer`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod models;
pub mod ocr;
pub mod services;
