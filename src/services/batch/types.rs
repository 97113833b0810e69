//! Batch service types, errors and events.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::models::BatchResult;
use crate::ocr::OcrError;

/// Events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Batch started with this many items.
    Started { total: usize },
    /// A worker picked up an item.
    ItemStarted { name: String },
    /// Item finished and its artifact was written.
    ItemCompleted { name: String, items: usize },
    /// Item failed; the batch goes on.
    ItemFailed { name: String, error: String },
    /// Every item has a result.
    Completed { succeeded: usize, failed: usize },
}

/// Why a single unit failed. Never aborts the batch.
#[derive(Debug, Error)]
pub enum UnitError {
    #[error("could not decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("recognition failed: {0}")]
    Recognition(#[from] OcrError),

    #[error("worker failed: {0}")]
    Pool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize output: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for UnitError {
    fn from(e: serde_json::Error) -> Self {
        UnitError::Serialize(e.to_string())
    }
}

impl From<csv::Error> for UnitError {
    fn from(e: csv::Error) -> Self {
        UnitError::Serialize(e.to_string())
    }
}

impl From<image::ImageError> for UnitError {
    fn from(e: image::ImageError) -> Self {
        UnitError::Serialize(e.to_string())
    }
}

/// Errors that stop a batch before every item has a result.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write batch summary: {0}")]
    Summary(String),

    #[error("worker pool closed")]
    PoolClosed,
}

/// Record written to `batch_summary.json` once the batch has finished.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary<'a> {
    pub task: &'a str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: &'a [BatchResult],
}
