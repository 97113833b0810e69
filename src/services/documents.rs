//! Multi-page documents: split into page images, then OCR every page.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::batch::{BatchError, BatchEvent, BatchRunner, OcrTask};
use super::discovery::is_pdf;
use crate::models::{BatchResult, SourceItem};
use crate::ocr::{DocumentClassifier, OcrError, PageConverter, Recognizer};

/// Resolution pages are rendered at unless configured otherwise.
pub const DEFAULT_DPI: u32 = 300;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not convert {path}: {source}")]
    Conversion {
        path: PathBuf,
        #[source]
        source: OcrError,
    },

    #[error("could not save page {page}: {message}")]
    PageSave { page: u32, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker failed: {0}")]
    Pool(String),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("could not decode {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("classification failed: {0}")]
    Classification(#[source] OcrError),
}

/// Outcome of one document. A failed document does not stop the rest.
#[derive(Debug)]
pub struct DocumentRun {
    pub name: String,
    pub outcome: Result<Vec<BatchResult>, DocumentError>,
}

pub struct DocumentProcessor {
    converter: Arc<dyn PageConverter>,
    recognizer: Arc<dyn Recognizer>,
    dpi: u32,
    workers: usize,
}

impl DocumentProcessor {
    pub fn new(
        converter: Arc<dyn PageConverter>,
        recognizer: Arc<dyn Recognizer>,
        dpi: u32,
        workers: usize,
    ) -> Self {
        Self {
            converter,
            recognizer,
            dpi,
            workers,
        }
    }

    /// Render `document` and OCR its pages into `<output_root>/<stem>/`.
    ///
    /// Pages are saved as `<stem>_page_<n>.png` (1-based) and each gets a
    /// `<stem>_page_<n>.json` result.
    pub async fn process(
        &self,
        document: &Path,
        output_root: &Path,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Result<Vec<BatchResult>, DocumentError> {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let page_dir = output_root.join(&stem);
        tokio::fs::create_dir_all(&page_dir).await?;

        let pages = self.convert(document).await?;
        info!("{}: {} pages", document.display(), pages.len());

        let items = save_pages(pages, &page_dir, &stem).await?;
        let runner = BatchRunner::new(&page_dir, self.workers);
        let results = runner
            .run(
                items,
                Arc::new(OcrTask::new(self.recognizer.clone())),
                event_tx,
            )
            .await?;
        Ok(results)
    }

    /// Process documents one after another; failures are logged and kept.
    pub async fn process_all(
        &self,
        documents: &[PathBuf],
        output_root: &Path,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Vec<DocumentRun> {
        let mut runs = Vec::with_capacity(documents.len());
        for document in documents {
            let name = document
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let outcome = self.process(document, output_root, event_tx.clone()).await;
            if let Err(ref e) = outcome {
                warn!("Skipping {}: {}", name, e);
            }
            runs.push(DocumentRun { name, outcome });
        }
        runs
    }

    async fn convert(&self, document: &Path) -> Result<Vec<DynamicImage>, DocumentError> {
        let converter = self.converter.clone();
        let path = document.to_path_buf();
        let dpi = self.dpi;
        tokio::task::spawn_blocking(move || {
            converter
                .convert(&path, dpi)
                .map_err(|source| DocumentError::Conversion { path, source })
        })
        .await
        .map_err(|e| DocumentError::Pool(e.to_string()))?
    }
}

async fn save_pages(
    pages: Vec<DynamicImage>,
    page_dir: &Path,
    stem: &str,
) -> Result<Vec<SourceItem>, DocumentError> {
    let page_dir = page_dir.to_path_buf();
    let stem = stem.to_string();
    tokio::task::spawn_blocking(move || {
        pages
            .iter()
            .zip(1u32..)
            .map(|(page, number)| -> Result<SourceItem, DocumentError> {
                let path = page_dir.join(format!("{}_page_{}.png", stem, number));
                page.save(&path).map_err(|e| DocumentError::PageSave {
                    page: number,
                    message: e.to_string(),
                })?;
                Ok(SourceItem::from_path(path).with_page(number))
            })
            .collect()
    })
    .await
    .map_err(|e| DocumentError::Pool(e.to_string()))?
}

/// First page of an image or PDF, as the classifier sees it.
pub fn first_page(
    path: &Path,
    converter: &dyn PageConverter,
    dpi: u32,
) -> Result<DynamicImage, DocumentError> {
    if is_pdf(path) {
        let pages = converter
            .convert(path, dpi)
            .map_err(|source| DocumentError::Conversion {
                path: path.to_path_buf(),
                source,
            })?;
        return pages.into_iter().next().ok_or_else(|| DocumentError::Conversion {
            path: path.to_path_buf(),
            source: OcrError::OcrFailed("document has no pages".to_string()),
        });
    }
    image::open(path).map_err(|e| DocumentError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Label a whole document from its first page.
pub fn classify_document(
    path: &Path,
    converter: &dyn PageConverter,
    classifier: &dyn DocumentClassifier,
    dpi: u32,
) -> Result<String, DocumentError> {
    let page = first_page(path, converter, dpi)?;
    classifier
        .classify_document(&page)
        .map_err(DocumentError::Classification)
}
