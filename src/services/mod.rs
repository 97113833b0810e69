//! Service layer for pagesift pipelines.
//!
//! Orchestration separated from UI concerns. Services report progress
//! through event channels so the CLI (or any other caller) decides how to
//! render it.

pub mod batch;
pub mod discovery;
pub mod documents;

pub use batch::{
    assign_artifact_stems, default_workers, run_ocr_batch, BatchError, BatchEvent, BatchRunner, BlockTask, EnhanceTask,
    LayoutTask, OcrTask, PageTask, TableTask, UnitError,
};
pub use discovery::{default_image_extensions, enumerate_documents, enumerate_images, is_pdf};
pub use documents::{classify_document, DocumentError, DocumentProcessor, DocumentRun};
