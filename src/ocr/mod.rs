//! Recognition engines and other external collaborators.
//!
//! Everything the core consumes as a black box lives here:
//! - `Recognizer`: turns a page or crop into text (Tesseract by default)
//! - `PageConverter`: turns a multi-page document into page images (pdftoppm)
//! - `DocumentClassifier`: labels a whole document (external command)
//!
//! Recognizers are shared across batch workers as `Arc<dyn Recognizer>` and
//! must be safe to call concurrently. Engines that keep mutable state
//! implement `StatefulRecognizer` and are wrapped in `Serialized`.

mod backend;
mod classifier;
mod model_utils;
mod pdf_utils;
mod serialized;
mod tesseract;

pub use backend::{OcrConfig, OcrError, OcrResult, Recognizer, StatefulRecognizer};
pub use classifier::{CommandClassifier, DocumentClassifier, DocumentClassifierConfig};
pub use model_utils::{check_binary, check_pdftoppm_hint};
pub use pdf_utils::{PageConverter, PdftoppmConverter};
pub use serialized::Serialized;
pub use tesseract::{parse_tsv, TesseractBackend};
