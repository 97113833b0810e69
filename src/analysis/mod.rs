//! Page analysis: region detection, table extraction, block classification
//! and image enhancement.

mod blocks;
mod contours;
mod detector;
mod enhance;
mod mask;
mod table;

pub use blocks::{
    extract_text_blocks, render_report, write_report, BlockClassifier, ClassifierConfig,
    ClassifyError,
};
pub use contours::external_boxes;
pub use detector::{DetectionConfig, DetectionMode, RegionDetector};
pub use enhance::{enhance_page, morphological_gradient};
pub use mask::{BinaryMask, Polarity};
pub use table::{write_csv, TableExtractor, CSV_HEADER};
