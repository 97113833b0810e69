//! Data models for pagesift.

mod batch;
mod block;
mod region;

pub use batch::{BatchResult, BatchStatus, SourceItem, UnitOutcome, UnitOutput};
pub use block::{BlockKind, ClassifiedBlock, PageLayout, RecognizedWord, TextBlock};
pub use region::{BoundingBox, Region, TableCell};
