//! Table extraction: ruled-region detection plus per-cell recognition.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, warn};

use super::detector::{DetectionMode, RegionDetector};
use crate::models::{Region, TableCell};
use crate::ocr::Recognizer;

/// Column header of the table CSV.
pub const CSV_HEADER: &str = "Content";

pub struct TableExtractor {
    detector: RegionDetector,
    recognizer: Arc<dyn Recognizer>,
}

impl TableExtractor {
    pub fn new(detector: RegionDetector, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Detect table regions and recognize each one.
    ///
    /// A cell whose recognition fails is logged and skipped; cells with no
    /// text are dropped. Cells come back in reading order.
    pub fn extract_cells(&self, image: &DynamicImage) -> Vec<TableCell> {
        let regions = self.detector.detect_regions(image, DetectionMode::Table);
        let total = regions.len();

        let mut cells: Vec<TableCell> = regions
            .into_iter()
            .filter_map(|region| self.recognize_region(image, region))
            .filter_map(|region| {
                let text = region.text?.trim().to_string();
                (!text.is_empty()).then_some(TableCell {
                    x: region.x,
                    y: region.y,
                    text,
                })
            })
            .collect();
        cells.sort_by_key(|cell| (cell.y, cell.x));

        debug!(regions = total, cells = cells.len(), "Table cells extracted");
        cells
    }

    fn recognize_region(&self, image: &DynamicImage, region: Region) -> Option<Region> {
        let crop = image.crop_imm(region.x, region.y, region.width, region.height);
        match self.recognizer.recognize(&crop) {
            Ok(lines) => Some(region.with_text(lines.join("\n"))),
            Err(e) => {
                warn!(
                    "Cell at ({}, {}) {}x{} skipped: {}",
                    region.x, region.y, region.width, region.height, e
                );
                None
            }
        }
    }
}

/// Write cells as a single-column CSV. Zero cells still produce the header.
pub fn write_csv(cells: &[TableCell], path: &Path) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([CSV_HEADER])?;
    for cell in cells {
        writer.write_record([cell.text.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    use super::*;
    use crate::ocr::OcrError;

    /// Recognizer that answers by crop position: fails for crops wider than
    /// `fail_wider_than`, returns blank text for crops narrower than
    /// `blank_narrower_than`.
    struct SizeRecognizer {
        fail_wider_than: u32,
        blank_narrower_than: u32,
    }

    impl Recognizer for SizeRecognizer {
        fn name(&self) -> &str {
            "size"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn recognize(&self, image: &DynamicImage) -> Result<Vec<String>, OcrError> {
            if image.width() > self.fail_wider_than {
                return Err(OcrError::OcrFailed("too wide".to_string()));
            }
            if image.width() < self.blank_narrower_than {
                return Ok(vec!["   ".to_string()]);
            }
            Ok(vec![format!("w{}", image.width()), "second".to_string()])
        }
    }

    fn boxed_page(boxes: &[(u32, u32, u32, u32)]) -> DynamicImage {
        // Each box is drawn as a 3px outline.
        let img = GrayImage::from_fn(600, 500, |x, y| {
            let ink = boxes.iter().any(|&(bx, by, bw, bh)| {
                let inside = x >= bx && x < bx + bw && y >= by && y < by + bh;
                let interior = x >= bx + 3 && x + 3 < bx + bw && y >= by + 3 && y + 3 < by + bh;
                inside && !interior
            });
            Luma([if ink { 0 } else { 255 }])
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn cells_are_sorted_and_filtered() {
        let recognizer = Arc::new(SizeRecognizer {
            fail_wider_than: 400,
            blank_narrower_than: 100,
        });
        let extractor = TableExtractor::new(RegionDetector::default(), recognizer);
        let page = boxed_page(&[
            (300, 40, 200, 100), // second in reading order
            (20, 40, 200, 100),  // first
            (20, 250, 80, 100),  // blank text, dropped
            (20, 380, 500, 80),  // recognizer fails, dropped
        ]);

        let cells = extractor.extract_cells(&page);
        assert_eq!(cells.len(), 2);
        assert!(cells[0].x < cells[1].x);
        assert_eq!(cells[0].y, cells[1].y);
        assert!(cells[0].text.starts_with('w'));
        assert!(cells[0].text.ends_with("\nsecond"));
    }

    #[test]
    fn blank_page_yields_no_cells() {
        let recognizer = Arc::new(SizeRecognizer {
            fail_wider_than: u32::MAX,
            blank_narrower_than: 0,
        });
        let extractor = TableExtractor::new(RegionDetector::default(), recognizer);
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 200, Luma([255])));
        assert!(extractor.extract_cells(&blank).is_empty());
    }

    #[test]
    fn csv_has_content_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page.csv");
        let cells = vec![
            TableCell { x: 1, y: 1, text: "Total".to_string() },
            TableCell { x: 9, y: 1, text: "1,024".to_string() },
        ];
        write_csv(&cells, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Content\nTotal\n\"1,024\"\n");
    }

    #[test]
    fn empty_csv_is_header_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.csv");
        write_csv(&[], &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Content\n");
    }
}
