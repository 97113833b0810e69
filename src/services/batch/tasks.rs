//! Unit bodies run by the batch runner, one per pipeline.
//!
//! Each task loads one page, does its work and writes exactly one primary
//! artifact named after the item's output stem into the output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, Rgb, RgbImage};
use serde::Serialize;
use tracing::{debug, warn};

use super::types::UnitError;
use crate::analysis::{
    enhance_page, extract_text_blocks, write_csv, write_report, BlockClassifier, DetectionMode,
    RegionDetector, TableExtractor,
};
use crate::models::{Region, SourceItem, UnitOutput};
use crate::ocr::{OcrError, Recognizer};

/// Work done for one item inside a worker slot.
pub trait PageTask: Send + Sync {
    /// Short name for logs and the batch summary.
    fn name(&self) -> &'static str;

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError>;
}

/// Decode the item's image.
pub fn load_page(item: &SourceItem) -> Result<DynamicImage, UnitError> {
    image::open(&item.path).map_err(|e| UnitError::Decode {
        path: item.path.clone(),
        message: e.to_string(),
    })
}

fn artifact_path(item: &SourceItem, output_dir: &Path, suffix: &str) -> PathBuf {
    output_dir.join(format!("{}{}", item.output_stem(), suffix))
}

#[derive(Serialize)]
struct OcrArtifact<'a> {
    file: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    text: &'a [String],
}

/// Plain OCR: `<stem>.json` with the recognized lines.
pub struct OcrTask {
    recognizer: Arc<dyn Recognizer>,
}

impl OcrTask {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }
}

impl PageTask for OcrTask {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError> {
        let image = load_page(item)?;
        let result = self.recognizer.recognize_timed(&image)?;
        debug!(
            "{}: {} lines from {} in {}ms",
            item.name,
            result.lines.len(),
            result.backend,
            result.processing_time_ms
        );

        let artifact = artifact_path(item, output_dir, ".json");
        let json = serde_json::to_string_pretty(&OcrArtifact {
            file: &item.name,
            page: item.page,
            text: &result.lines,
        })?;
        std::fs::write(&artifact, json)?;

        Ok(UnitOutput {
            artifact,
            items: result.lines.len(),
        })
    }
}

/// Table extraction: `<stem>.csv` with one `Content` column.
pub struct TableTask {
    extractor: TableExtractor,
}

impl TableTask {
    pub fn new(detector: RegionDetector, recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            extractor: TableExtractor::new(detector, recognizer),
        }
    }
}

impl PageTask for TableTask {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError> {
        let image = load_page(item)?;
        let cells = self.extractor.extract_cells(&image);
        let artifact = artifact_path(item, output_dir, ".csv");
        write_csv(&cells, &artifact)?;
        Ok(UnitOutput {
            artifact,
            items: cells.len(),
        })
    }
}

/// Heading/paragraph analysis: `<stem>_headings.txt`.
pub struct LayoutTask {
    recognizer: Arc<dyn Recognizer>,
    classifier: BlockClassifier,
}

impl LayoutTask {
    pub fn new(recognizer: Arc<dyn Recognizer>, classifier: BlockClassifier) -> Self {
        Self {
            recognizer,
            classifier,
        }
    }
}

impl PageTask for LayoutTask {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError> {
        let image = load_page(item)?;
        let blocks = extract_text_blocks(
            &image,
            self.recognizer.as_ref(),
            self.classifier.config().min_confidence,
        )?;
        let layout = self.classifier.classify_or_empty(&blocks);

        let artifact = artifact_path(item, output_dir, "_headings.txt");
        write_report(&layout, &artifact)?;
        Ok(UnitOutput {
            artifact,
            items: layout.len(),
        })
    }
}

#[derive(Serialize)]
struct BlockRecord {
    block: usize,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Outline thickness and color of the annotated block image.
const OUTLINE_WIDTH: u32 = 2;
const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Layout block analysis: `<stem>_blocks.json` plus `<stem>_blocks.png`
/// with every block outlined. With a recognizer attached it also writes the
/// engine's page layout to `<stem>_layout.hocr`.
pub struct BlockTask {
    detector: RegionDetector,
    recognizer: Option<Arc<dyn Recognizer>>,
}

impl BlockTask {
    pub fn new(detector: RegionDetector) -> Self {
        Self {
            detector,
            recognizer: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    fn write_hocr(
        &self,
        image: &DynamicImage,
        item: &SourceItem,
        output_dir: &Path,
    ) -> Result<(), UnitError> {
        let Some(recognizer) = &self.recognizer else {
            return Ok(());
        };
        match recognizer.recognize_hocr(image) {
            Ok(hocr) => {
                std::fs::write(artifact_path(item, output_dir, "_layout.hocr"), hocr)?;
                Ok(())
            }
            Err(e @ OcrError::Unsupported { .. }) => {
                warn!("{}: skipping hOCR layout: {}", item.name, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl PageTask for BlockTask {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError> {
        let image = load_page(item)?;
        let regions = self.detector.detect_regions(&image, DetectionMode::Blocks);

        let records: Vec<BlockRecord> = regions
            .iter()
            .enumerate()
            .map(|(i, r)| BlockRecord {
                block: i + 1,
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            })
            .collect();
        let artifact = artifact_path(item, output_dir, "_blocks.json");
        std::fs::write(&artifact, serde_json::to_string_pretty(&records)?)?;

        let mut annotated = image.to_rgb8();
        for region in &regions {
            draw_outline(&mut annotated, region);
        }
        annotated.save(artifact_path(item, output_dir, "_blocks.png"))?;
        self.write_hocr(&image, item, output_dir)?;

        Ok(UnitOutput {
            artifact,
            items: regions.len(),
        })
    }
}

fn draw_outline(canvas: &mut RgbImage, region: &Region) {
    let (width, height) = canvas.dimensions();
    let x_end = (region.x + region.width).min(width);
    let y_end = (region.y + region.height).min(height);
    for y in region.y..y_end {
        for x in region.x..x_end {
            let on_edge = x < region.x + OUTLINE_WIDTH
                || y < region.y + OUTLINE_WIDTH
                || x + OUTLINE_WIDTH >= region.x + region.width
                || y + OUTLINE_WIDTH >= region.y + region.height;
            if on_edge {
                canvas.put_pixel(x, y, OUTLINE_COLOR);
            }
        }
    }
}

/// Preprocessing: `<stem>_enhanced.png`.
pub struct EnhanceTask {
    threshold: u8,
}

impl EnhanceTask {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl PageTask for EnhanceTask {
    fn name(&self) -> &'static str {
        "enhance"
    }

    fn run(&self, item: &SourceItem, output_dir: &Path) -> Result<UnitOutput, UnitError> {
        let image = load_page(item)?;
        let enhanced = enhance_page(&image, self.threshold);
        let artifact = artifact_path(item, output_dir, "_enhanced.png");
        enhanced.save(&artifact)?;
        Ok(UnitOutput { artifact, items: 1 })
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};
    use tempfile::TempDir;

    use super::*;
    use crate::models::RecognizedWord;

    struct FixedRecognizer;

    impl Recognizer for FixedRecognizer {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<String>, OcrError> {
            Ok(vec!["Invoice 42".to_string(), "Total 10.00".to_string()])
        }

        fn recognize_words(&self, _image: &DynamicImage) -> Result<Vec<RecognizedWord>, OcrError> {
            Ok(vec![
                RecognizedWord {
                    text: "Invoice".to_string(),
                    x: 10,
                    y: 5,
                    width: 120,
                    height: 40,
                    confidence: 95.0,
                },
                RecognizedWord {
                    text: "line".to_string(),
                    x: 10,
                    y: 60,
                    width: 40,
                    height: 10,
                    confidence: 90.0,
                },
                RecognizedWord {
                    text: "more".to_string(),
                    x: 60,
                    y: 60,
                    width: 40,
                    height: 10,
                    confidence: 90.0,
                },
            ])
        }
    }

    fn write_page(dir: &Path, name: &str, rects: &[(u32, u32, u32, u32)]) -> SourceItem {
        let img = GrayImage::from_fn(240, 160, |x, y| {
            let ink = rects
                .iter()
                .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
            Luma([if ink { 0 } else { 255 }])
        });
        let path = dir.join(name);
        img.save(&path).unwrap();
        SourceItem::from_path(path)
    }

    #[test]
    fn ocr_task_writes_json_with_page() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "scan_page_2.png", &[]).with_page(2);

        let out = OcrTask::new(Arc::new(FixedRecognizer))
            .run(&item, output.path())
            .unwrap();
        assert_eq!(out.items, 2);
        assert_eq!(out.artifact, output.path().join("scan_page_2.json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out.artifact).unwrap()).unwrap();
        assert_eq!(json["file"], "scan_page_2.png");
        assert_eq!(json["page"], 2);
        assert_eq!(json["text"][1], "Total 10.00");
    }

    #[test]
    fn ocr_task_omits_page_for_plain_images() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "a.png", &[]);
        let out = OcrTask::new(Arc::new(FixedRecognizer))
            .run(&item, output.path())
            .unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out.artifact).unwrap()).unwrap();
        assert!(json.get("page").is_none());
    }

    #[test]
    fn undecodable_input_is_a_decode_error() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let path = input.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = OcrTask::new(Arc::new(FixedRecognizer))
            .run(&SourceItem::from_path(path), output.path())
            .unwrap_err();
        assert!(matches!(err, UnitError::Decode { .. }));
    }

    #[test]
    fn table_task_writes_header_for_plain_page() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "memo.png", &[(20, 20, 8, 12)]);

        let out = TableTask::new(RegionDetector::default(), Arc::new(FixedRecognizer))
            .run(&item, output.path())
            .unwrap();
        assert_eq!(out.items, 0);
        assert_eq!(std::fs::read_to_string(out.artifact).unwrap(), "Content\n");
    }

    #[test]
    fn layout_task_writes_report() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "letter.png", &[]);

        let out = LayoutTask::new(Arc::new(FixedRecognizer), BlockClassifier::default())
            .run(&item, output.path())
            .unwrap();
        assert_eq!(out.items, 3);
        let report = std::fs::read_to_string(out.artifact).unwrap();
        assert!(report.starts_with("=== Headings ===\nInvoice (coordinates: 10, 5)\n"));
        assert!(report.contains("=== Paragraphs ===\nline (coordinates: 10, 60)\n"));
    }

    #[test]
    fn block_task_writes_json_and_annotation() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "form.png", &[(20, 20, 100, 40), (20, 100, 150, 30)]);

        let out = BlockTask::new(RegionDetector::default())
            .run(&item, output.path())
            .unwrap();
        assert_eq!(out.items, 2);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out.artifact).unwrap()).unwrap();
        assert_eq!(json[0]["block"], 1);
        assert_eq!(json[1]["block"], 2);

        let annotated = image::open(output.path().join("form_blocks.png"))
            .unwrap()
            .to_rgb8();
        let x = json[0]["x"].as_u64().unwrap() as u32;
        let y = json[0]["y"].as_u64().unwrap() as u32;
        assert_eq!(*annotated.get_pixel(x, y), OUTLINE_COLOR);
    }

    struct HocrRecognizer {
        fail: bool,
    }

    impl Recognizer for HocrRecognizer {
        fn name(&self) -> &str {
            "hocr"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn availability_hint(&self) -> String {
            String::new()
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<Vec<String>, OcrError> {
            Ok(Vec::new())
        }

        fn recognize_hocr(&self, image: &DynamicImage) -> Result<String, OcrError> {
            if self.fail {
                return Err(OcrError::OcrFailed("layout pass crashed".to_string()));
            }
            Ok(format!(
                "<div class='ocr_page' title='bbox 0 0 {} {}'></div>",
                image.width(),
                image.height()
            ))
        }
    }

    #[test]
    fn block_task_writes_hocr_layout_when_recognizer_attached() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "form.png", &[(20, 20, 100, 40)]);

        BlockTask::new(RegionDetector::default())
            .with_recognizer(Arc::new(HocrRecognizer { fail: false }))
            .run(&item, output.path())
            .unwrap();
        let hocr = std::fs::read_to_string(output.path().join("form_layout.hocr")).unwrap();
        assert!(hocr.contains("bbox 0 0 240 160"));
    }

    #[test]
    fn block_task_without_hocr_support_still_succeeds() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "form.png", &[(20, 20, 100, 40)]);

        // FixedRecognizer keeps the default, unsupported hOCR method.
        let out = BlockTask::new(RegionDetector::default())
            .with_recognizer(Arc::new(FixedRecognizer))
            .run(&item, output.path())
            .unwrap();
        assert_eq!(out.items, 1);
        assert!(!output.path().join("form_layout.hocr").exists());

        BlockTask::new(RegionDetector::default())
            .run(&item, output.path())
            .unwrap();
        assert!(!output.path().join("form_layout.hocr").exists());
    }

    #[test]
    fn block_task_fails_when_hocr_pass_errors() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "form.png", &[(20, 20, 100, 40)]);

        let err = BlockTask::new(RegionDetector::default())
            .with_recognizer(Arc::new(HocrRecognizer { fail: true }))
            .run(&item, output.path())
            .unwrap_err();
        assert!(matches!(err, UnitError::Recognition(_)));
    }

    #[test]
    fn enhance_task_writes_png() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let item = write_page(input.path(), "noisy.png", &[(40, 40, 60, 60)]);

        let out = EnhanceTask::new(128).run(&item, output.path()).unwrap();
        assert_eq!(out.artifact, output.path().join("noisy_enhanced.png"));
        let enhanced = image::open(&out.artifact).unwrap().to_luma8();
        assert_eq!(enhanced.dimensions(), (240, 160));
    }
}
