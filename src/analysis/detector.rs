//! Rectangular region detection.
//!
//! Thresholding, a small erode/dilate pass to stabilize strokes, an optional
//! line-kernel opening that keeps only ruled table lines, then external
//! contours filtered by size.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::contours::external_boxes;
use super::mask::{BinaryMask, Polarity};
use crate::models::Region;

/// Tunables for region detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Global binarization threshold. Pixels at or below it are ink.
    pub threshold: u8,
    /// Side of the square erosion kernel (one pass).
    pub erode_kernel: u32,
    /// Side of the square dilation kernel.
    pub dilate_kernel: u32,
    pub dilate_iterations: u32,
    /// Length of the horizontal and vertical line kernels in table mode.
    pub line_length: u32,
    /// Regions must be strictly wider than this.
    pub min_region_width: u32,
    /// Regions must be strictly taller than this.
    pub min_region_height: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 128,
            erode_kernel: 2,
            dilate_kernel: 2,
            dilate_iterations: 2,
            line_length: 50,
            min_region_width: 50,
            min_region_height: 20,
        }
    }
}

/// What kind of regions to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Keep only structures made of long horizontal/vertical lines.
    Table,
    /// Keep every ink blob that survives stabilization.
    Blocks,
}

/// Finds candidate regions on a page.
#[derive(Debug, Clone, Default)]
pub struct RegionDetector {
    config: DetectionConfig,
}

impl RegionDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Inverted global threshold over the grayscale page.
    pub fn binarize(&self, image: &DynamicImage) -> BinaryMask {
        BinaryMask::threshold(&image.to_luma8(), self.config.threshold, Polarity::Inverted)
    }

    /// Erode once, then dilate `dilate_iterations` times.
    pub fn stabilize(&self, mask: &BinaryMask) -> BinaryMask {
        let mut out = mask.erode(self.config.erode_kernel, self.config.erode_kernel);
        for _ in 0..self.config.dilate_iterations {
            out = out.dilate(self.config.dilate_kernel, self.config.dilate_kernel);
        }
        out
    }

    /// Union of the horizontal and vertical line openings.
    pub fn table_skeleton(&self, mask: &BinaryMask) -> BinaryMask {
        let len = self.config.line_length.max(1);
        let horizontal = mask.open(len, 1);
        let vertical = mask.open(1, len);
        horizontal.union(&vertical)
    }

    /// The mask contours are taken from for `mode`.
    pub fn mask_for(&self, image: &DynamicImage, mode: DetectionMode) -> BinaryMask {
        let stabilized = self.stabilize(&self.binarize(image));
        match mode {
            DetectionMode::Table => self.table_skeleton(&stabilized),
            DetectionMode::Blocks => stabilized,
        }
    }

    /// Size-filtered regions in reading order (top to bottom, then left to
    /// right). A page with nothing on it yields an empty list.
    pub fn detect_regions(&self, image: &DynamicImage, mode: DetectionMode) -> Vec<Region> {
        let mask = self.mask_for(image, mode);
        let boxes = external_boxes(&mask);
        let contour_count = boxes.len();

        let mut regions: Vec<Region> = boxes
            .into_iter()
            .filter_map(|bbox| {
                Region::from_box(
                    bbox,
                    self.config.min_region_width,
                    self.config.min_region_height,
                )
            })
            .collect();
        regions.sort_by_key(Region::reading_key);

        debug!(
            ?mode,
            contours = contour_count,
            regions = regions.len(),
            "Region detection finished"
        );
        regions
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    fn page(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> DynamicImage {
        let img = GrayImage::from_fn(width, height, |x, y| {
            let ink = rects
                .iter()
                .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
            Luma([if ink { 0 } else { 255 }])
        });
        DynamicImage::ImageLuma8(img)
    }

    /// A 3px-ruled grid from (50, 50) spanning 300x200 with 3 rows and 4 columns.
    fn grid_lines() -> Vec<(u32, u32, u32, u32)> {
        let mut rects = Vec::new();
        for row in 0..=3 {
            rects.push((50, 50 + row * 66, 303, 3));
        }
        for col in 0..=4 {
            rects.push((50 + col * 75, 50, 3, 201));
        }
        rects
    }

    /// Short glyph-like strokes.
    fn text_strokes(x0: u32, y0: u32) -> Vec<(u32, u32, u32, u32)> {
        (0..8).map(|i| (x0 + i * 14, y0, 8, 12)).collect()
    }

    #[test]
    fn blank_page_has_no_regions() {
        let detector = RegionDetector::default();
        let blank = page(400, 300, &[]);
        assert!(detector.detect_regions(&blank, DetectionMode::Table).is_empty());
        assert!(detector.detect_regions(&blank, DetectionMode::Blocks).is_empty());
    }

    #[test]
    fn table_mode_finds_ruled_grid() {
        let detector = RegionDetector::default();
        let mut rects = grid_lines();
        rects.extend(text_strokes(60, 60));
        let regions = detector.detect_regions(&page(420, 320, &rects), DetectionMode::Table);

        assert_eq!(regions.len(), 1);
        let table = &regions[0];
        assert!(table.x.abs_diff(50) <= 3, "x = {}", table.x);
        assert!(table.y.abs_diff(50) <= 3, "y = {}", table.y);
        assert!(table.width.abs_diff(303) <= 3, "width = {}", table.width);
        assert!(table.height.abs_diff(201) <= 3, "height = {}", table.height);
    }

    #[test]
    fn table_mode_ignores_plain_text() {
        let detector = RegionDetector::default();
        let mut rects = text_strokes(20, 20);
        rects.extend(text_strokes(20, 60));
        let regions = detector.detect_regions(&page(300, 120, &rects), DetectionMode::Table);
        assert!(regions.is_empty());
    }

    #[test]
    fn blocks_come_out_in_reading_order() {
        let detector = RegionDetector::default();
        let image = page(
            400,
            300,
            &[(200, 40, 80, 30), (20, 150, 80, 30), (20, 40, 80, 30)],
        );
        let regions = detector.detect_regions(&image, DetectionMode::Blocks);

        assert_eq!(regions.len(), 3);
        assert!(regions[0].x < regions[1].x);
        assert_eq!(regions[0].y, regions[1].y);
        assert!(regions[2].y > regions[1].y);
        for pair in regions.windows(2) {
            assert!(pair[0].reading_key() <= pair[1].reading_key());
        }
    }

    #[test]
    fn small_blocks_are_filtered() {
        let detector = RegionDetector::default();
        // The 60x25 block survives; the narrow and the short ones do not.
        let image = page(
            300,
            200,
            &[(10, 10, 60, 25), (100, 10, 30, 40), (10, 100, 90, 12)],
        );
        let regions = detector.detect_regions(&image, DetectionMode::Blocks);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].width > 50 && regions[0].height > 20);
        assert!(regions[0].text.is_none());
    }

    #[test]
    fn filter_limits_come_from_config() {
        let detector = RegionDetector::new(DetectionConfig {
            min_region_width: 10,
            min_region_height: 10,
            ..DetectionConfig::default()
        });
        let image = page(200, 200, &[(10, 10, 30, 40)]);
        assert_eq!(detector.detect_regions(&image, DetectionMode::Blocks).len(), 1);
    }

    #[test]
    fn detection_is_deterministic() {
        let detector = RegionDetector::default();
        let image = page(420, 320, &grid_lines());
        let first = detector.detect_regions(&image, DetectionMode::Table);
        let second = detector.detect_regions(&image, DetectionMode::Table);
        assert_eq!(first, second);
    }
}
