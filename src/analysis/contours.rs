//! External contour extraction over binary masks.

use imageproc::contours::{find_contours, BorderType};

use super::mask::BinaryMask;
use crate::models::BoundingBox;

/// Bounding boxes of the outermost borders in `mask`.
///
/// Holes and anything nested inside a hole are ignored, so a table grid
/// yields one box for the whole grid rather than one per cell.
pub fn external_boxes(mask: &BinaryMask) -> Vec<BoundingBox> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }

    find_contours::<u32>(&mask.to_image())
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| BoundingBox::covering(contour.points.iter().map(|p| (p.x, p.y))))
        .collect()
}
