//! Region models produced by the region detector.

use serde::{Deserialize, Serialize};

/// Inclusive axis-aligned bounding box of a contour, before size filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Build the smallest box covering all points.
    ///
    /// Returns `None` for an empty point set.
    pub fn covering<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut iter = points.into_iter();
        let (x0, y0) = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
        for (x, y) in iter {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// A candidate content block in pixel coordinates.
///
/// Only constructed through [`Region::from_box`], so every region is strictly
/// larger than the minimum size it was filtered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Recognized text, when the region went through the recognizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Region {
    /// Promote a bounding box to a region if it is strictly wider than
    /// `min_width` and strictly taller than `min_height`.
    pub fn from_box(bbox: BoundingBox, min_width: u32, min_height: u32) -> Option<Self> {
        if bbox.width > min_width && bbox.height > min_height {
            Some(Self {
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
                text: None,
            })
        } else {
            None
        }
    }

    /// Reading-order key: top-to-bottom, then left-to-right.
    pub fn reading_key(&self) -> (u32, u32) {
        (self.y, self.x)
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }
}

/// One recognized table cell, ready for tabular output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub x: u32,
    pub y: u32,
    pub text: String,
}
