//! Binary masks and rectangular-kernel morphology.
//!
//! Kernels are rectangles of `width x height` with the anchor at
//! `(width / 2, height / 2)`. Out-of-image pixels never decide the result:
//! erosion only looks at in-bounds neighbours, dilation likewise.
//! Dilation uses the reflected kernel so that `open` never adds foreground.

use image::{GrayImage, Luma};

/// Which side of the threshold counts as ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Dark pixels (value <= threshold) are foreground.
    Inverted,
    /// Bright pixels (value > threshold) are foreground.
    Direct,
}

/// Single-channel foreground/background image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; (width as usize) * (height as usize)],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    /// Binarize a grayscale image with a fixed global threshold.
    pub fn threshold(gray: &GrayImage, threshold: u8, polarity: Polarity) -> Self {
        let (width, height) = gray.dimensions();
        let data = gray
            .pixels()
            .map(|Luma([v])| match polarity {
                Polarity::Inverted => *v <= threshold,
                Polarity::Direct => *v > threshold,
            })
            .collect();
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.data[idx] = value;
        }
    }

    pub fn foreground_count(&self) -> usize {
        self.data.iter().filter(|v| **v).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Render as an 8-bit image: foreground 255, background 0.
    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.data[self.index(x, y)] { 255 } else { 0 }])
        })
    }

    pub fn erode(&self, kernel_width: u32, kernel_height: u32) -> Self {
        self.apply_rect(kernel_width, kernel_height, Op::Erode)
    }

    pub fn dilate(&self, kernel_width: u32, kernel_height: u32) -> Self {
        self.apply_rect(kernel_width, kernel_height, Op::Dilate)
    }

    /// Erosion followed by dilation with the same kernel.
    pub fn open(&self, kernel_width: u32, kernel_height: u32) -> Self {
        self.erode(kernel_width, kernel_height)
            .dilate(kernel_width, kernel_height)
    }

    /// Pixelwise OR of two masks of the same size.
    ///
    /// # Panics
    ///
    /// If the masks differ in size.
    pub fn union(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a || b)
    }

    /// Pixels set in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        self.combine(other, |a, b| a && !b)
    }

    fn combine(&self, other: &Self, f: impl Fn(bool, bool) -> bool) -> Self {
        assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "mask sizes differ"
        );
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| f(*a, *b))
            .collect();
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Rectangular kernels are separable: run rows, then columns.
    fn apply_rect(&self, kernel_width: u32, kernel_height: u32, op: Op) -> Self {
        let mut out = self.clone();
        if kernel_width > 1 {
            out = out.apply_rows(kernel_width as usize, op);
        }
        if kernel_height > 1 {
            out = out.apply_columns(kernel_height as usize, op);
        }
        out
    }

    fn apply_rows(&self, k: usize, op: Op) -> Self {
        let w = self.width as usize;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks(w.max(1)) {
            data.extend(filter_line(row, k, op));
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    fn apply_columns(&self, k: usize, op: Op) -> Self {
        let w = self.width as usize;
        let h = self.height as usize;
        let mut data = vec![false; self.data.len()];
        let mut column = Vec::with_capacity(h);
        for x in 0..w {
            column.clear();
            column.extend((0..h).map(|y| self.data[y * w + x]));
            for (y, v) in filter_line(&column, k, op).into_iter().enumerate() {
                data[y * w + x] = v;
            }
        }
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Erode,
    Dilate,
}

/// 1-D min/max filter over a window of length `k` using prefix counts.
fn filter_line(line: &[bool], k: usize, op: Op) -> Vec<bool> {
    let n = line.len();
    if n == 0 {
        return Vec::new();
    }

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0usize);
    for v in line {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + usize::from(*v));
    }

    let anchor = k / 2;
    let (before, after) = match op {
        Op::Erode => (anchor, k - 1 - anchor),
        Op::Dilate => (k - 1 - anchor, anchor),
    };

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(n - 1);
            let count = prefix[hi + 1] - prefix[lo];
            match op {
                Op::Erode => count == hi - lo + 1,
                Op::Dilate => count > 0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_mask(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> BinaryMask {
        BinaryMask::from_fn(width, height, |x, y| {
            rects
                .iter()
                .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh)
        })
    }

    #[test]
    fn threshold_inverted_marks_ink() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[0u8, 128, 129][x as usize]]));
        let mask = BinaryMask::threshold(&gray, 128, Polarity::Inverted);
        assert!(mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(!mask.is_foreground(2, 0));

        let direct = BinaryMask::threshold(&gray, 128, Polarity::Direct);
        assert_eq!(direct.foreground_count(), 1);
        assert!(direct.is_foreground(2, 0));
    }

    #[test]
    fn erosion_removes_isolated_pixels() {
        let mut mask = rect_mask(20, 20, &[(5, 5, 6, 6)]);
        mask.set(15, 15, true);
        let eroded = mask.erode(2, 2);
        assert!(!eroded.is_foreground(15, 15));
        assert!(eroded.is_foreground(8, 8));
    }

    #[test]
    fn erode_then_dilate_regrows_shape() {
        let mask = rect_mask(30, 30, &[(10, 10, 8, 8)]);
        let stabilized = mask.erode(2, 2).dilate(2, 2).dilate(2, 2);
        // Erosion drops the first row/column, each reflected dilation adds
        // one back on the same side.
        assert!(!stabilized.is_foreground(8, 8));
        assert!(stabilized.is_foreground(9, 9));
        assert!(stabilized.is_foreground(17, 17));
        assert!(!stabilized.is_foreground(18, 18));
        assert_eq!(stabilized.foreground_count(), 9 * 9);
    }

    #[test]
    fn opening_keeps_long_lines_only() {
        let mask = rect_mask(
            200,
            40,
            &[(20, 10, 120, 3), (150, 25, 30, 3)],
        );
        let opened = mask.open(50, 1);
        assert!(opened.is_foreground(20, 10));
        assert!(opened.is_foreground(139, 12));
        assert_eq!(opened.foreground_count(), 120 * 3);
        assert!(!opened.is_foreground(160, 26));
    }

    #[test]
    fn opening_never_adds_foreground() {
        let mask = rect_mask(
            120,
            120,
            &[(3, 3, 70, 4), (90, 10, 5, 90), (40, 40, 12, 12)],
        );
        for (kw, kh) in [(50, 1), (1, 50), (2, 2), (3, 3)] {
            let opened = mask.open(kw, kh);
            assert_eq!(opened.difference(&mask).foreground_count(), 0);
        }
    }

    #[test]
    fn union_and_difference() {
        let a = rect_mask(10, 10, &[(0, 0, 5, 10)]);
        let b = rect_mask(10, 10, &[(3, 0, 7, 10)]);
        assert_eq!(a.union(&b).foreground_count(), 100);
        assert_eq!(a.difference(&b).foreground_count(), 30);
    }

    #[test]
    #[should_panic(expected = "mask sizes differ")]
    fn combining_masks_of_different_sizes_panics() {
        let a = BinaryMask::new(10, 10);
        let b = BinaryMask::new(10, 9);
        let _ = a.union(&b);
    }

    #[test]
    fn to_image_uses_full_scale() {
        let mask = rect_mask(4, 4, &[(1, 1, 2, 2)]);
        let image = mask.to_image();
        assert_eq!(image.get_pixel(1, 1)[0], 255);
        assert_eq!(image.get_pixel(0, 0)[0], 0);
    }
}
