//! Page cleanup before recognition: denoise, binarize, edge emphasis.

use image::{DynamicImage, GrayImage};
use imageproc::filter::median_filter;

use super::mask::{BinaryMask, Polarity};

/// Median radius of the denoise pass (3x3 window).
const DENOISE_RADIUS: u32 = 1;
const GRADIENT_KERNEL: u32 = 3;

/// Median denoise, binary threshold, then a 3x3 morphological gradient.
///
/// The median pass stands in for non-local means denoising, which neither
/// `image` nor `imageproc` offers.
pub fn enhance_page(image: &DynamicImage, threshold: u8) -> GrayImage {
    let denoised = median_filter(&image.to_luma8(), DENOISE_RADIUS, DENOISE_RADIUS);
    let binary = BinaryMask::threshold(&denoised, threshold, Polarity::Direct);
    morphological_gradient(&binary, GRADIENT_KERNEL).to_image()
}

/// Dilation minus erosion: the outline of every foreground shape.
pub fn morphological_gradient(mask: &BinaryMask, kernel: u32) -> BinaryMask {
    mask.dilate(kernel, kernel).difference(&mask.erode(kernel, kernel))
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn gradient_of_square_is_its_outline() {
        let mask = BinaryMask::from_fn(20, 20, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
        let edges = morphological_gradient(&mask, 3);
        assert!(edges.is_foreground(5, 5));
        assert!(edges.is_foreground(4, 10));
        assert!(!edges.is_foreground(10, 10));
        assert!(!edges.is_foreground(0, 0));
    }

    #[test]
    fn flat_page_has_no_edges() {
        let page = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([240])));
        let enhanced = enhance_page(&page, 128);
        assert_eq!(enhanced.dimensions(), (32, 32));
        assert!(enhanced.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn speckles_are_removed_before_thresholding() {
        let mut gray = GrayImage::from_pixel(32, 32, Luma([240]));
        gray.put_pixel(16, 16, Luma([0]));
        let enhanced = enhance_page(&DynamicImage::ImageLuma8(gray), 128);
        assert!(enhanced.pixels().all(|p| p[0] == 0));
    }
}
