//! Document-to-page-image conversion.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tempfile::TempDir;

use super::backend::OcrError;
use super::model_utils::{check_binary, PDFTOPPM_NOT_FOUND};

/// Converts a multi-page document into one image per physical page.
///
/// Pages come back in document order. Any failure aborts the whole document.
pub trait PageConverter: Send + Sync {
    fn convert(&self, document: &Path, dpi: u32) -> Result<Vec<DynamicImage>, OcrError>;
}

/// Page converter backed by Poppler's `pdftoppm`.
#[derive(Debug, Default, Clone)]
pub struct PdftoppmConverter;

impl PdftoppmConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn is_available(&self) -> bool {
        check_binary("pdftoppm")
    }

    /// Render every page of `pdf_path` into `output_dir` as `page-N.png`.
    fn render_pages(&self, pdf_path: &Path, dpi: u32, output_dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
        let dpi_str = dpi.to_string();
        let output_prefix = output_dir.join("page");

        let status = Command::new("pdftoppm")
            .args(["-png", "-r", &dpi_str])
            .arg(pdf_path)
            .arg(&output_prefix)
            .status();

        match status {
            Ok(s) if s.success() => collect_page_images(output_dir),
            Ok(_) => Err(OcrError::OcrFailed(format!(
                "pdftoppm failed to convert {}",
                pdf_path.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                OcrError::BackendNotAvailable(PDFTOPPM_NOT_FOUND.to_string()),
            ),
            Err(e) => Err(OcrError::Io(e)),
        }
    }
}

impl PageConverter for PdftoppmConverter {
    fn convert(&self, document: &Path, dpi: u32) -> Result<Vec<DynamicImage>, OcrError> {
        let temp_dir = TempDir::new()?;
        let pages = self.render_pages(document, dpi, temp_dir.path())?;
        if pages.is_empty() {
            return Err(OcrError::OcrFailed(format!(
                "No pages rendered from {}",
                document.display()
            )));
        }

        pages
            .iter()
            .map(|path| {
                image::open(path).map_err(|e| {
                    OcrError::ImageError(format!("Failed to load {}: {}", path.display(), e))
                })
            })
            .collect()
    }
}

/// Collect `page-N.png` files from a pdftoppm output directory in page order.
///
/// pdftoppm pads the page number to the width of the total page count
/// (page-1.png, page-01.png, page-001.png...), so order by the parsed number.
pub fn collect_page_images(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            let number = stem.strip_prefix("page-")?.parse::<u32>().ok()?;
            is_png.then_some((number, path))
        })
        .collect();

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_page_images_empty() {
        let temp = TempDir::new().unwrap();
        assert!(collect_page_images(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_collect_page_images_orders_numerically() {
        let temp = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "notes.txt", "page-x.png"] {
            std::fs::write(temp.path().join(name), b"fake png").unwrap();
        }

        let pages = collect_page_images(temp.path()).unwrap();
        let names: Vec<_> = pages
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["page-01.png", "page-02.png", "page-10.png"]);
    }
}
