//! Availability checks for the external tools the backends shell out to.

pub(crate) const PDFTOPPM_NOT_FOUND: &str = "pdftoppm not found (install poppler-utils)";
pub(crate) const TESSERACT_NOT_FOUND: &str = "tesseract not found (install tesseract-ocr)";

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Check pdftoppm availability, returning a hint message if missing.
pub fn check_pdftoppm_hint() -> Option<String> {
    if check_binary("pdftoppm") {
        None
    } else {
        Some("pdftoppm not installed. Install with: apt install poppler-utils".to_string())
    }
}
