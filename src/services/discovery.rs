//! Input discovery: which files in a directory a batch should process.
//!
//! Enumeration happens once, up front. The list never changes during a run.

use std::io;
use std::path::{Path, PathBuf};

use crate::models::SourceItem;

/// Image extensions picked up when no list is configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

const PDF_MIME: &str = "application/pdf";

pub fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext)))
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Image items under `path`.
///
/// A file path yields that one file regardless of its extension; a
/// directory yields its direct children with an allowed extension.
pub fn enumerate_images(path: &Path, extensions: &[String]) -> io::Result<Vec<SourceItem>> {
    if path.is_file() {
        return Ok(vec![SourceItem::from_path(path)]);
    }
    Ok(list_files(path)?
        .into_iter()
        .filter(|file| has_extension(file, extensions))
        .map(SourceItem::from_path)
        .collect())
}

/// Whether `path` is a PDF, by extension or by sniffing its header.
pub fn is_pdf(path: &Path) -> bool {
    if has_extension(path, &["pdf".to_string()]) {
        return true;
    }
    matches!(infer::get_from_path(path), Ok(Some(kind)) if kind.mime_type() == PDF_MIME)
}

/// Multi-page documents under `path`.
pub fn enumerate_documents(path: &Path) -> io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    Ok(list_files(path)?.into_iter().filter(|file| is_pdf(file)).collect())
}
