//! Configuration management for pagesift using the prefer crate.
//!
//! Every section is optional; missing keys fall back to the defaults the
//! pipelines were tuned with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::{ClassifierConfig, DetectionConfig};
use crate::ocr::{DocumentClassifierConfig, OcrConfig};
use crate::services::batch::default_workers;
use crate::services::discovery::default_image_extensions;
use crate::services::documents::DEFAULT_DPI;

/// Environment variable overriding `batch.workers`.
pub const WORKERS_ENV: &str = "PAGESIFT_WORKERS";
/// Environment variable overriding `ocr.language`.
pub const OCR_LANGUAGE_ENV: &str = "PAGESIFT_OCR_LANGUAGE";

/// Default output directory, relative to the working directory.
const DEFAULT_OUTPUT_DIR: &str = "output";

/// Batch execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker slots. Unset means hardware threads minus one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Extensions (without dot) picked up from input directories.
    pub image_extensions: Vec<String>,
    /// Resolution for rendering multi-page documents.
    pub dpi: u32,
    /// Where artifacts go when `--output` is not given.
    pub output_dir: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            image_extensions: default_image_extensions(),
            dpi: DEFAULT_DPI,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub document_classifier: DocumentClassifierConfig,
    /// File this config was loaded from, if any.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers pagesift config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("pagesift").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Apply environment overrides through `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(raw) = non_empty(WORKERS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(workers) => {
                    tracing::debug!("Using {} from environment: {}", WORKERS_ENV, workers);
                    self.batch.workers = Some(workers);
                }
                Err(_) => tracing::warn!("Ignoring invalid {}: {}", WORKERS_ENV, raw),
            }
        }
        if let Some(language) = non_empty(OCR_LANGUAGE_ENV) {
            tracing::debug!("Using {} from environment: {}", OCR_LANGUAGE_ENV, language);
            self.ocr.language = language.trim().to_string();
        }
        self
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Get the base directory for resolving relative paths.
    /// Returns the config file's parent directory if available, otherwise None.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Configured output directory. Relative values resolve against the
    /// working directory, since that is where users expect output to land.
    pub fn output_dir(&self) -> PathBuf {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        self.resolve_path(&self.batch.output_dir, &cwd)
    }

    /// Effective worker count: configured value, or the hardware default.
    pub fn workers(&self) -> usize {
        self.batch.workers.unwrap_or_else(default_workers).max(1)
    }

    /// Render as TOML for display.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to render config: {}", e))
    }
}

/// Options for loading configuration.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
}

/// Load config with explicit options, then apply environment overrides.
pub async fn load_config(options: LoadOptions) -> Config {
    let config = match options.config_path {
        // Priority 1: Explicit --config flag
        Some(ref path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).to_string();
            match Config::load_from_path(Path::new(&expanded)).await {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("{}: {}", path.display(), e);
                    Config::default()
                }
            }
        }
        // Priority 2: Auto-discover via prefer
        None => Config::load().await,
    };
    config.with_env_overrides()
}

/// Places a user-level config file is looked for.
pub fn user_config_candidates() -> Vec<PathBuf> {
    let mut dirs_found = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        dirs_found.push(dir.join("pagesift"));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_found.push(home.join(".config").join("pagesift"));
    }
    dirs_found.dedup();
    dirs_found
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let config = Config::default();
        assert_eq!(config.detection.threshold, 128);
        assert_eq!(config.detection.min_region_width, 50);
        assert_eq!(config.detection.min_region_height, 20);
        assert_eq!(config.detection.line_length, 50);
        assert_eq!(config.classifier.heading_ratio, 1.5);
        assert_eq!(config.classifier.min_confidence, 50.0);
        assert_eq!(config.batch.dpi, 300);
        assert_eq!(config.ocr.language, "eng");
        assert!(!config.document_classifier.is_configured());
        assert!(config.workers() >= 1);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::parse(
            "[detection]\nmin_region_width = 80\n\n[batch]\nworkers = 3\n",
            "toml",
        )
        .unwrap();
        assert_eq!(config.detection.min_region_width, 80);
        assert_eq!(config.detection.min_region_height, 20);
        assert_eq!(config.workers(), 3);
        assert_eq!(config.batch.image_extensions.len(), 6);
    }

    #[test]
    fn yaml_and_json_are_accepted() {
        let yaml = Config::parse("classifier:\n  heading_ratio: 2.0\n", "yml").unwrap();
        assert_eq!(yaml.classifier.heading_ratio, 2.0);

        let json = Config::parse(
            r#"{"document_classifier": {"command": "doc-label", "args": ["{file}"]}}"#,
            "json",
        )
        .unwrap();
        assert!(json.document_classifier.is_configured());
    }

    #[test]
    fn invalid_file_reports_format() {
        let err = Config::parse("detection = [", "toml").unwrap_err();
        assert!(err.contains("TOML"));
    }

    #[tokio::test]
    async fn load_from_path_records_source() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pagesift.toml");
        std::fs::write(&path, "[ocr]\nlanguage = \"deu\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.base_dir().as_deref(), Some(temp.path()));
    }

    #[test]
    fn environment_overrides() {
        let env: HashMap<&str, &str> = [(WORKERS_ENV, "6"), (OCR_LANGUAGE_ENV, "eng+fra")]
            .into_iter()
            .collect();
        let config = Config::default()
            .with_overrides_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.workers(), 6);
        assert_eq!(config.ocr.language, "eng+fra");
    }

    #[test]
    fn invalid_worker_override_is_ignored() {
        let config = Config::default().with_overrides_from(|key| {
            (key == WORKERS_ENV).then(|| "many".to_string())
        });
        assert_eq!(config.batch.workers, None);
    }

    #[test]
    fn resolve_path_handles_relative_and_absolute() {
        let config = Config::default();
        let base = Path::new("/etc/pagesift");
        assert_eq!(
            config.resolve_path("out", base),
            PathBuf::from("/etc/pagesift/out")
        );
        assert_eq!(config.resolve_path("/srv/out", base), PathBuf::from("/srv/out"));
    }

    #[test]
    fn config_renders_as_toml() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[detection]"));
        assert!(rendered.contains("heading_ratio = 1.5"));
    }
}
