//! Batch input and result models.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// One enumerated input item. `name` is the identity carried into its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceItem {
    pub name: String,
    pub path: PathBuf,
    /// 1-based page number for items produced from a multi-page document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Artifact stem assigned when `stem()` is not unique within a batch.
    #[serde(skip)]
    pub artifact_stem: Option<String>,
}

impl SourceItem {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            path,
            page: None,
            artifact_stem: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// File name without extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Base name for this item's artifacts: the assigned stem, else `stem()`.
    pub fn output_stem(&self) -> String {
        self.artifact_stem.clone().unwrap_or_else(|| self.stem())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Failed,
}

/// What a successful unit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitOutput {
    /// Primary artifact written by the unit.
    pub artifact: PathBuf,
    /// Number of recognized items (lines, cells, blocks). Zero is a valid outcome.
    pub items: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitOutcome {
    Success(UnitOutput),
    Failed { reason: String },
}

/// Result record for one input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub source_name: String,
    #[serde(flatten)]
    pub outcome: UnitOutcome,
    pub elapsed_ms: u64,
}

impl BatchResult {
    pub fn status(&self) -> BatchStatus {
        match self.outcome {
            UnitOutcome::Success(_) => BatchStatus::Success,
            UnitOutcome::Failed { .. } => BatchStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == BatchStatus::Success
    }

    pub fn error_reason(&self) -> Option<&str> {
        match &self.outcome {
            UnitOutcome::Failed { reason } => Some(reason),
            UnitOutcome::Success(_) => None,
        }
    }

    pub fn output(&self) -> Option<&UnitOutput> {
        match &self.outcome {
            UnitOutcome::Success(output) => Some(output),
            UnitOutcome::Failed { .. } => None,
        }
    }
}
