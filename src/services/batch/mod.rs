//! Batch page processing service.
//!
//! Runs one page task per input item across a bounded pool of blocking
//! workers. Every item gets exactly one `BatchResult`; a failing item never
//! stops the others. Emits events for progress tracking.

mod tasks;
mod types;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::models::{BatchResult, SourceItem, UnitOutcome};
use crate::ocr::Recognizer;

pub use tasks::{
    load_page, BlockTask, EnhanceTask, LayoutTask, OcrTask, PageTask, TableTask,
};
pub use types::{BatchError, BatchEvent, BatchSummary, UnitError};

/// File name of the per-batch summary record.
pub const SUMMARY_FILE: &str = "batch_summary.json";

/// Stem the summary file would claim if a unit used it.
const SUMMARY_STEM: &str = "batch_summary";

/// Hardware threads minus one, never below one.
pub fn default_workers() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Fixed-size worker pool writing into one output directory.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    workers: usize,
    output_dir: PathBuf,
}

impl BatchRunner {
    /// A worker count of zero is raised to one.
    pub fn new(output_dir: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            output_dir: output_dir.into(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run `task` over every item and wait for all of them.
    ///
    /// Results come back in item order. Only output directory creation and
    /// the summary write can fail the batch as a whole.
    pub async fn run(
        &self,
        mut items: Vec<SourceItem>,
        task: Arc<dyn PageTask>,
        event_tx: mpsc::Sender<BatchEvent>,
    ) -> Result<Vec<BatchResult>, BatchError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| BatchError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        assign_artifact_stems(&mut items);

        let total = items.len();
        info!(
            "Running {} on {} items with {} workers",
            task.name(),
            total,
            self.workers
        );
        emit(&event_tx, BatchEvent::Started { total });

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);

        for item in items {
            // Excess items wait here for a free slot.
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| BatchError::PoolClosed)?;

            let name = item.name.clone();
            let task = task.clone();
            let output_dir = self.output_dir.clone();
            let event_tx = event_tx.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                run_unit(item, task.as_ref(), &output_dir, &event_tx)
            });
            handles.push((name, handle));
        }

        let mut results = Vec::with_capacity(total);
        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let error = UnitError::Pool(e.to_string());
                    warn!("Worker for {} failed: {}", name, error);
                    emit(
                        &event_tx,
                        BatchEvent::ItemFailed {
                            name: name.clone(),
                            error: error.to_string(),
                        },
                    );
                    BatchResult {
                        outcome: UnitOutcome::Failed {
                            reason: format!("{}: {}", name, error),
                        },
                        source_name: name,
                        elapsed_ms: 0,
                    }
                }
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;
        self.write_summary(task.name(), &results, succeeded, failed)
            .await?;

        info!(
            "{} finished: {} succeeded, {} failed",
            task.name(),
            succeeded,
            failed
        );
        emit(&event_tx, BatchEvent::Completed { succeeded, failed });

        Ok(results)
    }

    async fn write_summary(
        &self,
        task: &str,
        results: &[BatchResult],
        succeeded: usize,
        failed: usize,
    ) -> Result<(), BatchError> {
        let summary = BatchSummary {
            task,
            total: results.len(),
            succeeded,
            failed,
            results,
        };
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| BatchError::Summary(e.to_string()))?;
        tokio::fs::write(self.output_dir.join(SUMMARY_FILE), json)
            .await
            .map_err(|e| BatchError::Summary(e.to_string()))
    }
}

/// Report progress without waiting. Events that do not fit in the channel
/// are dropped.
fn emit(event_tx: &mpsc::Sender<BatchEvent>, event: BatchEvent) {
    match event_tx.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(event)) => debug!("Progress channel full, dropped {:?}", event),
    }
}

/// Give every item an artifact stem no other item in the batch shares.
///
/// Stems that are unique (ignoring case) and do not clash with the summary
/// file are kept. The rest fall back to the full file name with dots
/// replaced, plus a counter if that is still taken.
pub fn assign_artifact_stems(items: &mut [SourceItem]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for item in items.iter() {
        *counts.entry(item.stem().to_lowercase()).or_default() += 1;
    }
    let keeps = |stem: &str| {
        counts.get(&stem.to_lowercase()).copied().unwrap_or(0) == 1
            && !stem.eq_ignore_ascii_case(SUMMARY_STEM)
    };

    let mut used: HashSet<String> = items
        .iter()
        .map(|item| item.stem())
        .filter(|stem| keeps(stem))
        .map(|stem| stem.to_lowercase())
        .collect();

    for item in items.iter_mut() {
        if keeps(&item.stem()) {
            continue;
        }
        let base = item.name.replace('.', "_");
        let mut candidate = base.clone();
        let mut counter = 2;
        while used.contains(&candidate.to_lowercase())
            || candidate.eq_ignore_ascii_case(SUMMARY_STEM)
        {
            candidate = format!("{}_{}", base, counter);
            counter += 1;
        }
        used.insert(candidate.to_lowercase());
        debug!("{} writes artifacts as {}", item.name, candidate);
        item.artifact_stem = Some(candidate);
    }
}

/// Body of one worker slot. Runs on a blocking thread.
fn run_unit(
    item: SourceItem,
    task: &dyn PageTask,
    output_dir: &Path,
    event_tx: &mpsc::Sender<BatchEvent>,
) -> BatchResult {
    emit(
        event_tx,
        BatchEvent::ItemStarted {
            name: item.name.clone(),
        },
    );
    info!("Processing {}", item.name);

    let start = Instant::now();
    let outcome = task.run(&item, output_dir);
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => {
            info!("Finished {} in {}ms", item.name, elapsed_ms);
            emit(
                event_tx,
                BatchEvent::ItemCompleted {
                    name: item.name.clone(),
                    items: output.items,
                },
            );
            BatchResult {
                source_name: item.name,
                outcome: UnitOutcome::Success(output),
                elapsed_ms,
            }
        }
        Err(e) => {
            warn!("Failed {}: {}", item.name, e);
            emit(
                event_tx,
                BatchEvent::ItemFailed {
                    name: item.name.clone(),
                    error: e.to_string(),
                },
            );
            BatchResult {
                outcome: UnitOutcome::Failed {
                    reason: format!("{}: {}", item.name, e),
                },
                source_name: item.name,
                elapsed_ms,
            }
        }
    }
}

/// OCR every item into `output_dir` without progress reporting.
pub async fn run_ocr_batch(
    items: Vec<SourceItem>,
    recognizer: Arc<dyn Recognizer>,
    output_dir: &Path,
    workers: usize,
) -> Result<Vec<BatchResult>, BatchError> {
    // Nobody listens; events are dropped.
    let (event_tx, _) = mpsc::channel(1);
    BatchRunner::new(output_dir, workers)
        .run(items, Arc::new(OcrTask::new(recognizer)), event_tx)
        .await
}
