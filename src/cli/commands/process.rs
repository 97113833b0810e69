//! Page batch commands: OCR, tables, layout, blocks, enhance.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use console::style;
use tokio::sync::mpsc;

use crate::analysis::{BlockClassifier, RegionDetector};
use crate::config::Config;
use crate::ocr::{Recognizer, TesseractBackend};
use crate::services::{
    enumerate_images, BatchRunner, BlockTask, EnhanceTask, LayoutTask, OcrTask, PageTask,
    TableTask,
};

use crate::cli::helpers::{print_batch_summary, spawn_progress_handler};

/// Which page task a batch command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePipeline {
    Ocr,
    Tables,
    Layout,
    Blocks,
    Enhance,
}

impl PagePipeline {
    fn label(self) -> &'static str {
        match self {
            PagePipeline::Ocr => "OCR",
            PagePipeline::Tables => "Table extraction",
            PagePipeline::Layout => "Heading analysis",
            PagePipeline::Blocks => "Layout blocks",
            PagePipeline::Enhance => "Enhancement",
        }
    }

    fn needs_recognizer(self) -> bool {
        matches!(
            self,
            PagePipeline::Ocr | PagePipeline::Tables | PagePipeline::Layout
        )
    }

    fn build_task(self, config: &Config, recognizer: Arc<dyn Recognizer>) -> Arc<dyn PageTask> {
        let detector = RegionDetector::new(config.detection.clone());
        match self {
            PagePipeline::Ocr => Arc::new(OcrTask::new(recognizer)),
            PagePipeline::Tables => Arc::new(TableTask::new(detector, recognizer)),
            PagePipeline::Layout => Arc::new(LayoutTask::new(
                recognizer,
                BlockClassifier::new(config.classifier.clone()),
            )),
            PagePipeline::Blocks => {
                let task = BlockTask::new(detector);
                if recognizer.is_available() {
                    Arc::new(task.with_recognizer(recognizer))
                } else {
                    Arc::new(task)
                }
            }
            PagePipeline::Enhance => Arc::new(EnhanceTask::new(config.detection.threshold)),
        }
    }
}

/// Run a page pipeline over every image under `input`.
pub async fn cmd_process(
    config: &Config,
    pipeline: PagePipeline,
    input: &Path,
    output: Option<PathBuf>,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let items = enumerate_images(input, &config.batch.image_extensions)
        .with_context(|| format!("Failed to read input {}", input.display()))?;
    if items.is_empty() {
        println!(
            "{} No images found in {}",
            style("!").yellow(),
            input.display()
        );
        return Ok(());
    }

    let recognizer: Arc<dyn Recognizer> =
        Arc::new(TesseractBackend::with_config(config.ocr.clone()));
    if pipeline.needs_recognizer() && !recognizer.is_available() {
        println!("{} Required OCR tools are missing:", style("✗").red());
        println!("  {}", style(recognizer.availability_hint()).dim());
        anyhow::bail!("{} is not available", recognizer.name());
    }

    let output_dir = output.unwrap_or_else(|| config.output_dir());
    let workers = workers.unwrap_or_else(|| config.workers());
    let task = pipeline.build_task(config, recognizer);

    let (event_tx, event_rx) = mpsc::channel(100);
    let handler = spawn_progress_handler(event_rx, pipeline.label());

    let results = BatchRunner::new(&output_dir, workers)
        .run(items, task, event_tx)
        .await?;
    let _ = handler.await;

    print_batch_summary(&results, &output_dir);
    Ok(())
}
