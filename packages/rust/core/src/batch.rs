//! Sequential batch driver.
//!
//! Items are processed one at a time with a fixed pause between them (not
//! after the last). Failures are recorded per item and never stop the run.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{error, info, instrument};

use guidepress_shared::{BatchItem, BatchReport, GuideStats, ItemResult, Result};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// What processing one item produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessedBuild {
    pub post_url: Option<String>,
    pub stats: GuideStats,
}

/// Turns one batch item into a guide (and usually a post).
#[async_trait]
pub trait BuildProcessor: Send + Sync {
    async fn process(&self, item: &BatchItem) -> Result<ProcessedBuild>;
}

/// Progress callback for batch runs.
pub trait BatchProgress: Send + Sync {
    /// `index` is zero-based within the processed slice.
    fn item_started(&self, index: usize, total: usize, item: &BatchItem);
    fn item_finished(&self, index: usize, total: usize, result: &ItemResult);
    fn waiting(&self, delay: Duration);
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn item_started(&self, _index: usize, _total: usize, _item: &BatchItem) {}
    fn item_finished(&self, _index: usize, _total: usize, _result: &ItemResult) {}
    fn waiting(&self, _delay: Duration) {}
    fn done(&self, _report: &BatchReport) {}
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Which slice of the list to process and how fast.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub delay: Duration,
    /// First item to process.
    pub start_index: usize,
    /// Upper bound on processed items.
    pub max_items: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(30),
            start_index: 0,
            max_items: None,
        }
    }
}

/// The items `options` selects from `items`.
pub fn select<'a>(items: &'a [BatchItem], options: &BatchOptions) -> &'a [BatchItem] {
    let start = options.start_index.min(items.len());
    let end = match options.max_items {
        Some(max) => start.saturating_add(max).min(items.len()),
        None => items.len(),
    };
    &items[start..end]
}

pub struct BatchRunner<'a> {
    processor: &'a dyn BuildProcessor,
    progress: &'a dyn BatchProgress,
}

impl<'a> BatchRunner<'a> {
    pub fn new(processor: &'a dyn BuildProcessor, progress: &'a dyn BatchProgress) -> Self {
        Self {
            processor,
            progress,
        }
    }

    /// Process the selected items in order and build the report.
    #[instrument(skip_all, fields(items = items.len(), start = options.start_index))]
    pub async fn run(&self, items: &[BatchItem], options: &BatchOptions) -> BatchReport {
        let selected = select(items, options);
        let total = selected.len();
        let run_start = Instant::now();
        let mut results = Vec::with_capacity(total);

        info!(total, delay_secs = options.delay.as_secs(), "batch started");

        for (i, item) in selected.iter().enumerate() {
            self.progress.item_started(i, total, item);
            let item_start = Instant::now();

            let outcome = self.processor.process(item).await;
            let execution_time = item_start.elapsed().as_secs_f64();

            let result = match outcome {
                Ok(done) => {
                    info!(build = %item.name, url = ?done.post_url, execution_time, "build completed");
                    ItemResult {
                        build_name: item.name.clone(),
                        category: item.category.clone(),
                        success: true,
                        post_url: done.post_url,
                        stats: Some(done.stats),
                        error: None,
                        execution_time,
                        scheduled_time: item.scheduled_at,
                    }
                }
                Err(e) => {
                    error!(build = %item.name, error = %e, "build failed");
                    ItemResult {
                        build_name: item.name.clone(),
                        category: item.category.clone(),
                        success: false,
                        post_url: None,
                        stats: None,
                        error: Some(e.to_string()),
                        execution_time,
                        scheduled_time: item.scheduled_at,
                    }
                }
            };

            self.progress.item_finished(i, total, &result);
            results.push(result);

            if i + 1 < total && !options.delay.is_zero() {
                self.progress.waiting(options.delay);
                tokio::time::sleep(options.delay).await;
            }
        }

        let report = BatchReport::from_results(results, run_start.elapsed().as_secs_f64());
        info!(
            completed = report.completed,
            failed = report.failed,
            success_rate = %format!("{:.1}%", report.success_rate),
            total_minutes = %format!("{:.1}", report.total_time_minutes),
            "batch finished"
        );
        self.progress.done(&report);
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
