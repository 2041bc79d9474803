//! Progress reporting.
//!
//! Detection walks every frame of the video and sampling seeks once per
//! distinct cut start, so both can run for a long time on large inputs.
//! Attach a [`ProgressCallback`] through [`DetectionOptions`] or
//! [`SamplerOptions`] to observe them. Callbacks only observe; the pipeline
//! has no mid-pass cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cutlist::{DetectionOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}%", info.operation);
//!         }
//!     }
//! }
//!
//! let options = DetectionOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(30);
//! ```
//!
//! [`DetectionOptions`]: crate::DetectionOptions
//! [`SamplerOptions`]: crate::SamplerOptions

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The pipeline stage currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Sequential frame scoring.
    CutDetection,
    /// Seek-and-decode of one frame per cut.
    FrameSampling,
}

/// A snapshot of pipeline progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Stage being reported.
    pub operation: OperationType,
    /// Items (frames or cuts) processed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the stage started.
    pub elapsed: Duration,
    /// Estimated time remaining at the current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Receives progress updates.
///
/// Implementations must be [`Send`] and [`Sync`]: the `async` feature runs
/// the pipeline on a blocking worker thread.
pub trait ProgressCallback: Send + Sync {
    /// Called every `batch_size` items and once when a stage finishes.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all notifications. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Tracks timing for one stage and emits batched callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total: total.filter(|&t| t > 0),
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed item.
    pub(crate) fn advance(&mut self) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report();
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report regardless of batching.
    pub(crate) fn finish(&mut self) {
        self.report();
    }

    fn report(&self) {
        let elapsed = self.start_time.elapsed();

        // The frame count is an estimate; never report past 100%.
        let percentage = self
            .total
            .map(|t| ((self.current as f32 / t as f32) * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
        });
    }
}
