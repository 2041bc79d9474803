//! Scene-cut detection.
//!
//! Decodes the video once, in order, as single-channel luminance and scores
//! every consecutive pair of frames. A boundary is declared where the score
//! exceeds the threshold and more than the minimum scene length has passed
//! since the previous boundary. Boundaries split `[0, duration]` into a
//! gap-free [`Cutlist`] with times rounded to 100 ms.
//!
//! Two scoring strategies are available:
//!
//! | Strategy | Score | Default threshold |
//! |----------|-------|-------------------|
//! | [`ScoringStrategy::MeanAbsoluteDifference`] | mean `\|a - b\|` per pixel, 0–255 | 30.0 |
//! | [`ScoringStrategy::ChangedPixels`] | pixels with `\|a - b\| > pixel_threshold` | 500 000 |
//!
//! # Example
//!
//! ```no_run
//! use cutlist::{CutlistError, DetectionOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let options = DetectionOptions::new().with_downscale_factor(4);
//! let cuts = cutlist::detect_cuts(&mut video.luma_frames(options.downscale_factor())?, &options)?;
//! for cut in &cuts {
//!     println!("{:.1} – {:.1}", cut.start, cut.end);
//! }
//! # Ok::<(), CutlistError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use image::GrayImage;

use crate::conversion::round_to_tenth;
use crate::cut::{Cut, Cutlist};
use crate::error::CutlistError;
use crate::progress::{NoOpProgress, OperationType, ProgressCallback, ProgressTracker};
use crate::source::FrameSource;
use crate::video_file::VideoFile;

/// Default threshold for [`ScoringStrategy::MeanAbsoluteDifference`].
pub const DEFAULT_MEAN_THRESHOLD: f64 = 30.0;

/// Default threshold for [`ScoringStrategy::ChangedPixels`].
pub const DEFAULT_CHANGED_PIXELS_THRESHOLD: f64 = 500_000.0;

/// Default per-pixel difference for [`ScoringStrategy::ChangedPixels`].
pub const DEFAULT_PIXEL_THRESHOLD: u8 = 25;

/// How dissimilar two consecutive luminance frames are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringStrategy {
    /// Mean absolute intensity difference on a 0–255 scale.
    #[default]
    MeanAbsoluteDifference,
    /// Number of pixels whose absolute difference exceeds `pixel_threshold`.
    ChangedPixels {
        /// Per-pixel difference a pixel must exceed to count as changed.
        pixel_threshold: u8,
    },
}

impl ScoringStrategy {
    /// Detection threshold that suits this strategy's scale.
    pub fn default_threshold(self) -> f64 {
        match self {
            ScoringStrategy::MeanAbsoluteDifference => DEFAULT_MEAN_THRESHOLD,
            ScoringStrategy::ChangedPixels { .. } => DEFAULT_CHANGED_PIXELS_THRESHOLD,
        }
    }
}

/// Score the difference between two luminance frames.
///
/// Only the overlapping region is compared when dimensions differ. Returns
/// 0.0 when there is nothing to compare.
pub fn frame_difference(previous: &GrayImage, current: &GrayImage, strategy: ScoringStrategy) -> f64 {
    let width = previous.width().min(current.width()) as usize;
    let height = previous.height().min(current.height()) as usize;
    if width == 0 || height == 0 {
        return 0.0;
    }

    let previous_stride = previous.width() as usize;
    let current_stride = current.width() as usize;
    let previous_raw = previous.as_raw();
    let current_raw = current.as_raw();

    let rows = (0..height).map(|row| {
        (
            &previous_raw[row * previous_stride..row * previous_stride + width],
            &current_raw[row * current_stride..row * current_stride + width],
        )
    });

    match strategy {
        ScoringStrategy::MeanAbsoluteDifference => {
            let total: u64 = rows
                .map(|(a, b)| {
                    a.iter()
                        .zip(b)
                        .map(|(&x, &y)| u64::from(x.abs_diff(y)))
                        .sum::<u64>()
                })
                .sum();
            total as f64 / (width * height) as f64
        }
        ScoringStrategy::ChangedPixels { pixel_threshold } => rows
            .map(|(a, b)| {
                a.iter()
                    .zip(b)
                    .filter(|&(&x, &y)| x.abs_diff(y) > pixel_threshold)
                    .count()
            })
            .sum::<usize>() as f64,
    }
}

/// Cut detection settings.
///
/// Defaults: mean-difference scoring with threshold 30.0, a one second
/// minimum scene length, and no downscaling.
#[derive(Clone)]
pub struct DetectionOptions {
    pub(crate) strategy: ScoringStrategy,
    pub(crate) threshold: f64,
    pub(crate) min_scene_length: Duration,
    pub(crate) downscale_factor: u32,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for DetectionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DetectionOptions")
            .field("strategy", &self.strategy)
            .field("threshold", &self.threshold)
            .field("min_scene_length", &self.min_scene_length)
            .field("downscale_factor", &self.downscale_factor)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionOptions {
    /// Create options with the defaults.
    pub fn new() -> Self {
        Self {
            strategy: ScoringStrategy::MeanAbsoluteDifference,
            threshold: DEFAULT_MEAN_THRESHOLD,
            min_scene_length: Duration::from_secs(1),
            downscale_factor: 1,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Select the scoring strategy.
    ///
    /// Also resets the threshold to the strategy's default; call
    /// [`with_threshold`](Self::with_threshold) afterwards to override it.
    #[must_use]
    pub fn with_strategy(mut self, strategy: ScoringStrategy) -> Self {
        self.strategy = strategy;
        self.threshold = strategy.default_threshold();
        self
    }

    /// Score a pair of frames must exceed to be a boundary candidate.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Minimum time between two boundaries.
    #[must_use]
    pub fn with_min_scene_length(mut self, length: Duration) -> Self {
        self.min_scene_length = length;
        self
    }

    /// Divide the decode resolution by `factor` before scoring. Clamped to
    /// at least 1.
    ///
    /// Count-based scores are scaled back to the full-resolution pixel area,
    /// so thresholds keep their meaning at any factor.
    #[must_use]
    pub fn with_downscale_factor(mut self, factor: u32) -> Self {
        self.downscale_factor = factor.max(1);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` frames. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Configured scoring strategy.
    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Configured threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Configured minimum scene length.
    pub fn min_scene_length(&self) -> Duration {
        self.min_scene_length
    }

    /// Configured downscale factor.
    pub fn downscale_factor(&self) -> u32 {
        self.downscale_factor
    }
}

/// Detect scene cuts and return a cut list covering the whole video.
///
/// The final cut always ends at `frame_count / fps` (rounded), where
/// `frame_count` is the larger of the probed estimate and the number of
/// frames actually decoded. A stream with zero frames yields an empty list.
///
/// # Errors
///
/// - [`CutlistError::InvalidVideoMetadata`] if the frame rate is zero,
///   negative, or not finite. Checked before any frame is decoded.
/// - Any decode error from the source.
pub fn detect_cuts<S>(source: &mut S, options: &DetectionOptions) -> Result<Cutlist, CutlistError>
where
    S: FrameSource + ?Sized,
{
    let metadata = source.video_metadata().clone();
    if !metadata.has_usable_frame_rate() {
        return Err(CutlistError::InvalidVideoMetadata(format!(
            "frame rate is {} fps",
            metadata.frames_per_second
        )));
    }

    let fps = metadata.frames_per_second;
    let min_scene_frames = (fps * options.min_scene_length.as_secs_f64()) as u64;
    let full_area = f64::from(metadata.width) * f64::from(metadata.height);

    log::debug!(
        "Detecting cuts (strategy={:?}, threshold={}, min_scene_frames={}, downscale={})",
        options.strategy,
        options.threshold,
        min_scene_frames,
        options.downscale_factor,
    );

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        OperationType::CutDetection,
        Some(metadata.frame_count),
        options.batch_size,
    );

    let mut cuts = Cutlist::new();
    let mut previous: Option<GrayImage> = None;
    let mut frame_number: u64 = 0;
    let mut last_boundary: u64 = 0;

    while let Some(frame) = source.next_luma_frame()? {
        if let Some(previous_frame) = &previous {
            let mut score = frame_difference(previous_frame, &frame, options.strategy);
            if let ScoringStrategy::ChangedPixels { .. } = options.strategy {
                let scored_area = f64::from(frame.width()) * f64::from(frame.height());
                if full_area > 0.0 && scored_area > 0.0 {
                    score *= full_area / scored_area;
                }
            }

            let start = round_to_tenth(last_boundary as f64 / fps);
            let end = round_to_tenth(frame_number as f64 / fps);
            // A boundary that rounds onto the previous one would yield an empty cut.
            if score > options.threshold
                && frame_number - last_boundary > min_scene_frames
                && end > start
            {
                let cut = Cut::new(start, end);
                log::debug!(
                    "Boundary at frame {frame_number} ({:.1}s, score {score:.2})",
                    cut.end
                );
                cuts.push(cut);
                last_boundary = frame_number;
            }
        }

        previous = Some(frame);
        frame_number += 1;
        tracker.advance();
    }
    tracker.finish();

    let frame_count = metadata.frame_count.max(frame_number);
    if frame_count == 0 {
        log::info!("Cut detection found no frames");
        return Ok(cuts);
    }

    let duration = round_to_tenth(frame_count as f64 / fps);
    if cuts.last().is_none_or(|last| last.end < duration) {
        let start = round_to_tenth(last_boundary as f64 / fps);
        if duration > start {
            cuts.push(Cut::new(start, duration));
        }
    }

    log::info!(
        "Cut detection complete: {} cut(s) over {:.1}s ({} frames decoded)",
        cuts.len(),
        duration,
        frame_number,
    );

    Ok(cuts)
}

/// Runs [`detect_cuts`] against an opened [`VideoFile`] with fixed options.
#[derive(Debug, Clone, Default)]
pub struct CutDetector {
    options: DetectionOptions,
}

impl CutDetector {
    /// Create a detector with the given options.
    pub fn new(options: DetectionOptions) -> Self {
        Self { options }
    }

    /// Options this detector runs with.
    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Decode `video` from the beginning and return its cut list.
    ///
    /// # Errors
    ///
    /// See [`detect_cuts`].
    pub fn detect(&self, video: &mut VideoFile) -> Result<Cutlist, CutlistError> {
        log::debug!("Running cut detection on {}", video.path().display());
        let mut frames = video.luma_frames(self.options.downscale_factor)?;
        detect_cuts(&mut frames, &self.options)
    }
}
