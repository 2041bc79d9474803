//! Frame sampling configuration.
//!
//! [`SamplerOptions`] is a builder that threads the artifact image format,
//! JPEG quality, and progress reporting through
//! [`FrameSampler`](crate::FrameSampler) without widening its signatures.
//! Detection has its own builder, [`DetectionOptions`](crate::DetectionOptions).
//!
//! # Example
//!
//! ```
//! use cutlist::{FrameImageFormat, SamplerOptions};
//!
//! let options = SamplerOptions::new()
//!     .with_image_format(FrameImageFormat::Png)
//!     .with_batch_size(10);
//! assert_eq!(options.image_format().extension(), "png");
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Arc;

use image::ImageFormat;

use crate::progress::{NoOpProgress, ProgressCallback};

/// Image encoding used for frame artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameImageFormat {
    /// Baseline JPEG (`.jpg`). This is the default.
    #[default]
    Jpeg,
    /// Lossless PNG (`.png`).
    Png,
}

impl FrameImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            FrameImageFormat::Jpeg => "jpg",
            FrameImageFormat::Png => "png",
        }
    }

    pub(crate) fn to_image_format(self) -> ImageFormat {
        match self {
            FrameImageFormat::Jpeg => ImageFormat::Jpeg,
            FrameImageFormat::Png => ImageFormat::Png,
        }
    }
}

impl FromStr for FrameImageFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(FrameImageFormat::Jpeg),
            "png" => Ok(FrameImageFormat::Png),
            other => Err(format!("unsupported frame image format: {other}")),
        }
    }
}

/// Settings for [`FrameSampler`](crate::FrameSampler).
#[derive(Clone)]
pub struct SamplerOptions {
    pub(crate) image_format: FrameImageFormat,
    /// JPEG quality, 1–100. Ignored for PNG.
    pub(crate) jpeg_quality: u8,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) batch_size: u64,
}

impl Debug for SamplerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SamplerOptions")
            .field("image_format", &self.image_format)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerOptions {
    /// Defaults: JPEG at quality 90, no progress callback, batch size 1.
    pub fn new() -> Self {
        Self {
            image_format: FrameImageFormat::Jpeg,
            jpeg_quality: 90,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the artifact image format.
    #[must_use]
    pub fn with_image_format(mut self, format: FrameImageFormat) -> Self {
        self.image_format = format;
        self
    }

    /// Set the JPEG quality. Clamped to 1–100.
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` cuts. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Configured artifact image format.
    pub fn image_format(&self) -> FrameImageFormat {
        self.image_format
    }

    /// Configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}
