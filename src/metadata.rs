//! Video stream metadata.
//!
//! [`VideoMetadata`] is probed once when a [`VideoFile`](crate::VideoFile)
//! is opened and cached for its lifetime. Synthetic sources used in tests
//! construct it directly.

use std::time::Duration;

use serde::Serialize;

/// Metadata for the video stream that detection and sampling run on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use]
pub struct VideoMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second (average rate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Estimated total number of frames, from duration and frame rate.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`).
    pub codec: String,
}

impl VideoMetadata {
    /// Metadata for an in-memory source with a known frame count.
    ///
    /// Duration is derived as `frame_count / frames_per_second` (zero when
    /// the frame rate is not positive).
    pub fn synthetic(width: u32, height: u32, frames_per_second: f64, frame_count: u64) -> Self {
        let duration = if frames_per_second > 0.0 && frames_per_second.is_finite() {
            Duration::from_secs_f64(frame_count as f64 / frames_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            width,
            height,
            frames_per_second,
            frame_count,
            duration,
            codec: "synthetic".to_string(),
        }
    }

    /// Whether the frame rate can be divided by.
    pub fn has_usable_frame_rate(&self) -> bool {
        self.frames_per_second.is_finite() && self.frames_per_second > 0.0
    }
}
