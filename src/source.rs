//! Decoding capabilities consumed by the detector and the sampler.
//!
//! The cut detector needs a forward-only stream of luminance frames; the
//! frame sampler needs to seek to a timestamp and decode one colour frame.
//! [`VideoFile`](crate::VideoFile) provides both through FFmpeg. Anything
//! else implementing these traits (a synthetic generator, a frame cache)
//! can drive the same algorithms.

use image::{DynamicImage, GrayImage};

use crate::error::CutlistError;
use crate::metadata::VideoMetadata;

/// A sequential, decode-order stream of single-channel luminance frames.
pub trait FrameSource {
    /// Metadata of the stream being decoded.
    fn video_metadata(&self) -> &VideoMetadata;

    /// Decode the next frame as 8-bit luminance.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. Every frame of one
    /// stream has the same dimensions.
    fn next_luma_frame(&mut self) -> Result<Option<GrayImage>, CutlistError>;
}

/// Random access to still frames by presentation time.
pub trait FrameSeeker {
    /// Metadata of the underlying video.
    fn video_metadata(&self) -> &VideoMetadata;

    /// Seek to `millis` milliseconds and decode the first frame at or after
    /// that position.
    ///
    /// # Errors
    ///
    /// [`CutlistError::FrameUnavailable`] when the position is past the end
    /// of the stream or no frame decodes there.
    fn frame_at_millis(&mut self, millis: i64) -> Result<DynamicImage, CutlistError>;
}
