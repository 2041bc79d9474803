//! Internal conversion helpers.
//!
//! Pixel-plane copying, timestamp rescaling, and the rounding rules shared
//! by the detector, the sampler, and the editor.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is 1 for GRAY8 and 3 for RGB24.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to seconds.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Convert a [`Duration`] to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` seeks across all streams, so the timestamp is in
/// container units rather than the video stream's time base.
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}

/// Round seconds to one decimal place (100 ms resolution).
///
/// Halves round away from zero. Applying the function twice yields the same
/// value as applying it once, which keeps cut-list re-validation idempotent.
/// Values that round to zero return `0.0`, never `-0.0`. Magnitudes above
/// `f64::MAX / 10` overflow to infinity.
pub fn round_to_tenth(seconds: f64) -> f64 {
    let rounded = (seconds * 10.0).round() / 10.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Integer milliseconds for a time in seconds.
///
/// Used as the frame memo key so equal rounded starts compare exactly.
pub fn seconds_to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}
