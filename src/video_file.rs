//! FFmpeg-backed video access.
//!
//! [`VideoFile`] opens a container, locates the best video stream, caches
//! its metadata, and implements both decoding capabilities the pipeline
//! needs: [`LumaFrames`] for the detector's sequential pass and
//! [`FrameSeeker`] for the sampler's seek-and-decode.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::{DynamicImage, GrayImage, RgbImage};

use crate::{
    error::CutlistError,
    metadata::VideoMetadata,
    source::{FrameSeeker, FrameSource},
    validation::ValidationReport,
};

/// An opened video file.
///
/// # Example
///
/// ```no_run
/// use cutlist::{CutlistError, DetectionOptions, VideoFile};
///
/// let mut video = VideoFile::open("input.mp4")?;
/// println!("{:.2} fps", video.metadata().frames_per_second);
/// let cuts = cutlist::detect_cuts(&mut video.luma_frames(1)?, &DetectionOptions::new())?;
/// # Ok::<(), CutlistError>(())
/// ```
pub struct VideoFile {
    pub(crate) input_context: Input,
    pub(crate) metadata: VideoMetadata,
    pub(crate) video_stream_index: usize,
    pub(crate) file_path: PathBuf,
}

impl Debug for VideoFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFile")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl VideoFile {
    /// Open a video file and probe its best video stream.
    ///
    /// # Errors
    ///
    /// - [`CutlistError::SourceUnavailable`] if nothing exists at `path`.
    /// - [`CutlistError::UnreadableVideo`] if the file cannot be demuxed or
    ///   carries no decodable video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CutlistError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        if !path.exists() {
            return Err(CutlistError::SourceUnavailable(file_path));
        }

        log::debug!("Opening video file: {}", file_path.display());

        let unreadable = |reason: String| CutlistError::UnreadableVideo {
            path: file_path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| unreadable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| unreadable(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| unreadable("no video stream found".to_string()))?;
        let video_stream_index = stream.index();

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|error| unreadable(format!("cannot create video decoder: {error}")))?;

        let frame_rate = stream.avg_frame_rate();
        let frames_per_second = if frame_rate.denominator() != 0 {
            frame_rate.numerator() as f64 / frame_rate.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };

        let frame_count = match stream.frames() {
            declared if declared > 0 => declared as u64,
            _ if frames_per_second > 0.0 => {
                (duration.as_secs_f64() * frames_per_second).round() as u64
            }
            _ => 0,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        log::info!(
            "Opened video file: {} ({}x{}, {:.2} fps, ~{} frames, {:.2}s, codec={})",
            file_path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
            metadata.duration.as_secs_f64(),
            metadata.codec,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            file_path,
        })
    }

    /// Cached metadata of the video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Inspect the cached metadata for problems that would break detection.
    pub fn validate(&self) -> ValidationReport {
        crate::validation::validate_metadata(&self.metadata)
    }

    /// Start a sequential luminance pass from the beginning of the stream.
    ///
    /// `downscale_factor` divides both output dimensions (values below 1
    /// are treated as 1). Only the decode resolution changes; frame timing
    /// is unaffected.
    pub fn luma_frames(&mut self, downscale_factor: u32) -> Result<LumaFrames<'_>, CutlistError> {
        LumaFrames::new(self, downscale_factor.max(1))
    }

    fn build_decoder(&self) -> Result<(VideoDecoder, ffmpeg_next::Rational, i64), CutlistError> {
        let stream = self
            .input_context
            .stream(self.video_stream_index)
            .ok_or_else(|| CutlistError::UnreadableVideo {
                path: self.file_path.clone(),
                reason: "video stream disappeared".to_string(),
            })?;
        let time_base = stream.time_base();
        // NOPTS (i64::MIN) clamps to zero.
        let start_offset = stream.start_time().max(0);
        let decoder = CodecContext::from_parameters(stream.parameters())?
            .decoder()
            .video()?;
        Ok((decoder, time_base, start_offset))
    }
}

impl FrameSeeker for VideoFile {
    fn video_metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn frame_at_millis(&mut self, millis: i64) -> Result<DynamicImage, CutlistError> {
        let timestamp = Duration::from_millis(millis.max(0) as u64);
        let unavailable = |reason: String| CutlistError::FrameUnavailable { timestamp, reason };

        let duration = self.metadata.duration;
        if !duration.is_zero() && timestamp >= duration {
            return Err(unavailable(format!(
                "past end of stream ({:.3}s)",
                duration.as_secs_f64()
            )));
        }

        let (mut decoder, time_base, start_offset) = self.build_decoder()?;

        let seek_timestamp = crate::conversion::duration_to_seek_timestamp(timestamp);
        self.input_context
            .seek(seek_timestamp, ..seek_timestamp)
            .map_err(|error| unavailable(format!("seek failed: {error}")))?;

        // Accept the frame whose display interval contains the target.
        let tolerance = if self.metadata.has_usable_frame_rate() {
            0.5 / self.metadata.frames_per_second
        } else {
            0.0
        };
        let target_seconds = timestamp.as_secs_f64() - tolerance;
        let frame_seconds = |frame: &VideoFrame| {
            let pts = frame.timestamp().or(frame.pts()).unwrap_or(0);
            crate::conversion::pts_to_seconds(pts - start_offset, time_base)
        };

        let mut decoded_frame = VideoFrame::empty();
        for (stream, packet) in self.input_context.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            decoder
                .send_packet(&packet)
                .map_err(|error| unavailable(format!("decode failed: {error}")))?;

            while decoder.receive_frame(&mut decoded_frame).is_ok() {
                if frame_seconds(&decoded_frame) >= target_seconds {
                    return frame_to_rgb_image(&decoded_frame);
                }
            }
        }

        decoder
            .send_eof()
            .map_err(|error| unavailable(format!("decoder flush failed: {error}")))?;
        while decoder.receive_frame(&mut decoded_frame).is_ok() {
            if frame_seconds(&decoded_frame) >= target_seconds {
                return frame_to_rgb_image(&decoded_frame);
            }
        }

        Err(unavailable("reached end of stream before target".to_string()))
    }
}

/// Scale a decoded frame to RGB24 at its own resolution.
fn frame_to_rgb_image(frame: &VideoFrame) -> Result<DynamicImage, CutlistError> {
    let (width, height) = (frame.width(), frame.height());
    let mut scaler = ScalingContext::get(
        frame.format(),
        width,
        height,
        Pixel::RGB24,
        width,
        height,
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;

    let buffer = crate::conversion::frame_to_buffer(&rgb_frame, width, height, 3);
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        CutlistError::FfmpegError("decoded RGB plane is smaller than the frame".to_string())
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}

/// A forward-only luminance pass over a [`VideoFile`].
///
/// Created by [`VideoFile::luma_frames`]. Frames are decoded on demand and
/// converted to GRAY8 at the (optionally downscaled) output resolution.
pub struct LumaFrames<'a> {
    video: &'a mut VideoFile,
    decoder: VideoDecoder,
    downscale_factor: u32,
    scaler: Option<(ScalerInput, ScalingContext)>,
    output_size: Option<(u32, u32)>,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
}

/// Decoded-frame properties the scaler was configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScalerInput {
    format: Pixel,
    width: u32,
    height: u32,
}

impl<'a> LumaFrames<'a> {
    fn new(video: &'a mut VideoFile, downscale_factor: u32) -> Result<Self, CutlistError> {
        let (decoder, _, _) = video.build_decoder()?;

        // A fresh file is already at the start; a reused one must rewind.
        if let Err(error) = video.input_context.seek(0, ..0) {
            log::debug!("Rewind before luminance pass failed: {error}");
        }

        log::debug!(
            "Starting luminance pass over {} (downscale={downscale_factor})",
            video.file_path.display()
        );

        Ok(Self {
            video,
            decoder,
            downscale_factor,
            scaler: None,
            output_size: None,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
        })
    }

    fn unreadable(&self, reason: String) -> CutlistError {
        CutlistError::UnreadableVideo {
            path: self.video.file_path.clone(),
            reason,
        }
    }

    fn convert_current_frame(&mut self) -> Result<GrayImage, CutlistError> {
        let input = ScalerInput {
            format: self.decoded_frame.format(),
            width: self.decoded_frame.width(),
            height: self.decoded_frame.height(),
        };
        let factor = self.downscale_factor;
        let (width, height) = *self.output_size.get_or_insert_with(|| {
            ((input.width / factor).max(1), (input.height / factor).max(1))
        });

        // Some decoders change pixel format mid-stream; rebuild on change.
        if self.scaler.as_ref().is_none_or(|(current, _)| *current != input) {
            let scaler = ScalingContext::get(
                input.format,
                input.width,
                input.height,
                Pixel::GRAY8,
                width,
                height,
                ScalingFlags::AREA,
            )?;
            self.scaler = Some((input, scaler));
        }

        if let Some((_, scaler)) = self.scaler.as_mut() {
            scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
        }

        let buffer = crate::conversion::frame_to_buffer(&self.scaled_frame, width, height, 1);
        GrayImage::from_raw(width, height, buffer)
            .ok_or_else(|| self.unreadable("decoded luminance plane is truncated".to_string()))
    }
}

impl FrameSource for LumaFrames<'_> {
    fn video_metadata(&self) -> &VideoMetadata {
        &self.video.metadata
    }

    fn next_luma_frame(&mut self) -> Result<Option<GrayImage>, CutlistError> {
        loop {
            if self.done {
                return Ok(None);
            }

            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.video.input_context) {
                Ok(()) => {
                    if packet.stream() != self.video.video_stream_index {
                        continue;
                    }
                    match self.decoder.send_packet(&packet) {
                        Ok(()) => {}
                        Err(FfmpegError::InvalidData) => {
                            log::warn!(
                                "Skipping corrupt packet in {} (pts={:?})",
                                self.video.file_path.display(),
                                packet.pts()
                            );
                        }
                        Err(error) => {
                            self.done = true;
                            return Err(self.unreadable(format!("decode failed: {error}")));
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|error| self.unreadable(format!("flush failed: {error}")))?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    self.done = true;
                    return Err(self.unreadable(format!("demux failed: {error}")));
                }
            }
        }
    }
}
