//! Error types for the `cutlist` crate.
//!
//! This module defines [`CutlistError`], the unified error type returned by
//! every fallible operation in the crate. Variants follow the pipeline's
//! failure taxonomy (acquisition, decoding, metadata, validation, storage)
//! and carry the context needed to diagnose a failure from the log alone:
//! source paths, cut indices, and timestamps.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;

/// The unified error type for all `cutlist` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CutlistError {
    /// No usable video file could be obtained from the given source.
    #[error("Failed to acquire video from {origin}: {reason}")]
    Acquisition {
        /// Upload path or drive link the video was requested from.
        origin: String,
        /// Why acquisition failed.
        reason: String,
    },

    /// The file exists but could not be opened or decoded as video.
    #[error("Unreadable video at {path}: {reason}")]
    UnreadableVideo {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying decoder or demuxer message.
        reason: String,
    },

    /// The stream's frame rate or duration makes detection impossible.
    #[error("Invalid video metadata: {0}")]
    InvalidVideoMetadata(String),

    /// A submitted cut record or payload is malformed.
    #[error("Validation failed: {reason}")]
    Validation {
        /// Position of the offending record, when one record is to blame.
        index: Option<usize>,
        /// Description of the violation.
        reason: String,
    },

    /// A frame artifact or export file could not be written.
    #[error("Storage error at {path}: {reason}")]
    Storage {
        /// File or directory that could not be written.
        path: PathBuf,
        /// Underlying I/O or encoder message.
        reason: String,
    },

    /// The video the cut list refers to is no longer on disk.
    #[error("Video source unavailable: {0}")]
    SourceUnavailable(PathBuf),

    /// No frame could be decoded at or after the requested timestamp.
    #[error("No frame available at {timestamp:?}: {reason}")]
    FrameUnavailable {
        /// Requested seek position.
        timestamp: Duration,
        /// Why the frame could not be produced.
        reason: String,
    },

    /// The session has no live cut list.
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A JSON payload could not be parsed or produced.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),

    /// The background worker running the pipeline panicked or was aborted.
    #[cfg(feature = "async")]
    #[error("Pipeline worker failed: {0}")]
    WorkerFailed(String),
}

impl From<FfmpegError> for CutlistError {
    fn from(error: FfmpegError) -> Self {
        CutlistError::FfmpegError(error.to_string())
    }
}

impl CutlistError {
    /// Build a [`CutlistError::Storage`] from any displayable cause.
    pub(crate) fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CutlistError::Storage {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Message suitable for showing to the person who made the request.
    ///
    /// Internal details such as FFmpeg codes are folded into a short
    /// category so the serving layer can forward it verbatim.
    pub fn user_message(&self) -> String {
        match self {
            CutlistError::Acquisition { .. } => {
                "Could not obtain the video. Check the uploaded file or link.".to_string()
            }
            CutlistError::UnreadableVideo { .. } | CutlistError::FfmpegError(_) => {
                "The video could not be decoded.".to_string()
            }
            CutlistError::InvalidVideoMetadata(_) => {
                "The video reports no usable frame rate or duration.".to_string()
            }
            CutlistError::SourceUnavailable(_) => {
                "The video for this cut list is no longer available.".to_string()
            }
            CutlistError::UnknownSession(_) => "No video has been loaded yet.".to_string(),
            other => other.to_string(),
        }
    }
}
