//! # cutlist
//!
//! Scene-cut detection and cut-list editing for video files.
//!
//! `cutlist` decodes a video once, finds the frames where the picture
//! changes abruptly, and turns them into a gap-free list of time intervals
//! (a [`Cutlist`]). For each interval it writes one representative still
//! frame. Users can then submit an edited list; the crate validates it,
//! regenerates the frames, and rewrites the CSV and JSON exports. Decoding
//! is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Detect Cuts
//!
//! ```no_run
//! use cutlist::{CutDetector, DetectionOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let detector = CutDetector::new(DetectionOptions::new().with_downscale_factor(2));
//! for cut in &detector.detect(&mut video)? {
//!     println!("{:.1}s – {:.1}s", cut.start, cut.end);
//! }
//! # Ok::<(), cutlist::CutlistError>(())
//! ```
//!
//! ### Sample One Frame per Cut
//!
//! ```no_run
//! use std::path::Path;
//!
//! use cutlist::{Cut, Cutlist, FrameSampler, SamplerOptions, VideoFile};
//!
//! let mut video = VideoFile::open("input.mp4")?;
//! let cuts = Cutlist::from_cuts(vec![Cut::new(0.0, 4.0), Cut::new(4.0, 10.0)]);
//! let frames = FrameSampler::new(SamplerOptions::new())
//!     .sample(&mut video, &cuts, Path::new("frames"))?;
//! assert_eq!(frames.len(), cuts.len());
//! # Ok::<(), cutlist::CutlistError>(())
//! ```
//!
//! ### Edit a Session's Cut List
//!
//! ```no_run
//! use cutlist::{SessionId, SessionStore, VideoSource};
//! use serde_json::json;
//!
//! let store = SessionStore::new("workspace");
//! let id = SessionId::new("demo")?;
//! store.ingest(&id, &VideoSource::Upload("input.mp4".into()))?;
//! let outcome = store.edit(&id, &json!({"cutlist": [
//!     {"Start(sec)": 1.0, "End(sec)": 3.0, "Transcript": "intro"},
//! ]}))?;
//! println!("{}", serde_json::to_string(&outcome.into_response())?);
//! # Ok::<(), cutlist::CutlistError>(())
//! ```
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `async` | [`ingest_async`] and [`edit_async`] on Tokio's blocking pool |
//! | `remote` | Downloading drive links in [`VideoSource::resolve`] |
//! | `full` | All of the above |

pub mod acquisition;
pub mod configuration;
mod conversion;
pub mod cut;
pub mod detector;
pub mod editor;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod metadata;
pub mod progress;
pub mod sampler;
pub mod session;
pub mod source;
pub mod validation;
pub mod video_file;
#[cfg(feature = "async")]
pub mod worker;

pub use acquisition::{
    VideoSource, download, drive_download_url, drive_file_id, ensure_readable,
};
pub use configuration::{FrameImageFormat, SamplerOptions};
pub use conversion::{round_to_tenth, seconds_to_millis};
pub use cut::{Cut, Cutlist};
pub use detector::{
    CutDetector, DEFAULT_CHANGED_PIXELS_THRESHOLD, DEFAULT_MEAN_THRESHOLD,
    DEFAULT_PIXEL_THRESHOLD, DetectionOptions, ScoringStrategy, detect_cuts, frame_difference,
};
pub use editor::{
    EditResponse, normalize_cutlist, normalize_records, normalize_submission, parse_submission,
};
pub use error::CutlistError;
pub use export::{
    ArchiveEntry, CSV_FILE_NAME, FRAMES_DIR, JSON_FILE_NAME, archive_manifest, frame_file_name,
    save_csv, save_json, write_csv, write_json,
};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use sampler::{FrameArtifacts, FrameSampler, sample_video};
pub use session::{EditOutcome, LiveCutlist, SessionId, SessionStore};
pub use source::{FrameSeeker, FrameSource};
pub use validation::ValidationReport;
pub use video_file::{LumaFrames, VideoFile};
#[cfg(feature = "async")]
pub use worker::{PipelineFuture, edit_async, ingest_async};
