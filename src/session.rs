//! Session-keyed live cut lists.
//!
//! A [`SessionStore`] owns one workspace directory per session under its
//! root (`<root>/<session-id>/`) holding the acquired video, the frame
//! artifacts, and the exports. Every ingest or edit for one session runs
//! under that session's lock, so sequential requests see each other's
//! results and the last writer wins. Different sessions never contend
//! beyond a brief lookup in the session map.
//!
//! # Example
//!
//! ```no_run
//! use cutlist::{SessionId, SessionStore, VideoSource};
//! use serde_json::json;
//!
//! let store = SessionStore::new("workspace");
//! let id = SessionId::new("demo")?;
//! let live = store.ingest(&id, &VideoSource::Upload("input.mp4".into()))?;
//! println!("{} cut(s)", live.cutlist.len());
//!
//! let outcome = store.edit(&id, &json!([{"Start(sec)": 0.0, "End(sec)": 2.5}]))?;
//! println!("{}", serde_json::to_string(&outcome.into_response())?);
//! # Ok::<(), cutlist::CutlistError>(())
//! ```

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::acquisition::VideoSource;
use crate::configuration::SamplerOptions;
use crate::cut::Cutlist;
use crate::detector::{CutDetector, DetectionOptions};
use crate::editor::{EditResponse, normalize_submission};
use crate::error::CutlistError;
use crate::export::{
    ArchiveEntry, CSV_FILE_NAME, FRAMES_DIR, JSON_FILE_NAME, archive_manifest, save_csv, save_json,
};
use crate::metadata::VideoMetadata;
use crate::sampler::{FrameArtifacts, FrameSampler, sample_video};
use crate::validation::ValidationReport;
use crate::video_file::VideoFile;

const INPUT_STEM: &str = "input";
const STAGING_DIR: &str = ".staging";

/// Identifier of one editing session.
///
/// Restricted to ASCII letters, digits, `-` and `_` so it is always safe
/// as a directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    ///
    /// [`CutlistError::Validation`] if `id` is empty or contains other
    /// characters.
    pub fn new(id: impl Into<String>) -> Result<Self, CutlistError> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(id))
        } else {
            Err(CutlistError::Validation {
                index: None,
                reason: format!("invalid session id {id:?}"),
            })
        }
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = CutlistError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

/// The live state of a session after an ingest or edit.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveCutlist {
    /// The acquired video inside the session workspace.
    pub video_path: PathBuf,
    /// Current cut list.
    pub cutlist: Cutlist,
    /// One frame slot per cut.
    pub frames: FrameArtifacts,
    /// Metadata probed at ingest.
    pub metadata: VideoMetadata,
}

/// Result of a successful edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    /// The normalized cut list now live for the session.
    pub cutlist: Cutlist,
    /// Regenerated frame slots, one per cut.
    pub frames: FrameArtifacts,
    /// Records dropped during normalization.
    pub report: ValidationReport,
}

impl EditOutcome {
    /// Response body for the mutation endpoint.
    pub fn into_response(self) -> EditResponse {
        EditResponse::success(self.cutlist, &self.frames)
    }
}

type SessionSlot = Arc<Mutex<Option<LiveCutlist>>>;

/// Live cut lists keyed by session.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    detection: DetectionOptions,
    sampler: SamplerOptions,
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

impl SessionStore {
    /// Create a store whose workspaces live under `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            detection: DetectionOptions::default(),
            sampler: SamplerOptions::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Detection options used by [`ingest`](Self::ingest).
    #[must_use]
    pub fn with_detection_options(mut self, options: DetectionOptions) -> Self {
        self.detection = options;
        self
    }

    /// Sampling options used by [`ingest`](Self::ingest) and
    /// [`edit`](Self::edit).
    #[must_use]
    pub fn with_sampler_options(mut self, options: SamplerOptions) -> Self {
        self.sampler = options;
        self
    }

    /// Root directory holding all workspaces.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Workspace directory of a session.
    pub fn workspace(&self, id: &SessionId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Acquire a video, detect its cuts, sample frames, and write exports.
    ///
    /// Any previous state, frames, and exports of the session are discarded
    /// first, whether or not the ingest succeeds.
    ///
    /// # Errors
    ///
    /// [`CutlistError::Acquisition`], [`CutlistError::UnreadableVideo`],
    /// [`CutlistError::InvalidVideoMetadata`], or [`CutlistError::Storage`].
    /// No partial cut list is kept on failure.
    pub fn ingest(&self, id: &SessionId, source: &VideoSource) -> Result<LiveCutlist, CutlistError> {
        let slot = self.slot(id);
        let mut state = lock(&*slot);
        *state = None;

        let workspace = self.workspace(id);
        discard_outputs(&workspace)?;
        log::info!("Session {id}: ingesting {source}");

        let destination = workspace.join(format!("{INPUT_STEM}.{}", source.extension()));
        let video_path = source.resolve(&destination)?;

        let mut video = VideoFile::open(&video_path)?;
        let report = video.validate();
        if !report.is_valid() {
            return Err(CutlistError::InvalidVideoMetadata(report.errors.join("; ")));
        }
        for warning in &report.warnings {
            log::warn!("Session {id}: {warning}");
        }

        let cutlist = CutDetector::new(self.detection.clone()).detect(&mut video)?;
        let frames = FrameSampler::new(self.sampler.clone()).sample(
            &mut video,
            &cutlist,
            &workspace.join(FRAMES_DIR),
        )?;
        write_exports(&workspace, &cutlist)?;

        let live = LiveCutlist {
            video_path,
            cutlist,
            frames,
            metadata: video.metadata().clone(),
        };
        *state = Some(live.clone());
        Ok(live)
    }

    /// Replace the session's cut list with a normalized submission,
    /// regenerate every frame, and rewrite the exports.
    ///
    /// # Errors
    ///
    /// - [`CutlistError::UnknownSession`] if nothing was ingested.
    /// - [`CutlistError::Validation`] if the payload is not a record list.
    /// - [`CutlistError::SourceUnavailable`] if the video was removed.
    /// - [`CutlistError::Storage`] if artifacts cannot be written.
    ///
    /// Frames and exports are staged under `.staging/` and swapped in only
    /// once all of them are written. On error the previous live state and
    /// its files are kept, except when swapping the frame directory itself
    /// fails: the new cut list is then live with every frame slot absent.
    pub fn edit(&self, id: &SessionId, payload: &Value) -> Result<EditOutcome, CutlistError> {
        let slot = self
            .existing_slot(id)
            .ok_or_else(|| CutlistError::UnknownSession(id.to_string()))?;
        let mut state = lock(&*slot);
        let live = state
            .as_mut()
            .ok_or_else(|| CutlistError::UnknownSession(id.to_string()))?;

        let (cutlist, report) = normalize_submission(payload)?;
        for warning in &report.warnings {
            log::warn!("Session {id}: {warning}");
        }

        let workspace = self.workspace(id);
        let staging = workspace.join(STAGING_DIR);
        remove_dir_if_present(&staging)?;
        let staged = sample_video(
            &live.video_path,
            &cutlist,
            &staging.join(FRAMES_DIR),
            &self.sampler,
        )
        .and_then(|frames| write_exports(&staging, &cutlist).map(|()| frames))
        .and_then(|frames| {
            for name in [CSV_FILE_NAME, JSON_FILE_NAME] {
                fs::rename(staging.join(name), workspace.join(name))
                    .map_err(|error| CutlistError::storage(workspace.join(name), error))?;
            }
            Ok(frames)
        });
        let staged = match staged {
            Ok(frames) => frames,
            Err(error) => {
                if let Err(cleanup) = remove_dir_if_present(&staging) {
                    log::warn!("Session {id}: {cleanup}");
                }
                return Err(error);
            }
        };

        live.cutlist = cutlist.clone();
        let frames_dir = workspace.join(FRAMES_DIR);
        if let Err(error) = remove_dir_if_present(&frames_dir).and_then(|()| {
            fs::rename(staging.join(FRAMES_DIR), &frames_dir)
                .map_err(|error| CutlistError::storage(&frames_dir, error))
        }) {
            live.frames = FrameArtifacts::from(vec![None::<PathBuf>; cutlist.len()]);
            if let Err(cleanup) = remove_dir_if_present(&staging) {
                log::warn!("Session {id}: {cleanup}");
            }
            return Err(error);
        }

        let frames = FrameArtifacts::from(
            staged
                .into_slots()
                .into_iter()
                .map(|slot| {
                    slot.and_then(|path| path.file_name().map(|name| frames_dir.join(name)))
                })
                .collect::<Vec<_>>(),
        );
        live.frames = frames.clone();
        if let Err(cleanup) = remove_dir_if_present(&staging) {
            log::warn!("Session {id}: {cleanup}");
        }
        log::info!("Session {id}: cut list replaced ({} cut(s))", cutlist.len());

        Ok(EditOutcome {
            cutlist,
            frames,
            report,
        })
    }

    /// Snapshot of the session's live state.
    pub fn live(&self, id: &SessionId) -> Option<LiveCutlist> {
        let slot = self.existing_slot(id)?;
        let state = lock(&*slot);
        state.clone()
    }

    /// Ordered archive contents for the session's current exports.
    ///
    /// # Errors
    ///
    /// [`CutlistError::UnknownSession`] if nothing was ingested.
    pub fn archive_manifest(&self, id: &SessionId) -> Result<Vec<ArchiveEntry>, CutlistError> {
        let live = self
            .live(id)
            .ok_or_else(|| CutlistError::UnknownSession(id.to_string()))?;
        Ok(archive_manifest(
            &self.workspace(id).join(CSV_FILE_NAME),
            &live.frames,
        ))
    }

    /// Forget a session and delete its workspace.
    ///
    /// Returns whether the session existed.
    ///
    /// # Errors
    ///
    /// [`CutlistError::Storage`] if the workspace cannot be deleted.
    pub fn remove(&self, id: &SessionId) -> Result<bool, CutlistError> {
        let slot = lock(&self.sessions).remove(id);
        let existed = slot.is_some();

        // Wait out any in-flight request before deleting its files.
        let _guard = slot.as_ref().map(|slot| lock(&**slot));

        let workspace = self.workspace(id);
        match fs::remove_dir_all(&workspace) {
            Ok(()) => {
                log::info!("Session {id}: workspace removed");
                Ok(existed)
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(existed),
            Err(error) => Err(CutlistError::storage(workspace, error)),
        }
    }

    fn slot(&self, id: &SessionId) -> SessionSlot {
        lock(&self.sessions).entry(id.clone()).or_default().clone()
    }

    fn existing_slot(&self, id: &SessionId) -> Option<SessionSlot> {
        lock(&self.sessions).get(id).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn write_exports(workspace: &Path, cutlist: &Cutlist) -> Result<(), CutlistError> {
    save_csv(&workspace.join(CSV_FILE_NAME), cutlist)?;
    save_json(&workspace.join(JSON_FILE_NAME), cutlist)
}

fn remove_dir_if_present(dir: &Path) -> Result<(), CutlistError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
        Err(error) => Err(CutlistError::storage(dir, error)),
    }
}

fn discard_outputs(workspace: &Path) -> Result<(), CutlistError> {
    remove_dir_if_present(&workspace.join(FRAMES_DIR))?;
    remove_dir_if_present(&workspace.join(STAGING_DIR))?;

    for name in [CSV_FILE_NAME, JSON_FILE_NAME] {
        let path = workspace.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(CutlistError::storage(path, error)),
        }
    }
    Ok(())
}
