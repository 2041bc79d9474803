//! Representative-frame sampling.
//!
//! For each cut, [`FrameSampler`] seeks to the cut's start time, decodes the
//! first frame at or after it, and writes it as `frame_<index>.<ext>` in the
//! output directory. Slots are addressed by position in the cut list, so the
//! result always has exactly one entry per cut.
//!
//! A cut whose frame cannot be produced leaves its slot empty and the pass
//! continues. Repeated start times reuse the frame decoded for the first
//! occurrence.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::slice::Iter;

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use crate::configuration::{FrameImageFormat, SamplerOptions};
use crate::conversion::seconds_to_millis;
use crate::cut::Cutlist;
use crate::error::CutlistError;
use crate::export::{FRAME_FILE_PREFIX, frame_file_name};
use crate::progress::{OperationType, ProgressTracker};
use crate::source::FrameSeeker;
use crate::video_file::VideoFile;

/// One artifact slot per cut, in cut-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameArtifacts {
    slots: Vec<Option<PathBuf>>,
}

impl FrameArtifacts {
    /// Number of slots. Equals the length of the sampled cut list.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Path of the artifact for cut `index`, if one was written.
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.slots.get(index).and_then(|slot| slot.as_deref())
    }

    /// Number of slots holding an artifact.
    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over the slots in order.
    pub fn iter(&self) -> Iter<'_, Option<PathBuf>> {
        self.slots.iter()
    }

    /// Artifact file names in order, with `""` for absent slots.
    pub fn file_names(&self) -> Vec<String> {
        self.slots
            .iter()
            .map(|slot| {
                slot.as_deref()
                    .and_then(Path::file_name)
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Consume and return the raw slots.
    pub fn into_slots(self) -> Vec<Option<PathBuf>> {
        self.slots
    }
}

impl From<Vec<Option<PathBuf>>> for FrameArtifacts {
    fn from(slots: Vec<Option<PathBuf>>) -> Self {
        Self { slots }
    }
}

/// Writes one representative frame per cut.
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    options: SamplerOptions,
}

impl FrameSampler {
    /// Create a sampler with the given options.
    pub fn new(options: SamplerOptions) -> Self {
        Self { options }
    }

    /// Options this sampler runs with.
    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Sample one frame per cut from `seeker` into `output_dir`.
    ///
    /// Existing `frame_*` artifacts in `output_dir` are removed first, so
    /// the directory reflects only this call.
    ///
    /// # Errors
    ///
    /// [`CutlistError::Storage`] if the directory cannot be prepared or an
    /// image cannot be written. Per-cut decode failures are not errors; the
    /// slot is left empty.
    pub fn sample<S>(
        &self,
        seeker: &mut S,
        cutlist: &Cutlist,
        output_dir: &Path,
    ) -> Result<FrameArtifacts, CutlistError>
    where
        S: FrameSeeker + ?Sized,
    {
        fs::create_dir_all(output_dir).map_err(|error| CutlistError::storage(output_dir, error))?;
        clear_frame_artifacts(output_dir)?;

        log::debug!(
            "Sampling {} frame(s) into {} as {}",
            cutlist.len(),
            output_dir.display(),
            self.options.image_format.extension(),
        );

        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameSampling,
            Some(cutlist.len() as u64),
            self.options.batch_size,
        );

        let mut memo: HashMap<i64, DynamicImage> = HashMap::new();
        let mut slots = Vec::with_capacity(cutlist.len());

        for (index, cut) in cutlist.iter().enumerate() {
            let millis = seconds_to_millis(cut.start);

            // Failures are not memoized; a later cut with the same start retries.
            if !memo.contains_key(&millis) {
                match seeker.frame_at_millis(millis) {
                    Ok(image) => {
                        memo.insert(millis, image);
                    }
                    Err(error) => {
                        log::warn!("No frame for cut {index} at {:.1}s: {error}", cut.start);
                    }
                }
            }

            let slot = match memo.get(&millis) {
                Some(image) => {
                    let path = output_dir.join(frame_file_name(index, self.options.image_format));
                    self.write_image(image, &path)?;
                    Some(path)
                }
                None => None,
            };
            slots.push(slot);
            tracker.advance();
        }
        tracker.finish();

        let artifacts = FrameArtifacts { slots };
        log::info!(
            "Frame sampling complete: {}/{} frame(s) written ({} distinct seek(s))",
            artifacts.present_count(),
            artifacts.len(),
            memo.len(),
        );
        Ok(artifacts)
    }

    fn write_image(&self, image: &DynamicImage, path: &Path) -> Result<(), CutlistError> {
        match self.options.image_format {
            FrameImageFormat::Jpeg => {
                let file = File::create(path).map_err(|error| CutlistError::storage(path, error))?;
                let encoder =
                    JpegEncoder::new_with_quality(BufWriter::new(file), self.options.jpeg_quality);
                image
                    .to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|error| CutlistError::storage(path, error))
            }
            FrameImageFormat::Png => image
                .save_with_format(path, self.options.image_format.to_image_format())
                .map_err(|error| CutlistError::storage(path, error)),
        }
    }
}

/// Open `video_path` and sample one frame per cut into `output_dir`.
///
/// # Errors
///
/// [`CutlistError::SourceUnavailable`] if the video no longer exists, any
/// open error from [`VideoFile::open`], and the errors of
/// [`FrameSampler::sample`].
pub fn sample_video(
    video_path: &Path,
    cutlist: &Cutlist,
    output_dir: &Path,
    options: &SamplerOptions,
) -> Result<FrameArtifacts, CutlistError> {
    if !video_path.exists() {
        return Err(CutlistError::SourceUnavailable(video_path.to_path_buf()));
    }
    let mut video = VideoFile::open(video_path)?;
    FrameSampler::new(options.clone()).sample(&mut video, cutlist, output_dir)
}

/// Remove previously written `frame_*` artifacts from `dir`.
pub(crate) fn clear_frame_artifacts(dir: &Path) -> Result<(), CutlistError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(CutlistError::storage(dir, error)),
    };

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.map_err(|error| CutlistError::storage(dir, error))?;
        let path = entry.path();
        let is_artifact = path.is_file()
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FRAME_FILE_PREFIX));
        if is_artifact {
            fs::remove_file(&path).map_err(|error| CutlistError::storage(&path, error))?;
            removed += 1;
        }
    }

    if removed > 0 {
        log::debug!("Removed {removed} stale frame artifact(s) from {}", dir.display());
    }
    Ok(())
}
