//! Frame sampling tests against an in-memory seeker.

use std::fs;
use std::path::Path;
use std::time::Duration;

use cutlist::{
    Cut, Cutlist, CutlistError, FrameImageFormat, FrameSampler, FrameSeeker, SamplerOptions,
    VideoMetadata, sample_video,
};
use image::{DynamicImage, Rgb, RgbImage};

/// Serves a solid frame per timestamp and records every seek.
struct CountingSeeker {
    metadata: VideoMetadata,
    seeks: Vec<i64>,
    broken_at: Vec<i64>,
}

impl CountingSeeker {
    fn new(duration_seconds: u64) -> Self {
        Self {
            metadata: VideoMetadata::synthetic(16, 9, 10.0, duration_seconds * 10),
            seeks: Vec::new(),
            broken_at: Vec::new(),
        }
    }
}

impl FrameSeeker for CountingSeeker {
    fn video_metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn frame_at_millis(&mut self, millis: i64) -> Result<DynamicImage, CutlistError> {
        self.seeks.push(millis);
        let timestamp = Duration::from_millis(millis as u64);
        if timestamp >= self.metadata.duration {
            return Err(CutlistError::FrameUnavailable {
                timestamp,
                reason: "past end of stream".to_string(),
            });
        }
        if self.broken_at.contains(&millis) {
            return Err(CutlistError::FrameUnavailable {
                timestamp,
                reason: "corrupt frame".to_string(),
            });
        }
        let shade = (millis / 100 % 256) as u8;
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            16,
            9,
            Rgb([shade, shade, shade]),
        )))
    }
}

fn cutlist(spans: &[(f64, f64)]) -> Cutlist {
    spans
        .iter()
        .map(|&(start, end)| Cut::new(start, end))
        .collect()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn one_slot_per_cut() {
    let dir = tempfile::tempdir().unwrap();
    let mut seeker = CountingSeeker::new(10);
    let cuts = cutlist(&[(0.0, 4.0), (4.0, 7.5), (7.5, 10.0)]);

    let artifacts = FrameSampler::default()
        .sample(&mut seeker, &cuts, dir.path())
        .unwrap();

    assert_eq!(artifacts.len(), cuts.len());
    assert_eq!(artifacts.present_count(), 3);
    assert_eq!(seeker.seeks, vec![0, 4000, 7500]);
    assert_eq!(
        file_names(dir.path()),
        vec!["frame_0.jpg", "frame_1.jpg", "frame_2.jpg"]
    );
    assert_eq!(artifacts.get(1), Some(dir.path().join("frame_1.jpg").as_path()));
}

#[test]
fn cut_past_the_end_leaves_its_slot_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut seeker = CountingSeeker::new(10);
    let cuts = cutlist(&[(0.0, 4.0), (4.0, 10.0), (12.0, 13.0), (5.0, 6.0)]);

    let artifacts = FrameSampler::default()
        .sample(&mut seeker, &cuts, dir.path())
        .unwrap();

    assert_eq!(artifacts.len(), 4);
    assert!(artifacts.get(0).is_some());
    assert!(artifacts.get(1).is_some());
    assert!(artifacts.get(2).is_none());
    assert!(artifacts.get(3).is_some());
    assert_eq!(
        artifacts.file_names(),
        vec!["frame_0.jpg", "frame_1.jpg", "", "frame_3.jpg"]
    );
    assert!(!dir.path().join("frame_2.jpg").exists());
}

#[test]
fn equal_rounded_starts_share_one_seek() {
    let dir = tempfile::tempdir().unwrap();
    let mut seeker = CountingSeeker::new(10);
    let cuts = cutlist(&[(2.0, 3.0), (2.0, 5.0), (6.0, 7.0), (2.0, 9.0)]);

    let artifacts = FrameSampler::default()
        .sample(&mut seeker, &cuts, dir.path())
        .unwrap();

    assert_eq!(seeker.seeks, vec![2000, 6000]);
    assert_eq!(artifacts.present_count(), 4);

    let first = fs::read(dir.path().join("frame_0.jpg")).unwrap();
    let repeat = fs::read(dir.path().join("frame_3.jpg")).unwrap();
    assert_eq!(first, repeat);
}

#[test]
fn failed_seeks_are_retried_not_memoized() {
    let dir = tempfile::tempdir().unwrap();
    let mut seeker = CountingSeeker::new(10);
    seeker.broken_at.push(3000);
    let cuts = cutlist(&[(3.0, 4.0), (3.0, 5.0)]);

    let artifacts = FrameSampler::default()
        .sample(&mut seeker, &cuts, dir.path())
        .unwrap();

    assert_eq!(seeker.seeks, vec![3000, 3000]);
    assert_eq!(artifacts.present_count(), 0);
    assert_eq!(artifacts.len(), 2);
}

#[test]
fn stale_frames_are_cleared_before_sampling() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("frame_7.jpg"), b"old").unwrap();
    fs::write(dir.path().join("frame_1.png"), b"old").unwrap();
    fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

    let mut seeker = CountingSeeker::new(10);
    FrameSampler::default()
        .sample(&mut seeker, &cutlist(&[(0.0, 10.0)]), dir.path())
        .unwrap();

    assert_eq!(file_names(dir.path()), vec!["frame_0.jpg", "notes.txt"]);
}

#[test]
fn shrinking_the_list_removes_trailing_frames() {
    let dir = tempfile::tempdir().unwrap();
    let sampler = FrameSampler::default();

    let mut seeker = CountingSeeker::new(10);
    sampler
        .sample(&mut seeker, &cutlist(&[(0.0, 3.0), (3.0, 6.0), (6.0, 10.0)]), dir.path())
        .unwrap();
    sampler
        .sample(&mut seeker, &cutlist(&[(0.0, 10.0)]), dir.path())
        .unwrap();

    assert_eq!(file_names(dir.path()), vec!["frame_0.jpg"]);
}

#[test]
fn empty_cutlist_produces_no_slots() {
    let dir = tempfile::tempdir().unwrap();
    let mut seeker = CountingSeeker::new(10);
    let artifacts = FrameSampler::default()
        .sample(&mut seeker, &Cutlist::new(), dir.path())
        .unwrap();
    assert!(artifacts.is_empty());
    assert!(seeker.seeks.is_empty());
}

#[test]
fn png_artifacts_decode_back() {
    let dir = tempfile::tempdir().unwrap();
    let sampler =
        FrameSampler::new(SamplerOptions::new().with_image_format(FrameImageFormat::Png));
    let mut seeker = CountingSeeker::new(10);

    let artifacts = sampler
        .sample(&mut seeker, &cutlist(&[(1.0, 2.0)]), dir.path())
        .unwrap();

    let path = artifacts.get(0).unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
    let image = image::open(path).unwrap().to_rgb8();
    assert_eq!(image.dimensions(), (16, 9));
    assert_eq!(image.get_pixel(0, 0), &Rgb([10, 10, 10]));
}

#[test]
fn output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("frames");
    let mut seeker = CountingSeeker::new(10);

    FrameSampler::default()
        .sample(&mut seeker, &cutlist(&[(0.0, 1.0)]), &nested)
        .unwrap();

    assert!(nested.join("frame_0.jpg").is_file());
}

#[test]
fn unwritable_output_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, b"file").unwrap();
    let mut seeker = CountingSeeker::new(10);

    let result = FrameSampler::default().sample(&mut seeker, &cutlist(&[(0.0, 1.0)]), &blocker);
    assert!(matches!(result, Err(CutlistError::Storage { .. })));
}

#[test]
fn missing_video_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let result = sample_video(
        &dir.path().join("gone.mp4"),
        &cutlist(&[(0.0, 1.0)]),
        dir.path(),
        &SamplerOptions::default(),
    );
    assert!(matches!(result, Err(CutlistError::SourceUnavailable(_))));
}

#[test]
fn sampler_options_defaults() {
    let options = SamplerOptions::default();
    assert_eq!(options.image_format(), FrameImageFormat::Jpeg);
    assert_eq!(options.jpeg_quality(), 90);
    assert_eq!(SamplerOptions::new().with_jpeg_quality(0).jpeg_quality(), 1);
    assert_eq!("PNG".parse::<FrameImageFormat>(), Ok(FrameImageFormat::Png));
    assert_eq!(".jpeg".parse::<FrameImageFormat>(), Ok(FrameImageFormat::Jpeg));
    assert!("gif".parse::<FrameImageFormat>().is_err());
}
