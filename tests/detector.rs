//! Cut detection tests against in-memory frame sources.
//!
//! File-backed detection is covered in `tests/video_file.rs`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cutlist::{
    Cut, CutlistError, DetectionOptions, FrameSource, OperationType, ProgressCallback,
    ProgressInfo, ScoringStrategy, VideoMetadata, detect_cuts, frame_difference,
};
use image::{GrayImage, Luma};

/// Emits flat grey frames whose intensity changes at the given frame numbers.
struct SceneFrames {
    metadata: VideoMetadata,
    frame_size: (u32, u32),
    total: u64,
    changes: Vec<u64>,
    emitted: u64,
}

impl SceneFrames {
    fn new(fps: f64, total: u64, changes: &[u64]) -> Self {
        Self {
            metadata: VideoMetadata::synthetic(64, 36, fps, total),
            frame_size: (64, 36),
            total,
            changes: changes.to_vec(),
            emitted: 0,
        }
    }

    fn intensity(&self, frame: u64) -> u8 {
        let scene = self.changes.iter().filter(|&&at| at <= frame).count();
        if scene % 2 == 0 { 40 } else { 200 }
    }
}

impl FrameSource for SceneFrames {
    fn video_metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_luma_frame(&mut self) -> Result<Option<GrayImage>, CutlistError> {
        if self.emitted >= self.total {
            return Ok(None);
        }
        let value = self.intensity(self.emitted);
        self.emitted += 1;
        let (width, height) = self.frame_size;
        Ok(Some(GrayImage::from_pixel(width, height, Luma([value]))))
    }
}

fn spans(cuts: &cutlist::Cutlist) -> Vec<(f64, f64)> {
    cuts.iter().map(|cut| (cut.start, cut.end)).collect()
}

// ── Scoring ────────────────────────────────────────────────────────

#[test]
fn identical_frames_score_zero() {
    let frame = GrayImage::from_pixel(8, 8, Luma([90]));
    assert_eq!(
        frame_difference(&frame, &frame, ScoringStrategy::MeanAbsoluteDifference),
        0.0
    );
    assert_eq!(
        frame_difference(
            &frame,
            &frame,
            ScoringStrategy::ChangedPixels { pixel_threshold: 0 }
        ),
        0.0
    );
}

#[test]
fn mean_difference_is_symmetric_and_scaled_to_intensity() {
    let dark = GrayImage::from_pixel(4, 4, Luma([10]));
    let light = GrayImage::from_pixel(4, 4, Luma([30]));
    let strategy = ScoringStrategy::MeanAbsoluteDifference;
    assert_eq!(frame_difference(&dark, &light, strategy), 20.0);
    assert_eq!(frame_difference(&light, &dark, strategy), 20.0);
}

#[test]
fn changed_pixels_threshold_is_exclusive() {
    let base = GrayImage::from_pixel(10, 1, Luma([100]));
    let mut shifted = base.clone();
    shifted.put_pixel(0, 0, Luma([125]));
    shifted.put_pixel(1, 0, Luma([126]));

    let strategy = ScoringStrategy::ChangedPixels { pixel_threshold: 25 };
    assert_eq!(frame_difference(&base, &shifted, strategy), 1.0);
}

#[test]
fn mismatched_sizes_compare_overlap_only() {
    let small = GrayImage::from_pixel(2, 2, Luma([0]));
    let large = GrayImage::from_pixel(4, 4, Luma([50]));
    assert_eq!(
        frame_difference(&small, &large, ScoringStrategy::MeanAbsoluteDifference),
        50.0
    );
}

// ── Detection ──────────────────────────────────────────────────────

#[test]
fn single_change_splits_video_in_two() {
    let mut source = SceneFrames::new(30.0, 300, &[120]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 4.0), (4.0, 10.0)]);
    assert!(cuts.iter().all(|cut| cut.label.is_empty()));
}

#[test]
fn static_video_is_one_cut() {
    let mut source = SceneFrames::new(25.0, 125, &[]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(cuts.cuts(), &[Cut::new(0.0, 5.0)]);
}

#[test]
fn output_covers_duration_without_gaps() {
    let mut source = SceneFrames::new(30.0, 900, &[45, 200, 230, 400, 401, 800]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert!(cuts.covers(30.0), "cuts do not tile the video: {cuts:?}");
}

#[test]
fn changes_inside_min_scene_length_are_ignored() {
    // 10 and 20 are within 30 frames of the start; 45 is not.
    let mut source = SceneFrames::new(30.0, 90, &[10, 20, 45]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 1.5), (1.5, 3.0)]);
}

#[test]
fn boundary_needs_strictly_more_than_min_scene_frames() {
    let mut at_limit = SceneFrames::new(30.0, 90, &[30]);
    let cuts = detect_cuts(&mut at_limit, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 3.0)]);

    let mut past_limit = SceneFrames::new(30.0, 90, &[31]);
    let cuts = detect_cuts(&mut past_limit, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 1.0), (1.0, 3.0)]);
}

#[test]
fn zero_min_scene_length_allows_adjacent_boundaries() {
    let options = DetectionOptions::new().with_min_scene_length(Duration::ZERO);
    let mut source = SceneFrames::new(10.0, 30, &[10, 11]);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 1.0), (1.0, 1.1), (1.1, 3.0)]);
}

#[test]
fn boundaries_within_one_tenth_are_merged() {
    // Frames 30 and 31 both round to 1.0s at 30 fps.
    let options = DetectionOptions::new().with_min_scene_length(Duration::ZERO);
    let mut source = SceneFrames::new(30.0, 90, &[30, 31]);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 1.0), (1.0, 3.0)]);
    assert!(cuts.iter().all(|cut| cut.end > cut.start));
}

#[test]
fn times_are_rounded_to_tenths() {
    let mut source = SceneFrames::new(29.97, 300, &[100]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 3.3), (3.3, 10.0)]);
}

#[test]
fn threshold_is_exclusive() {
    // Intensity jumps by 160; a threshold of exactly 160 must not fire.
    let options = DetectionOptions::new().with_threshold(160.0);
    let mut source = SceneFrames::new(30.0, 120, &[60]);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(cuts.len(), 1);
}

#[test]
fn detection_is_deterministic() {
    let first = detect_cuts(
        &mut SceneFrames::new(30.0, 600, &[50, 300, 310, 500]),
        &DetectionOptions::new(),
    )
    .unwrap();
    let second = detect_cuts(
        &mut SceneFrames::new(30.0, 600, &[50, 300, 310, 500]),
        &DetectionOptions::new(),
    )
    .unwrap();
    assert_eq!(first, second);
}

#[test]
fn zero_frame_rate_is_rejected_before_decoding() {
    let mut source = SceneFrames::new(0.0, 30, &[]);
    let result = detect_cuts(&mut source, &DetectionOptions::new());
    assert!(matches!(result, Err(CutlistError::InvalidVideoMetadata(_))));
    assert_eq!(source.emitted, 0);
}

#[test]
fn non_finite_frame_rate_is_rejected() {
    let mut source = SceneFrames::new(f64::NAN, 30, &[]);
    assert!(matches!(
        detect_cuts(&mut source, &DetectionOptions::new()),
        Err(CutlistError::InvalidVideoMetadata(_))
    ));
}

#[test]
fn empty_stream_yields_empty_cutlist() {
    let mut source = SceneFrames::new(30.0, 0, &[]);
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert!(cuts.is_empty());
}

#[test]
fn duration_uses_decoded_count_when_probe_underestimates() {
    let mut source = SceneFrames::new(30.0, 150, &[]);
    source.metadata.frame_count = 100;
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 5.0)]);
}

#[test]
fn duration_uses_probed_count_when_decoding_stops_early() {
    let mut source = SceneFrames::new(30.0, 150, &[]);
    source.metadata.frame_count = 300;
    let cuts = detect_cuts(&mut source, &DetectionOptions::new()).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 10.0)]);
}

// ── Changed-pixel strategy ─────────────────────────────────────────

#[test]
fn changed_pixels_default_threshold_ignores_small_frames() {
    let options = DetectionOptions::new().with_strategy(ScoringStrategy::ChangedPixels {
        pixel_threshold: 25,
    });
    assert_eq!(options.threshold(), 500_000.0);

    // 64×36 frames can change at most 2304 pixels.
    let mut source = SceneFrames::new(30.0, 120, &[60]);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(cuts.len(), 1);
}

#[test]
fn changed_pixels_with_custom_threshold() {
    let options = DetectionOptions::new()
        .with_strategy(ScoringStrategy::ChangedPixels { pixel_threshold: 25 })
        .with_threshold(2000.0);
    let mut source = SceneFrames::new(30.0, 120, &[60]);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(spans(&cuts), vec![(0.0, 2.0), (2.0, 4.0)]);
}

#[test]
fn changed_pixel_counts_scale_back_to_full_resolution() {
    let options = DetectionOptions::new()
        .with_strategy(ScoringStrategy::ChangedPixels { pixel_threshold: 25 })
        .with_threshold(2000.0);

    // Frames decoded at half size: 576 changed pixels, scaled ×4 to 2304.
    let mut source = SceneFrames::new(30.0, 120, &[60]);
    source.frame_size = (32, 18);
    let cuts = detect_cuts(&mut source, &options).unwrap();
    assert_eq!(cuts.len(), 2);
}

#[test]
fn mean_difference_is_resolution_independent() {
    let mut full = SceneFrames::new(30.0, 120, &[60]);
    let mut reduced = SceneFrames::new(30.0, 120, &[60]);
    reduced.frame_size = (16, 9);
    let options = DetectionOptions::new();
    assert_eq!(
        detect_cuts(&mut full, &options).unwrap(),
        detect_cuts(&mut reduced, &options).unwrap()
    );
}

// ── Options and progress ───────────────────────────────────────────

#[test]
fn default_options() {
    let options = DetectionOptions::default();
    assert_eq!(options.strategy(), ScoringStrategy::MeanAbsoluteDifference);
    assert_eq!(options.threshold(), 30.0);
    assert_eq!(options.min_scene_length(), Duration::from_secs(1));
    assert_eq!(options.downscale_factor(), 1);
}

#[test]
fn downscale_factor_is_at_least_one() {
    assert_eq!(
        DetectionOptions::new().with_downscale_factor(0).downscale_factor(),
        1
    );
}

#[derive(Default)]
struct RecordingProgress {
    reports: Mutex<Vec<(OperationType, u64, Option<f32>)>>,
}

impl ProgressCallback for RecordingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports
            .lock()
            .unwrap()
            .push((info.operation, info.current, info.percentage));
    }
}

#[test]
fn progress_reports_every_batch_and_at_the_end() {
    let progress = Arc::new(RecordingProgress::default());
    let options = DetectionOptions::new()
        .with_progress(progress.clone())
        .with_batch_size(10);

    let mut source = SceneFrames::new(30.0, 45, &[]);
    detect_cuts(&mut source, &options).unwrap();

    let reports = progress.reports.lock().unwrap();
    let counts: Vec<u64> = reports.iter().map(|(_, current, _)| *current).collect();
    assert_eq!(counts, vec![10, 20, 30, 40, 45]);
    assert!(
        reports
            .iter()
            .all(|(operation, _, _)| *operation == OperationType::CutDetection)
    );
    assert_eq!(reports.last().and_then(|(_, _, pct)| *pct), Some(100.0));
}
