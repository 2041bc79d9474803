//! Benchmarks for frame scoring and cut detection.
//!
//! Run with: cargo bench
//!
//! The detection benchmark on a real file requires
//! `tests/fixtures/sample_video.mp4` from `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use cutlist::{
    CutDetector, DetectionOptions, FfmpegLogLevel, FrameSource, ScoringStrategy,
    VideoFile, VideoMetadata, detect_cuts, frame_difference,
};
use image::{GrayImage, Luma};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn gradient(width: u32, height: u32, offset: u8) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([((x + y) as u8).wrapping_add(offset)])
    })
}

fn benchmark_frame_difference(criterion: &mut Criterion) {
    for (width, height) in [(320, 180), (1280, 720), (1920, 1080)] {
        let previous = gradient(width, height, 0);
        let current = gradient(width, height, 40);

        criterion.bench_function(&format!("mean difference {width}x{height}"), |bencher| {
            bencher.iter(|| {
                frame_difference(
                    black_box(&previous),
                    black_box(&current),
                    ScoringStrategy::MeanAbsoluteDifference,
                )
            });
        });

        criterion.bench_function(&format!("changed pixels {width}x{height}"), |bencher| {
            bencher.iter(|| {
                frame_difference(
                    black_box(&previous),
                    black_box(&current),
                    ScoringStrategy::ChangedPixels { pixel_threshold: 25 },
                )
            });
        });
    }
}

/// In-memory source replaying the same two frames alternately every second.
struct AlternatingFrames {
    metadata: VideoMetadata,
    frames: [GrayImage; 2],
    emitted: u64,
}

impl FrameSource for AlternatingFrames {
    fn video_metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn next_luma_frame(&mut self) -> Result<Option<GrayImage>, cutlist::CutlistError> {
        if self.emitted >= self.metadata.frame_count {
            return Ok(None);
        }
        let scene = (self.emitted / 30 % 2) as usize;
        self.emitted += 1;
        Ok(Some(self.frames[scene].clone()))
    }
}

fn benchmark_detection_synthetic(criterion: &mut Criterion) {
    let dark = GrayImage::from_pixel(320, 180, Luma([20]));
    let bright = GrayImage::from_pixel(320, 180, Luma([220]));

    criterion.bench_function("detect cuts (synthetic 60 s @ 30 fps, 320x180)", |bencher| {
        bencher.iter(|| {
            let mut source = AlternatingFrames {
                metadata: VideoMetadata::synthetic(320, 180, 30.0, 1800),
                frames: [dark.clone(), bright.clone()],
                emitted: 0,
            };
            detect_cuts(&mut source, &DetectionOptions::new()).unwrap()
        });
    });
}

fn benchmark_detection_file(criterion: &mut Criterion) {
    cutlist::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    for factor in [1, 4] {
        let detector = CutDetector::new(DetectionOptions::new().with_downscale_factor(factor));
        criterion.bench_function(&format!("detect cuts (fixture, downscale {factor})"), |bencher| {
            bencher.iter(|| {
                let mut video = VideoFile::open(SAMPLE_VIDEO).unwrap();
                detector.detect(&mut video).unwrap()
            });
        });
    }
}

criterion::criterion_group!(
    benches,
    benchmark_frame_difference,
    benchmark_detection_synthetic,
    benchmark_detection_file,
);

criterion::criterion_main!(benches);
