//! Option builder tests.

use std::time::Duration;

use cutlist::{
    DEFAULT_CHANGED_PIXELS_THRESHOLD, DEFAULT_MEAN_THRESHOLD, DetectionOptions,
    FfmpegLogLevel, FrameImageFormat, SamplerOptions, ScoringStrategy,
};

#[test]
fn strategy_sets_matching_default_threshold() {
    let count = DetectionOptions::new()
        .with_strategy(ScoringStrategy::ChangedPixels { pixel_threshold: 10 });
    assert_eq!(count.threshold(), DEFAULT_CHANGED_PIXELS_THRESHOLD);

    let back = count.with_strategy(ScoringStrategy::MeanAbsoluteDifference);
    assert_eq!(back.threshold(), DEFAULT_MEAN_THRESHOLD);
}

#[test]
fn threshold_after_strategy_is_kept() {
    let options = DetectionOptions::new()
        .with_strategy(ScoringStrategy::ChangedPixels { pixel_threshold: 25 })
        .with_threshold(1234.0);
    assert_eq!(options.threshold(), 1234.0);
}

#[test]
fn builder_round_trip() {
    let options = DetectionOptions::new()
        .with_min_scene_length(Duration::from_millis(500))
        .with_downscale_factor(3)
        .with_batch_size(0);
    assert_eq!(options.min_scene_length(), Duration::from_millis(500));
    assert_eq!(options.downscale_factor(), 3);

    let debug = format!("{options:?}");
    assert!(debug.contains("batch_size: 1"), "{debug}");
}

#[test]
fn sampler_builder() {
    let options = SamplerOptions::new()
        .with_image_format(FrameImageFormat::Png)
        .with_jpeg_quality(250);
    assert_eq!(options.image_format(), FrameImageFormat::Png);
    assert_eq!(options.jpeg_quality(), 100);
    assert_eq!(FrameImageFormat::Png.extension(), "png");
    assert_eq!(FrameImageFormat::default().extension(), "jpg");
}

#[test]
fn ffmpeg_log_levels_parse() {
    assert_eq!("warn".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
    assert_eq!("QUIET".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Quiet));
    assert!("loud".parse::<FfmpegLogLevel>().is_err());
}
