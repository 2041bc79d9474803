use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use cutlist::{
    CutDetector, Cutlist, DEFAULT_PIXEL_THRESHOLD, DetectionOptions, EditResponse, FfmpegLogLevel,
    FrameImageFormat, FrameSampler, ProgressCallback, ProgressInfo, SamplerOptions,
    ScoringStrategy, SessionId, SessionStore, VideoFile, VideoSource,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  cutlist detect input.mp4 --json\n  cutlist detect input.mp4 --downscale 4 --out cutlist.csv --progress\n  cutlist frames input.mp4 --cutlist cutlist.json --out frames --ext png\n  cutlist edit input.mp4 edited.json --out workspace\n  cutlist ingest https://drive.google.com/file/d/<id>/view --workspace sessions\n  cutlist completions zsh > _cutlist";

#[derive(Debug, Parser)]
#[command(
    name = "cutlist",
    version,
    about = "Detect scene cuts, sample one frame per cut, and edit cut lists",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output (overrides RUST_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar for detection and sampling.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Mean absolute luminance difference (0–255).
    Mean,
    /// Number of pixels that changed by more than --pixel-threshold.
    Count,
}

#[derive(Debug, Parser, Clone)]
struct DetectArgs {
    /// Scoring strategy.
    #[arg(long, value_enum, default_value_t = StrategyArg::Mean)]
    strategy: StrategyArg,

    /// Boundary threshold (default: 30 for mean, 500000 for count).
    #[arg(long)]
    threshold: Option<f64>,

    /// Per-pixel change needed to count a pixel (count strategy only).
    #[arg(long, default_value_t = DEFAULT_PIXEL_THRESHOLD)]
    pixel_threshold: u8,

    /// Minimum scene length in seconds.
    #[arg(long, default_value_t = 1.0)]
    min_scene: f64,

    /// Divide the decode resolution by this factor before scoring.
    #[arg(long, default_value_t = 1)]
    downscale: u32,
}

#[derive(Debug, Parser, Clone)]
struct FrameArgs {
    /// Frame image extension (jpg, png).
    #[arg(long, default_value = "jpg")]
    ext: String,

    /// JPEG quality, 1–100.
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect scene cuts in a video.
    #[command(
        about = "Detect scene cuts",
        after_help = "Examples:\n  cutlist detect input.mp4\n  cutlist detect input.mp4 --strategy count --threshold 250000 --json"
    )]
    Detect {
        /// Input video path.
        input: PathBuf,

        #[command(flatten)]
        detection: DetectArgs,

        /// Write the cut list as CSV to this path.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Output the cut list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write one representative frame per cut.
    #[command(
        about = "Sample one frame per cut",
        after_help = "Examples:\n  cutlist frames input.mp4 --cutlist cutlist.json --out frames"
    )]
    Frames {
        /// Input video path.
        input: PathBuf,

        /// JSON file holding the cut list (array or {\"cutlist\": [...]}).
        #[arg(long)]
        cutlist: PathBuf,

        /// Output directory for frame images.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        frames: FrameArgs,
    },

    /// Normalize an edited cut list, regenerate frames, and write exports.
    #[command(
        about = "Apply an edited cut list",
        after_help = "Examples:\n  cutlist edit input.mp4 edited.json --out workspace"
    )]
    Edit {
        /// Input video path.
        input: PathBuf,

        /// JSON file with the submitted records.
        payload: PathBuf,

        /// Directory receiving cutlist.csv, cutlist.json, and frames/.
        #[arg(long)]
        out: PathBuf,

        #[command(flatten)]
        frames: FrameArgs,
    },

    /// Acquire a video and run detection, sampling, and export in a session workspace.
    #[command(
        about = "Run the full pipeline in a session workspace",
        after_help = "Examples:\n  cutlist ingest input.mp4 --workspace sessions --session demo\n  cutlist ingest https://drive.google.com/open?id=<id> --workspace sessions"
    )]
    Ingest {
        /// Video path or drive share link.
        source: String,

        /// Root directory for session workspaces.
        #[arg(long, default_value = "sessions")]
        workspace: PathBuf,

        /// Session identifier.
        #[arg(long, default_value = "default")]
        session: String,

        #[command(flatten)]
        detection: DetectArgs,

        #[command(flatten)]
        frames: FrameArgs,

        /// Output the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether a video is suitable for cut detection.
    #[command(about = "Validate video metadata")]
    Validate {
        /// Input video path.
        input: PathBuf,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "Examples:\n  cutlist completions bash > cutlist.bash\n  cutlist completions zsh > _cutlist"
    )]
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn init_logging(global: &GlobalOptions) {
    let filter = if global.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A second initialisation (tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global);

    if let Some(level) = &global.log_level {
        let parsed = level
            .parse::<FfmpegLogLevel>()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        cutlist::set_ffmpeg_log_level(parsed);
    }

    Ok(())
}

fn detection_options(
    args: &DetectArgs,
    global: &GlobalOptions,
) -> Result<DetectionOptions, Box<dyn std::error::Error>> {
    if !args.min_scene.is_finite() || args.min_scene < 0.0 {
        return Err(format!("--min-scene must be a non-negative number, got {}", args.min_scene).into());
    }

    let strategy = match args.strategy {
        StrategyArg::Mean => ScoringStrategy::MeanAbsoluteDifference,
        StrategyArg::Count => ScoringStrategy::ChangedPixels {
            pixel_threshold: args.pixel_threshold,
        },
    };

    let mut options = DetectionOptions::new()
        .with_strategy(strategy)
        .with_min_scene_length(Duration::from_secs_f64(args.min_scene))
        .with_downscale_factor(args.downscale);
    if let Some(threshold) = args.threshold {
        options = options.with_threshold(threshold);
    }
    if global.progress {
        options = options
            .with_progress(Arc::new(TerminalProgress::new("detecting")))
            .with_batch_size(30);
    }
    Ok(options)
}

fn sampler_options(
    args: &FrameArgs,
    global: &GlobalOptions,
) -> Result<SamplerOptions, Box<dyn std::error::Error>> {
    let format = args.ext.parse::<FrameImageFormat>()?;
    let mut options = SamplerOptions::new()
        .with_image_format(format)
        .with_jpeg_quality(args.quality);
    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new("sampling")));
    }
    Ok(options)
}

fn parse_source(value: &str) -> VideoSource {
    if value.contains("://") {
        VideoSource::DriveLink(value.to_string())
    } else {
        VideoSource::Upload(PathBuf::from(value))
    }
}

fn read_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|error| format!("cannot read {}: {error}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn print_cutlist(cutlist: &Cutlist) {
    for (index, cut) in cutlist.iter().enumerate() {
        let label = if cut.label.is_empty() {
            String::new()
        } else {
            format!("  {}", cut.label)
        };
        println!(
            "{:>4}  {:>8.1}s  {:>8.1}s{label}",
            index, cut.start, cut.end
        );
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning.yellow());
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new(message: &'static str) -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        Self { bar }
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if info.total.is_some_and(|total| info.current >= total) {
            self.bar.finish_and_clear();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Detect {
            input,
            detection,
            out,
            json,
        } => {
            let options = detection_options(&detection, &cli.global)?;
            let mut video = VideoFile::open(&input)?;
            let cutlist = CutDetector::new(options).detect(&mut video)?;

            if let Some(out) = &out {
                ensure_writable_path(out, cli.global.overwrite)?;
                cutlist::save_csv(out, &cutlist)?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&cutlist)?);
            } else {
                print_cutlist(&cutlist);
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Detected {} cut(s)", cutlist.len()).green()
                );
            }
            if let Some(out) = out {
                eprintln!("{} {}", "saved".green().bold(), out.display());
            }
        }
        Commands::Frames {
            input,
            cutlist,
            out,
            frames,
        } => {
            let (cuts, report) = cutlist::normalize_submission(&read_json(&cutlist)?)?;
            print_warnings(&report.warnings);

            let options = sampler_options(&frames, &cli.global)?;
            let mut video = VideoFile::open(&input)?;
            let artifacts = FrameSampler::new(options).sample(&mut video, &cuts, &out)?;
            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Wrote {}/{} frame(s) to {}",
                    artifacts.present_count(),
                    artifacts.len(),
                    out.display()
                )
                .green()
            );
        }
        Commands::Edit {
            input,
            payload,
            out,
            frames,
        } => {
            let response = match cutlist::normalize_submission(&read_json(&payload)?) {
                Ok((cuts, report)) => {
                    print_warnings(&report.warnings);
                    let options = sampler_options(&frames, &cli.global)?;
                    let result = cutlist::sample_video(
                        &input,
                        &cuts,
                        &out.join(cutlist::FRAMES_DIR),
                        &options,
                    )
                    .and_then(|artifacts| {
                        cutlist::save_csv(&out.join(cutlist::CSV_FILE_NAME), &cuts)?;
                        cutlist::save_json(&out.join(cutlist::JSON_FILE_NAME), &cuts)?;
                        Ok((cuts, artifacts))
                    });
                    EditResponse::from(result)
                }
                Err(error) => EditResponse::error(&error),
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_success() {
                return Err("edit was rejected".into());
            }
        }
        Commands::Ingest {
            source,
            workspace,
            session,
            detection,
            frames,
            json,
        } => {
            let store = SessionStore::new(&workspace)
                .with_detection_options(detection_options(&detection, &cli.global)?)
                .with_sampler_options(sampler_options(&frames, &cli.global)?);
            let id = SessionId::new(session)?;
            let live = store.ingest(&id, &parse_source(&source))?;

            if json {
                let payload = json!({
                    "session": id.as_str(),
                    "video": live.video_path,
                    "metadata": live.metadata,
                    "cutlist": live.cutlist,
                    "frames": live.frames.file_names(),
                    "archive": store
                        .archive_manifest(&id)?
                        .into_iter()
                        .map(|entry| entry.name)
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_cutlist(&live.cutlist);
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Session {id}: {} cut(s), {} frame(s) in {}",
                        live.cutlist.len(),
                        live.frames.present_count(),
                        store.workspace(&id).display()
                    )
                    .green()
                );
            }
        }
        Commands::Validate { input, json } => {
            let video = VideoFile::open(&input)?;
            let report = video.validate();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
            if !report.is_valid() {
                return Err(format!("{} is not suitable for cut detection", input.display()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "cutlist", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
