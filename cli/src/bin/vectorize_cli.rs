use clap::{Args, Parser, Subcommand};
use cli::capture::open_source;
use cli::preview::{JsonLinesSink, LogSink, PreviewSink};
use cli::{OutputMode, PreviewConfig, SourceConfig};
use color_eyre::eyre::{bail, Result, WrapErr};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};
use vectorize::{ContourMode, FrameLoop, FramePipeline, FrameSink, StopHandle};

#[derive(Parser)]
#[command(author, version, about = "Trace live video frames into vector contours", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tracing preview session
    Run(RunArgs),
    /// Print the JSON schema of the configuration file
    Schema,
    /// Print a sample configuration
    SampleConfig {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a .toml or .json configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// ffmpeg input: a file, URL or capture device
    #[arg(short, long, conflicts_with = "dir")]
    input: Option<String>,
    /// ffmpeg input format (v4l2, avfoundation, dshow, ...)
    #[arg(short = 'f', long)]
    format: Option<String>,
    /// Directory of still images to trace instead of video
    #[arg(short, long)]
    dir: Option<String>,
    #[arg(long, default_value = "640")]
    width: u32,
    #[arg(long, default_value = "480")]
    height: u32,
    /// Multiplier applied to the frame median
    #[arg(short, long)]
    ratio: Option<f32>,
    #[arg(long)]
    turd_size: Option<u32>,
    /// tree (outlines and holes) or external (top-level outlines only)
    #[arg(short, long)]
    mode: Option<ContourMode>,
    #[arg(long)]
    max_frames: Option<u64>,
    /// Pause between frames in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,
    /// log or json_lines
    #[arg(short, long)]
    output: Option<OutputMode>,
    /// Save the last source frame here on exit
    #[arg(long)]
    snapshot: Option<String>,
    /// Save the last contour overlay here on exit
    #[arg(long)]
    overlay: Option<String>,
}

impl RunArgs {
    fn into_config(self) -> Result<PreviewConfig> {
        let source = match (self.input, self.dir) {
            (Some(input), _) => Some(SourceConfig::Ffmpeg {
                input,
                format: self.format,
                width: self.width,
                height: self.height,
                ffmpeg_path: None,
            }),
            (None, Some(path)) => Some(SourceConfig::ImageDir { path }),
            (None, None) => None,
        };

        let mut config = match (self.config, source) {
            (Some(path), source) => {
                let mut config = PreviewConfig::from_file(&path)
                    .wrap_err_with(|| format!("Failed to load {}", path.display()))?;
                if let Some(source) = source {
                    config.source = source;
                }
                config
            }
            (None, Some(source)) => PreviewConfig::new(source),
            (None, None) => bail!("Pass --config, --input or --dir"),
        };

        if let Some(ratio) = self.ratio {
            config.threshold_ratio = ratio;
        }
        if let Some(turd_size) = self.turd_size {
            config.trace.turd_size = turd_size;
        }
        if let Some(mode) = self.mode {
            config.trace.mode = mode;
        }
        if let Some(max_frames) = self.max_frames {
            config.max_frames = Some(max_frames);
        }
        if let Some(interval_ms) = self.interval_ms {
            config.frame_interval_ms = interval_ms;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if self.snapshot.is_some() {
            config.snapshot_path = self.snapshot;
        }
        if self.overlay.is_some() {
            config.overlay_path = self.overlay;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_preview(args.into_config()?).await?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&PreviewConfig::schema())?);
        }
        Commands::SampleConfig { json } => {
            let sample = PreviewConfig::sample();
            let text = if json { sample.to_json()? } else { sample.to_toml()? };
            println!("{}", text);
        }
    }

    Ok(())
}

async fn run_preview(config: PreviewConfig) -> Result<()> {
    let source = open_source(&config.source)?;

    let inner: Box<dyn FrameSink + Send> = match config.output {
        OutputMode::Log => Box::new(LogSink::default()),
        OutputMode::JsonLines => Box::new(JsonLinesSink::new(std::io::stdout())),
    };
    let mut sink = PreviewSink::new(inner);
    if let Some(path) = &config.snapshot_path {
        sink = sink.with_snapshot(path);
    }
    if let Some(path) = &config.overlay_path {
        sink = sink.with_overlay(path);
    }

    let pipeline = FramePipeline::builder()
        .trace_params(config.trace.clone())
        .threshold_ratio(config.threshold_ratio)
        .build();

    let stop = StopHandle::new();
    let mut frame_loop = FrameLoop::new(source, sink, pipeline)
        .with_stop_handle(stop.clone())
        .with_frame_interval(Duration::from_millis(config.frame_interval_ms));
    if let Some(max_frames) = config.max_frames {
        frame_loop = frame_loop.with_max_frames(max_frames);
    }

    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current frame");
            stop.stop();
        }
    });

    let summary = tokio::task::spawn_blocking(move || frame_loop.run())
        .await
        .wrap_err("Frame loop panicked")??;
    ctrl_c.abort();

    info!(
        "✅ Traced {} of {} frames ({} skipped)",
        summary.traced, summary.frames, summary.skipped
    );
    Ok(())
}
