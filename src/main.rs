use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use facemorph::config::{self, Config, ExecutorKind};
use facemorph::{detection_file, presets};
use facemorph_warp::detection::descriptor_distance;
use facemorph_warp::overlay::{render_landmark_overlay, OverlayStyle};
use facemorph_warp::{
    EffectOptions, EffectType, NoiseSeed, ParallelExecutor, Pipeline, RasterImage, RunOutput,
    RunRequest, SequentialExecutor, Slider, SliderValues, Worker,
};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "facemorph")]
#[command(
    version,
    about = "Perturb facial geometry so photos read the same to people but not to face matchers"
)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Warp an image and write the result as PNG
    Warp(WarpArgs),
    /// List built-in and configured presets
    Presets,
    /// List every slider with its range and default
    Sliders,
    /// Distance between two detections' descriptors
    Diff {
        before: PathBuf,
        after: PathBuf,
    },
    /// Open config file in editor
    Config,
}

#[derive(Args)]
struct WarpArgs {
    /// Source image
    #[arg(short, long)]
    input: PathBuf,
    /// Output PNG
    #[arg(short, long)]
    output: PathBuf,
    /// Detection JSON from an external face detector
    #[arg(short, long)]
    detection: Option<PathBuf>,
    /// Named slider preset
    #[arg(short, long)]
    preset: Option<String>,
    /// Slider override, e.g. --set eyeSize=20 (repeatable)
    #[arg(long = "set", value_parser = parse_key_val)]
    overrides: Vec<(String, i32)>,
    /// Privacy effect over the face
    #[arg(long)]
    effect: Option<EffectType>,
    /// Effect intensity (0-30)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=30))]
    intensity: Option<u8>,
    /// Mask image for --effect mask
    #[arg(long)]
    mask: Option<PathBuf>,
    /// Fixed noise seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, value_enum)]
    executor: Option<ExecutorKind>,
    /// Draw landmarks and the face region onto the output
    #[arg(long)]
    overlay: bool,
}

fn parse_key_val(s: &str) -> Result<(String, i32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    let value = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for {}: {}", key, e))?;
    Ok((key.trim().to_string(), value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Warp(args) => warp(&cfg, args),
        Commands::Presets => list_presets(&cfg),
        Commands::Sliders => list_sliders(),
        Commands::Diff { before, after } => diff(&before, &after),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn load_mask(path: &Path) -> Option<RasterImage> {
    match RasterImage::open(path).with_context(|| format!("opening mask {}", path.display())) {
        Ok(mask) => Some(mask),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    }
}

fn effect_options(cfg: &Config, args: &WarpArgs) -> EffectOptions {
    let mut options = cfg.effect.options.clone();
    if let Some(kind) = args.effect {
        options.effect_type = kind;
    }
    if let Some(intensity) = args.intensity {
        options.effect_intensity = intensity;
    }
    if options.effect_type == EffectType::Mask {
        let path = args.mask.as_ref().or(cfg.effect.mask_path.as_ref());
        options.mask_image = path.and_then(|p| load_mask(p));
    }
    options
}

fn build_pipeline(cfg: &Config, kind: ExecutorKind, seed: NoiseSeed) -> Result<Pipeline> {
    let pipeline = match kind {
        ExecutorKind::Sequential => Pipeline::with_executor(SequentialExecutor),
        ExecutorKind::Parallel | ExecutorKind::Worker => {
            Pipeline::with_executor(ParallelExecutor::with_threads(cfg.threads)?)
        }
    };
    Ok(pipeline.seed(seed))
}

fn warp(cfg: &Config, args: WarpArgs) -> Result<()> {
    let source = RasterImage::open(&args.input)
        .with_context(|| format!("opening image {}", args.input.display()))?;
    info!(
        "Loaded {} ({}x{})",
        args.input.display(),
        source.width(),
        source.height()
    );

    let detection = match &args.detection {
        Some(path) => detection_file::load_detection(path)?,
        None => None,
    };
    if detection.is_none() {
        info!("No face detection supplied, using centred heuristic region");
    }

    let sliders = presets::resolve_sliders(cfg, args.preset.as_deref(), &args.overrides)?;
    let effect = effect_options(cfg, &args);
    let seed = args.seed.map(NoiseSeed::Fixed).unwrap_or(cfg.noise_seed());
    let kind = args.executor.unwrap_or(cfg.executor);
    let pipeline = build_pipeline(cfg, kind, seed)?;
    info!("Warping with {} executor", pipeline.executor_name());

    let output = if kind == ExecutorKind::Worker {
        let worker = Worker::spawn(pipeline).context("starting worker")?;
        worker.submit(RunRequest {
            source: source.clone(),
            sliders,
            detection: detection.clone(),
            effect: Some(effect),
        })?;
        worker.wait_latest().context("warping image")?
    } else {
        pipeline
            .run(&source, &sliders, detection.as_ref(), Some(&effect))
            .context("warping image")?
    };

    let RunOutput {
        image,
        region,
        warnings,
    } = output;
    for w in &warnings {
        warn!("{}", w);
    }

    let image = if args.overlay {
        let landmarks = detection.as_ref().and_then(|d| d.landmarks.as_ref());
        render_landmark_overlay(&image, landmarks, Some(&region), &OverlayStyle::default())?
    } else {
        image
    };

    image
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("✓ Wrote {}", args.output.display());
    Ok(())
}

fn list_presets(cfg: &Config) -> Result<()> {
    for name in presets::preset_names(cfg) {
        let values = presets::describe(cfg, &name).unwrap_or_default();
        println!("{:<12} {}", name, values);
    }
    Ok(())
}

fn list_sliders() -> Result<()> {
    let defaults = SliderValues::default();
    for slider in Slider::ALL {
        let range = slider.range();
        println!(
            "{:<14} {:>4}..={:<3} default {}",
            slider.name(),
            range.start(),
            range.end(),
            defaults.get(slider)
        );
    }
    Ok(())
}

fn diff(before: &Path, after: &Path) -> Result<()> {
    let descriptor = |path: &Path| -> Result<Vec<f32>> {
        detection_file::load_detection(path)?
            .and_then(|d| d.descriptor)
            .with_context(|| format!("no descriptor in {}", path.display()))
    };
    let a = descriptor(before)?;
    let b = descriptor(after)?;
    let Some(distance) = descriptor_distance(&a, &b) else {
        anyhow::bail!("descriptor lengths differ: {} vs {}", a.len(), b.len());
    };
    println!("facial difference: {:.4}", distance);
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {}", config_path.display());

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
