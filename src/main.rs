//! cam_paint CLI: region detection on a still image, and painting over a sequence
//! of frames read from a directory.

use anyhow::{Context, bail};
use cam_paint::core_modules::paint_accumulator::paint_points;
use cam_paint::core_modules::region_finder::region_finder::MIN_REGION_SIZE;
use cam_paint::core_modules::utils::image_helper::image_helper::{load, save_png};
use cam_paint::frame_feed::pump;
use cam_paint::{
    BrushMode, BrushStrategy, Color, Control, DetectorParams, KeyOutcome, PaintConfig,
    PaintSession, PaintWorker, RegionDetector, WorkerEvent, largest_region_ref,
};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cam_paint")]
#[command(about = "Find color regions in images and paint with them across frames")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recolor every region of a color in a single image.
    Regions(RegionsArgs),
    /// Track a color through a directory of frames and save the painting.
    Paint(PaintArgs),
}

#[derive(Debug, Args)]
struct RegionsArgs {
    /// Input image.
    #[arg(long)]
    image: PathBuf,

    /// Target color, `r,g,b` or `#rrggbb`.
    #[arg(long)]
    color: Color,

    /// Output PNG.
    #[arg(long)]
    out: PathBuf,

    /// Color the regions are painted with.
    #[arg(long, default_value = "0,0,255")]
    paint: Color,

    /// Give every region its own random color instead of `--paint`.
    #[arg(long, conflicts_with = "paint")]
    random: bool,

    #[arg(long, default_value_t = MIN_REGION_SIZE)]
    min_region: usize,

    #[arg(long, default_value_t = 27)]
    max_diff: u16,
}

#[derive(Debug, Args)]
struct PaintArgs {
    /// Directory of frames, processed in file-name order.
    #[arg(long)]
    frames: PathBuf,

    /// Where the final view is written (PNG).
    #[arg(long)]
    out: PathBuf,

    /// Track this color, `r,g,b` or `#rrggbb`.
    #[arg(long, conflicts_with = "pick", required_unless_present = "pick")]
    color: Option<Color>,

    /// Track the color at `x,y` of the first prepared frame.
    #[arg(long, value_parser = parse_pick)]
    pick: Option<(u32, u32)>,

    /// Display key: `w` webcam, `r` recolor, `p` painting.
    #[arg(long)]
    mode: Option<char>,

    /// Brush key: `x` fixed, `y` target color, `z` random.
    #[arg(long)]
    brush: Option<char>,

    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the last recolored frame here.
    #[arg(long)]
    recolored_out: Option<PathBuf>,
}

fn parse_pick(s: &str) -> Result<(u32, u32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got `{s}`"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in `{s}`: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in `{s}`: {e}"))?;
    Ok((x, y))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Regions(args) => run_regions(&args),
        Commands::Paint(args) => run_paint(args).await,
    }
}

fn run_regions(args: &RegionsArgs) -> anyhow::Result<()> {
    info!("loading image: {}", args.image.display());
    let mut image = load(&args.image).with_context(|| format!("reading {}", args.image.display()))?;

    let detector = RegionDetector::new(DetectorParams {
        max_color_diff: args.max_diff,
        min_region_size: args.min_region,
    });
    let regions = detector.find_regions(&image, args.color)?;
    let largest = largest_region_ref(&regions).map_or(0, |r| r.size());
    info!(
        "{} region(s) of {} in {}x{} image, largest {} px",
        regions.len(),
        args.color,
        image.width(),
        image.height(),
        largest
    );

    let mode = if args.random { BrushMode::Random } else { BrushMode::Fixed };
    let mut brush = mode.into_strategy(args.paint);
    for (i, region) in regions.iter().enumerate() {
        let paint = brush.next_color(args.color);
        if let Some((cx, cy)) = region.centroid() {
            debug!(
                "region {i}: {} px centred at ({cx:.1}, {cy:.1}), painted {paint}",
                region.size()
            );
        }
        paint_points(&mut image, region.points(), paint);
    }
    save_png(&args.out, &image).with_context(|| format!("writing {}", args.out.display()))?;
    info!("recolored image written to {}", args.out.display());
    Ok(())
}

async fn run_paint(args: PaintArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => PaintConfig::load(path)?,
        None => PaintConfig::default(),
    };
    let interval = Duration::from_millis(config.frame_interval_ms);
    let capacity = config.frame_queue_capacity;

    let mut session = PaintSession::new(config)?;
    for key in args.mode.iter().chain(args.brush.iter()) {
        if session.handle_key(*key) == KeyOutcome::Ignored {
            bail!("unknown mode or brush key `{key}`");
        }
    }
    if let Some(color) = args.color {
        session.set_target(color);
    }

    let paths = frame_paths(&args.frames)?;
    if paths.is_empty() {
        bail!("no frames found in {}", args.frames.display());
    }
    info!("{} frame(s) in {}", paths.len(), args.frames.display());

    let mut worker = PaintWorker::spawn(session, capacity)?;
    let mut remaining = paths.into_iter();

    if let Some((x, y)) = args.pick {
        // The click is sampled from a prepared frame, so one has to go through first.
        let first = remaining.next().context("no first frame")?;
        let mut views = worker.subscribe();
        worker.offer_frame(load(&first)?)?;
        views.changed().await.context("paint worker stopped")?;

        worker.send_control(Control::Click { x, y })?;
        match worker.next_event().await {
            Some(WorkerEvent::TargetSelected(color)) => info!("picked color {color} at ({x}, {y})"),
            Some(WorkerEvent::Rejected(reason)) => bail!("could not pick a color: {reason}"),
            other => bail!("unexpected reply from paint worker: {other:?}"),
        }
    }

    let frames = futures::stream::iter(remaining).filter_map(|path| async move {
        match load(&path) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                None
            }
        }
    });
    let accepted = pump(Box::pin(frames), &worker, interval).await?;
    info!("{accepted} frame(s) accepted, {} dropped", worker.dropped_frames());

    while let Some(event) = worker.try_next_event() {
        if let WorkerEvent::Rejected(reason) = event {
            debug!("painter rejected input: {reason}");
        }
    }

    let (session, stats) = worker.shutdown().await?;
    if stats.dropped > 0 {
        warn!("{} frame(s) dropped while the painter was busy", stats.dropped);
    }
    if stats.failed > 0 {
        warn!("{} frame(s) could not be painted", stats.failed);
    }

    let view = session.current_view().context("no frame was processed")?;
    save_png(&args.out, view).with_context(|| format!("writing {}", args.out.display()))?;
    info!("painting written to {}", args.out.display());

    if let Some(path) = &args.recolored_out {
        match session.recolored() {
            Some(recolored) => save_png(path, recolored)?,
            None => warn!("no recolored frame to write to {}", path.display()),
        }
    }
    Ok(())
}

fn frame_paths(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg" | "bmp")
            });
        if is_image {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
