use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use image::{GrayImage, Rgb, RgbImage};
use livewire::{
    AnchorOutcome, BorderMode, EngineConfig, FeatureConfig, LiveWire, Pixel, Raster, SmoothKind,
    Stroke, load_config,
};
use log::info;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "lw_gallery")]
#[command(about = "Run live-wire feature extraction and tracing on image fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(name = "features")]
    Features(FeaturesArgs),
    #[command(name = "trace")]
    Trace(TraceArgs),
}

#[derive(Args, Debug, Clone)]
struct CommonArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
    /// Optional JSON engine config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct FeaturesArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value_t = false)]
    smooth: bool,
    #[arg(long, default_value_t = false)]
    reflect: bool,
}

#[derive(Args, Debug, Clone)]
struct TraceArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Close the stroke back to the first waypoint
    #[arg(long, default_value_t = false)]
    closed: bool,
    /// Waypoints as `x,y`; the first one is the seed
    #[arg(required = true, num_args = 2..)]
    waypoints: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaFeatures {
    width: usize,
    height: usize,
    smooth: SmoothKind,
    border: BorderMode,
    max_magnitude: f32,
    zero_crossings: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaTrace {
    width: usize,
    height: usize,
    config: EngineConfig,
    points: usize,
    control_points: usize,
    closed: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Features(args) => run_features(args),
        Command::Trace(args) => run_trace(args),
    }
}

fn run_features(args: FeaturesArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "features")?;
    let raster = load_input(&args.common.input)?;
    let base = load_engine_config(&args.common)?;

    let config = EngineConfig {
        features: FeatureConfig {
            smooth: if args.smooth {
                SmoothKind::Binomial3
            } else {
                base.features.smooth
            },
            border: if args.reflect {
                BorderMode::Reflect101
            } else {
                base.features.border
            },
            ..base.features.clone()
        },
        ..base
    };
    let (width, height) = (raster.width(), raster.height());
    let lw = LiveWire::load_raster(raster, config).context("computing features")?;
    let f = lw.features();

    save_f32_vis(case_dir.join("intensity.png"), width, height, f.intensity_image().data())?;
    save_f32_vis(case_dir.join("magnitude.png"), width, height, f.magnitude_image().data())?;
    save_f32_vis(
        case_dir.join("gradient_cost.png"),
        width,
        height,
        f.gradient_cost_image().data(),
    )?;
    save_f32_vis(case_dir.join("laplacian.png"), width, height, f.laplacian_image().data())?;

    let crossings = f.zero_crossing_image().data();
    let zc: Vec<u8> = crossings.iter().map(|&z| if z != 0 { 255 } else { 0 }).collect();
    save_luma_raw(case_dir.join("zero_crossings.png"), width, height, zc)?;

    let cfg = &lw.config().features;
    write_json(
        case_dir.join("meta.json"),
        &MetaFeatures {
            width,
            height,
            smooth: cfg.smooth,
            border: cfg.border,
            max_magnitude: f.max_magnitude(),
            zero_crossings: crossings.iter().filter(|&&z| z != 0).count(),
        },
    )?;

    Ok(())
}

fn run_trace(args: TraceArgs) -> Result<()> {
    let case_dir = prepare_case(&args.common, "trace")?;
    let raster = load_input(&args.common.input)?;
    let config = load_engine_config(&args.common)?;
    let waypoints = args
        .waypoints
        .iter()
        .map(|s| parse_waypoint(s))
        .collect::<Result<Vec<_>>>()?;

    let (width, height) = (raster.width(), raster.height());
    let gray = raster_to_u8(&raster);
    let mut lw = LiveWire::load_raster(raster, config).context("loading raster")?;

    let (sx, sy) = waypoints[0];
    lw.seed(sx, sy).context("placing seed")?;
    for &(x, y) in &waypoints[1..] {
        if let AnchorOutcome::Closed(_) =
            lw.anchor(x, y).with_context(|| format!("anchoring at ({x}, {y})"))?
        {
            bail!("waypoint ({x}, {y}) closed the stroke early");
        }
    }

    let stroke = if args.closed {
        match lw.anchor(sx, sy).context("closing stroke")? {
            AnchorOutcome::Closed(stroke) => stroke,
            AnchorOutcome::Anchored => {
                bail!("anchoring at the first waypoint did not close the stroke")
            }
        }
    } else {
        lw.close().context("finishing stroke")?
    };
    info!(
        "traced {} points through {} control points",
        stroke.len(),
        stroke.control_points.len()
    );

    let overlay = render_stroke_overlay(&gray, width, height, &stroke)?;
    overlay
        .save(case_dir.join("overlay.png"))
        .with_context(|| format!("saving overlay in {}", case_dir.display()))?;

    write_json(case_dir.join("path.json"), &stroke)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaTrace {
            width,
            height,
            config: lw.config().clone(),
            points: stroke.len(),
            control_points: stroke.control_points.len(),
            closed: stroke.closed,
        },
    )?;

    Ok(())
}

fn prepare_case(common: &CommonArgs, case_name: &str) -> Result<PathBuf> {
    ensure_file_exists(&common.input, "input")?;

    let case_dir = common.out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;

    fs::copy(&common.input, case_dir.join("input.png")).with_context(|| {
        format!(
            "copying input {} -> {}",
            common.input.display(),
            case_dir.join("input.png").display()
        )
    })?;

    Ok(case_dir)
}

fn load_engine_config(common: &CommonArgs) -> Result<EngineConfig> {
    match &common.config {
        Some(path) => {
            load_config(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_input(path: &Path) -> Result<Raster> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let luma = dyn_img.to_luma16();
    let (w, h) = luma.dimensions();

    Raster::from_u16(w as usize, h as usize, luma.as_raw())
        .with_context(|| format!("constructing raster from {}", path.display()))
}

fn parse_waypoint(s: &str) -> Result<(isize, isize)> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("waypoint '{s}' is not of the form x,y"))?;
    let x = x.trim().parse().with_context(|| format!("parsing x in '{s}'"))?;
    let y = y.trim().parse().with_context(|| format!("parsing y in '{s}'"))?;
    Ok((x, y))
}

fn raster_to_u8(raster: &Raster) -> Vec<u8> {
    f32_to_u8_vis(raster.image().data())
}

fn save_f32_vis(path: PathBuf, width: usize, height: usize, data: &[f32]) -> Result<()> {
    save_luma_raw(path, width, height, f32_to_u8_vis(data))
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

/// Min/max stretch to 8 bits; non-finite samples render black.
fn f32_to_u8_vis(data: &[f32]) -> Vec<u8> {
    let (min_v, max_v) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !min_v.is_finite() || (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn render_stroke_overlay(
    gray: &[u8],
    width: usize,
    height: usize,
    stroke: &Stroke,
) -> Result<RgbImage> {
    let gray = GrayImage::from_raw(width as u32, height as u32, gray.to_vec())
        .context("constructing GrayImage for overlay")?;
    let mut rgb = image::DynamicImage::ImageLuma8(gray).to_rgb8();

    for p in &stroke.points {
        put_pixel(&mut rgb, *p, Rgb([255, 64, 64]));
    }
    for p in &stroke.control_points {
        draw_dot(&mut rgb, *p, Rgb([64, 255, 64]));
    }

    Ok(rgb)
}

fn put_pixel(img: &mut RgbImage, p: Pixel, color: Rgb<u8>) {
    let (x, y) = (p.x as u32, p.y as u32);
    if x < img.width() && y < img.height() {
        img.put_pixel(x, y, color);
    }
}

fn draw_dot(img: &mut RgbImage, p: Pixel, color: Rgb<u8>) {
    let (xi, yi) = (p.x as i64, p.y as i64);

    for dy in -1..=1 {
        for dx in -1..=1 {
            let nx = xi + dx;
            let ny = yi + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            put_pixel(img, Pixel::new(nx as usize, ny as usize), color);
        }
    }
}

fn ensure_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    if !path.is_file() {
        bail!("{} path is not a file: {}", what, path.display());
    }
    Ok(())
}
