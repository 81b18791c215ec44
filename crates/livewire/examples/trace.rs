//! Example: trace a boundary through a list of waypoints.
//!
//! Seeds at the first waypoint, anchors at each following one and writes the
//! resulting stroke as JSON. With `--closed` the stroke is finished by
//! anchoring back at the first waypoint.
//!
//! Run from the workspace root:
//!   cargo run -p livewire --example trace -- --help
//!   cargo run -p livewire --example trace -- --input data/cells.png 10,10 60,12 58,70

use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use livewire::{AnchorOutcome, EngineConfig, LiveWire, Raster, Stroke, load_config};
use log::info;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Trace a live-wire stroke through waypoints on a grayscale image")]
struct Args {
    /// Input image (converted to 8-bit grayscale)
    #[arg(long)]
    input: String,

    /// Optional JSON engine config
    #[arg(long)]
    config: Option<String>,

    /// Close the stroke back to the first waypoint
    #[arg(long, default_value_t = false)]
    closed: bool,

    /// Output JSON path (default: <input stem>_stroke.json next to input)
    #[arg(long)]
    out: Option<String>,

    /// Waypoints as `x,y`
    #[arg(required = true, num_args = 2..)]
    waypoints: Vec<String>,
}

#[derive(Serialize)]
struct TraceResult {
    width: usize,
    height: usize,
    elapsed_ms: f64,
    stroke: Stroke,
}

fn parse_waypoint(s: &str) -> Result<(isize, isize)> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("waypoint '{s}' is not of the form x,y"))?;
    let x = x.trim().parse().with_context(|| format!("parsing x in '{s}'"))?;
    let y = y.trim().parse().with_context(|| format!("parsing y in '{s}'"))?;
    Ok((x, y))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading config {path}"))?,
        None => EngineConfig::default(),
    };
    let waypoints = args
        .waypoints
        .iter()
        .map(|s| parse_waypoint(s))
        .collect::<Result<Vec<_>>>()?;

    let gray = image::open(&args.input)
        .with_context(|| format!("opening {}", args.input))?
        .into_luma8();
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let raster = Raster::from_u8(width, height, gray.as_raw()).context("building raster")?;

    let t0 = Instant::now();
    let mut lw = LiveWire::load_raster(raster, config).context("loading raster")?;
    info!("features ready in {:.2} ms", t0.elapsed().as_secs_f64() * 1e3);

    let (sx, sy) = waypoints[0];
    lw.seed(sx, sy).context("placing seed")?;
    for &(x, y) in &waypoints[1..] {
        match lw.anchor(x, y).with_context(|| format!("anchoring at ({x}, {y})"))? {
            AnchorOutcome::Anchored => {}
            AnchorOutcome::Closed(_) => bail!("waypoint ({x}, {y}) closed the stroke early"),
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
    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;

    println!(
        "traced {} points through {} control points in {elapsed_ms:.2} ms (closed={})",
        stroke.len(),
        stroke.control_points.len(),
        stroke.closed
    );

    let out_path = args.out.unwrap_or_else(|| {
        let p = std::path::Path::new(&args.input);
        let stem = p.file_stem().unwrap_or_default().to_string_lossy();
        let dir = p.parent().unwrap_or(std::path::Path::new("."));
        dir.join(format!("{stem}_stroke.json"))
            .to_string_lossy()
            .into_owned()
    });

    let result = TraceResult {
        width,
        height,
        elapsed_ms,
        stroke,
    };
    let json = serde_json::to_string_pretty(&result).context("serializing result")?;
    std::fs::write(&out_path, json).with_context(|| format!("writing {out_path}"))?;
    println!("results written to {out_path}");

    Ok(())
}
